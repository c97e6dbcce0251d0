use std::fmt;
use std::time::Duration;

use super::result::RuleResult;

/// Detailed evaluation report returned by
/// [`RuleSet::evaluate_detailed()`](super::ruleset::RuleSet::evaluate_detailed).
///
/// Contains the result, which rules fired (match and conditions passed), the
/// rules that were tried, and the wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    result: RuleResult,
    fired: Vec<String>,
    evaluation_order: Vec<String>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        result: RuleResult,
        fired: Vec<String>,
        evaluation_order: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            result,
            fired,
            evaluation_order,
            duration,
        }
    }

    /// The evaluation result, same as [`RuleSet::evaluate_request()`](super::ruleset::RuleSet::evaluate_request).
    pub fn result(&self) -> &RuleResult {
        &self.result
    }

    /// Names of rules whose action ran, in evaluation order.
    #[must_use]
    pub fn fired(&self) -> &[String] {
        &self.fired
    }

    /// Names of every enabled rule that was tried, in order.
    #[must_use]
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result: {}", self.result)?;
        write!(f, ", fired: [{}]", self.fired.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::Outcome;

    #[test]
    fn report_accessors() {
        let report = EvaluationReport::new(
            RuleResult::new(Outcome::Aborted, true),
            vec!["r1".into()],
            vec!["r0".into(), "r1".into()],
            Duration::from_nanos(500),
        );

        assert_eq!(report.result().outcome(), &Outcome::Aborted);
        assert_eq!(report.fired(), &["r1"]);
        assert_eq!(report.evaluation_order(), &["r0", "r1"]);
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display() {
        let report = EvaluationReport::new(
            RuleResult::new(Outcome::Continue, false),
            vec![],
            vec!["r1".into()],
            Duration::from_nanos(100),
        );
        let s = report.to_string();
        assert!(s.contains("result: continue"));
        assert!(s.contains("fired: []"));
    }
}
