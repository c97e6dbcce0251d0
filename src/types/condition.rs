use std::str::FromStr;

use super::backref::{BackReferences, MatchResults};
use super::error::UnknownVariant;
use super::pattern::Pattern;
use super::request::Request;
use super::url_match::UrlMatch;

/// How a rule's conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalGrouping {
    #[default]
    MatchAll,
    MatchAny,
}

impl FromStr for LogicalGrouping {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "matchall" => Ok(Self::MatchAll),
            "matchany" => Ok(Self::MatchAny),
            _ => Err(UnknownVariant::new("logical grouping", s)),
        }
    }
}

/// What a condition checks about its resolved input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionMatchType {
    #[default]
    Pattern,
    IsFile,
    IsDirectory,
}

impl FromStr for ConditionMatchType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pattern" => Ok(Self::Pattern),
            "isfile" => Ok(Self::IsFile),
            "isdirectory" => Ok(Self::IsDirectory),
            _ => Err(UnknownVariant::new("condition match type", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConditionTest {
    Match(UrlMatch),
    IsFile { negate: bool },
    IsDirectory { negate: bool },
}

/// A single test: resolve `input`, then apply `test` to the result.
#[derive(Debug, Clone)]
pub struct Condition {
    pub(crate) input: Pattern,
    pub(crate) test: ConditionTest,
}

impl Condition {
    #[must_use]
    pub fn input(&self) -> &Pattern {
        &self.input
    }

    #[must_use]
    pub fn test(&self) -> &ConditionTest {
        &self.test
    }

    pub(crate) fn evaluate(
        &self,
        request: &Request,
        rule_refs: &BackReferences,
        previous: Option<&BackReferences>,
    ) -> MatchResults {
        let input = self.input.evaluate(request, rule_refs, previous);
        match &self.test {
            ConditionTest::Match(m) => m.evaluate(&input),
            ConditionTest::IsFile { negate } => {
                let found = request.probe().is_some_and(|p| p.is_file(&input));
                probe_result(found, *negate, &input)
            }
            ConditionTest::IsDirectory { negate } => {
                let found = request.probe().is_some_and(|p| p.is_directory(&input));
                probe_result(found, *negate, &input)
            }
        }
    }
}

fn probe_result(found: bool, negate: bool, input: &str) -> MatchResults {
    match (found, negate) {
        (true, false) => MatchResults {
            success: true,
            back_references: BackReferences::whole(input),
        },
        (false, true) => MatchResults::empty_success(),
        _ => MatchResults::failure(),
    }
}

/// Outcome of a rule's condition stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub passed: bool,
    /// Captures available to the action as `{C:n}`.
    pub captures: Option<BackReferences>,
}

/// An ordered list of conditions with AND/OR semantics.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    pub(crate) list: Vec<Condition>,
    pub(crate) grouping: LogicalGrouping,
    pub(crate) track_all_captures: bool,
}

impl Conditions {
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[must_use]
    pub fn grouping(&self) -> LogicalGrouping {
        self.grouping
    }

    #[must_use]
    pub fn tracks_all_captures(&self) -> bool {
        self.track_all_captures
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.list.iter()
    }

    /// Evaluate in declared order, short-circuiting per the grouping.
    ///
    /// The captures of the last passing condition are kept for the action.
    /// With `track_all_captures`, captures accumulate across passing
    /// conditions instead, and each condition's input can reference the
    /// captures gathered so far.
    pub(crate) fn evaluate(&self, request: &Request, rule_refs: &BackReferences) -> ConditionOutcome {
        if self.list.is_empty() {
            return ConditionOutcome {
                passed: true,
                captures: None,
            };
        }

        let mut captures: Option<BackReferences> = None;
        for condition in &self.list {
            let chained = if self.track_all_captures {
                captures.as_ref()
            } else {
                None
            };
            let result = condition.evaluate(request, rule_refs, chained);

            if result.success {
                if self.track_all_captures {
                    captures
                        .get_or_insert_with(BackReferences::new)
                        .extend(&result.back_references);
                } else {
                    captures = Some(result.back_references);
                }
                if self.grouping == LogicalGrouping::MatchAny {
                    return ConditionOutcome {
                        passed: true,
                        captures,
                    };
                }
            } else if self.grouping == LogicalGrouping::MatchAll {
                return ConditionOutcome {
                    passed: false,
                    captures: None,
                };
            }
        }

        match self.grouping {
            LogicalGrouping::MatchAll => ConditionOutcome {
                passed: true,
                captures,
            },
            LogicalGrouping::MatchAny => ConditionOutcome {
                passed: false,
                captures: None,
            },
        }
    }
}
