use std::fmt;

use fancy_regex::Regex;
use tracing::warn;

use super::backref::{BackReferences, MatchResults};

/// A test applied to a string: a budgeted regex or an exact comparison, with
/// optional negation.
#[derive(Clone)]
pub enum UrlMatch {
    Regex {
        regex: Regex,
        negate: bool,
    },
    Exact {
        value: String,
        ignore_case: bool,
        negate: bool,
    },
}

impl UrlMatch {
    /// Run the test against `input`.
    ///
    /// A regex that exhausts its backtrack budget fails the test outright,
    /// whether or not it is negated.
    #[must_use]
    pub fn evaluate(&self, input: &str) -> MatchResults {
        match self {
            Self::Regex { regex, negate } => {
                let captures = match regex.captures(input) {
                    Ok(captures) => captures,
                    Err(err) => {
                        warn!(pattern = regex.as_str(), error = %err, "regex match budget exceeded");
                        return MatchResults::failure();
                    }
                };
                match captures {
                    Some(caps) if !negate => MatchResults {
                        success: true,
                        back_references: BackReferences::from_captures(&caps),
                    },
                    Some(_) => MatchResults::failure(),
                    None if *negate => MatchResults::empty_success(),
                    None => MatchResults::failure(),
                }
            }
            Self::Exact {
                value,
                ignore_case,
                negate,
            } => {
                let matched = if *ignore_case {
                    value.to_lowercase() == input.to_lowercase()
                } else {
                    value == input
                };
                match (matched, negate) {
                    (true, false) => MatchResults {
                        success: true,
                        back_references: BackReferences::whole(input),
                    },
                    (false, true) => MatchResults::empty_success(),
                    _ => MatchResults::failure(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_negated(&self) -> bool {
        match self {
            Self::Regex { negate, .. } | Self::Exact { negate, .. } => *negate,
        }
    }
}

impl fmt::Debug for UrlMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex { regex, negate } => f
                .debug_struct("Regex")
                .field("pattern", &regex.as_str())
                .field("negate", negate)
                .finish(),
            Self::Exact {
                value,
                ignore_case,
                negate,
            } => f
                .debug_struct("Exact")
                .field("value", value)
                .field("ignore_case", ignore_case)
                .field("negate", negate)
                .finish(),
        }
    }
}
