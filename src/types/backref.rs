/// Captured group values from a successful match, indexed by group number.
///
/// Groups that did not participate in the match are stored as empty text, so
/// lookups never distinguish "unmatched group" from "group matched nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackReferences {
    groups: Vec<String>,
}

impl BackReferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_captures(captures: &fancy_regex::Captures<'_>) -> Self {
        let groups = (0..captures.len())
            .map(|i| {
                captures
                    .get(i)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_default()
            })
            .collect();
        Self { groups }
    }

    /// A single group 0 holding the whole input.
    pub(crate) fn whole(input: &str) -> Self {
        Self {
            groups: vec![input.to_owned()],
        }
    }

    /// Value of group `index`, or empty text when the group does not exist.
    #[must_use]
    pub fn get(&self, index: usize) -> &str {
        self.groups.get(index).map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append another capture set after this one's groups.
    pub(crate) fn extend(&mut self, other: &BackReferences) {
        self.groups.extend(other.groups.iter().cloned());
    }
}

impl<S: Into<String>> FromIterator<S> for BackReferences {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome of a single match test: whether it passed (after negation) and
/// the groups it captured.
///
/// Captures are only populated when the underlying test actually matched, so
/// a negated test that passes because nothing matched carries no groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResults {
    pub success: bool,
    pub back_references: BackReferences,
}

impl MatchResults {
    pub(crate) fn failure() -> Self {
        Self::default()
    }

    pub(crate) fn empty_success() -> Self {
        Self {
            success: true,
            back_references: BackReferences::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_group_value() {
        let refs: BackReferences = ["/old/abc", "abc"].into_iter().collect();
        assert_eq!(refs.get(0), "/old/abc");
        assert_eq!(refs.get(1), "abc");
    }

    #[test]
    fn out_of_range_is_empty() {
        let refs: BackReferences = ["only"].into_iter().collect();
        assert_eq!(refs.get(1), "");
        assert_eq!(refs.get(9), "");
        assert_eq!(BackReferences::new().get(0), "");
    }

    #[test]
    fn extend_appends_groups() {
        let mut first: BackReferences = ["a", "b"].into_iter().collect();
        let second: BackReferences = ["c", "d"].into_iter().collect();
        first.extend(&second);
        assert_eq!(first.len(), 4);
        assert_eq!(first.get(3), "d");
    }

    #[test]
    fn from_captures_fills_unmatched_groups() {
        let re = fancy_regex::Regex::new("^(a)(x)?(b)$").unwrap();
        let caps = re.captures("ab").unwrap().unwrap();
        let refs = BackReferences::from_captures(&caps);
        assert_eq!(refs.len(), 4);
        assert_eq!(refs.get(1), "a");
        assert_eq!(refs.get(2), "");
        assert_eq!(refs.get(3), "b");
    }
}
