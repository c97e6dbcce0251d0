use std::fmt;
use std::sync::Arc;

use super::backref::BackReferences;
use super::request::Request;
use super::rewrite_map::RewriteMap;
use super::server_variable::ServerVariable;

/// One piece of a [`Pattern`].
#[derive(Debug, Clone)]
pub enum PatternSegment {
    Literal(String),
    /// `{R:n}`: group `n` of the rule's initial match.
    RuleBackReference(usize),
    /// `{C:n}`: group `n` of the condition captures.
    ConditionBackReference(usize),
    ServerVariable(ServerVariable),
    ToLower(Pattern),
    UrlEncode(Pattern),
    RewriteMap { map: Arc<RewriteMap>, key: Pattern },
}

/// An ordered sequence of segments that evaluates to a single string.
///
/// Used for condition inputs and action URLs. Evaluation cannot fail:
/// unresolvable back-references and missing request properties produce
/// empty text.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    segments: Vec<PatternSegment>,
}

impl Pattern {
    #[must_use]
    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self { segments }
    }

    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(vec![PatternSegment::Literal(text.into())])
    }

    #[must_use]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Build the output string for one request.
    #[must_use]
    pub fn evaluate(
        &self,
        request: &Request,
        rule_refs: &BackReferences,
        condition_refs: Option<&BackReferences>,
    ) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.write_to(&mut out, request, rule_refs, condition_refs);
        }
        out
    }
}

impl PatternSegment {
    fn write_to(
        &self,
        out: &mut String,
        request: &Request,
        rule_refs: &BackReferences,
        condition_refs: Option<&BackReferences>,
    ) {
        match self {
            Self::Literal(text) => out.push_str(text),
            Self::RuleBackReference(index) => out.push_str(rule_refs.get(*index)),
            Self::ConditionBackReference(index) => {
                out.push_str(condition_refs.map_or("", |refs| refs.get(*index)));
            }
            Self::ServerVariable(var) => out.push_str(&var.resolve(request)),
            Self::ToLower(inner) => {
                out.push_str(&inner.evaluate(request, rule_refs, condition_refs).to_lowercase());
            }
            Self::UrlEncode(inner) => {
                let raw = inner.evaluate(request, rule_refs, condition_refs);
                out.extend(url::form_urlencoded::byte_serialize(raw.as_bytes()));
            }
            Self::RewriteMap { map, key } => {
                let key = key.evaluate(request, rule_refs, condition_refs);
                out.push_str(map.lookup(&key));
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                PatternSegment::Literal(text) => write!(f, "{text}")?,
                PatternSegment::RuleBackReference(i) => write!(f, "{{R:{i}}}")?,
                PatternSegment::ConditionBackReference(i) => write!(f, "{{C:{i}}}")?,
                PatternSegment::ServerVariable(var) => write!(f, "{{{var:?}}}")?,
                PatternSegment::ToLower(inner) => write!(f, "{{ToLower:{inner}}}")?,
                PatternSegment::UrlEncode(inner) => write!(f, "{{UrlEncode:{inner}}}")?,
                PatternSegment::RewriteMap { map, key } => write!(f, "{{{}:{key}}}", map.name())?,
            }
        }
        Ok(())
    }
}
