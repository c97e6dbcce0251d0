use thiserror::Error;

/// Errors raised while turning rule definitions into executable rules.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("rule '{rule}' has no match")]
    MissingMatch { rule: String },

    #[error("rule '{rule}' has no action")]
    MissingAction { rule: String },

    #[error("empty match pattern in rule '{rule}'")]
    EmptyPattern { rule: String },

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("condition with input '{input}' has no pattern")]
    MissingConditionPattern { input: String },

    #[error("custom response in rule '{rule}' has no status code")]
    MissingStatusCode { rule: String },

    #[error("status code {code} is outside 200..=999")]
    InvalidStatusCode { code: u32 },

    #[error("invalid template '{template}': {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },
}

/// Errors in `{...}` template syntax, reported with the byte index into the
/// template where the problem was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing close brace for parameter at index {index}")]
    MissingCloseBrace { index: usize },

    #[error("back-reference at index {index} has no group number")]
    MissingBackReferenceIndex { index: usize },

    #[error("back-reference {{{kind}:{group}}} is out of range 0..=9")]
    BackReferenceOutOfRange { kind: char, group: usize },

    #[error("unsupported server variable '{name}'")]
    UnsupportedServerVariable { name: String },

    #[error("unknown function or rewrite map '{name}'")]
    UnknownFunction { name: String },

    #[error("malformed template at index {index}")]
    Syntax { index: usize },
}

/// Returned by the `FromStr` impls of the attribute enums when a value names
/// no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
