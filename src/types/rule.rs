use std::str::FromStr;

use super::action::{ActionType, RedirectType, UrlAction};
use super::condition::{ConditionMatchType, Conditions, LogicalGrouping};
use super::error::UnknownVariant;
use super::server_variable::UriMatchPart;
use super::url_match::UrlMatch;
use crate::parse::Location;

/// How `match` and condition patterns are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSyntax {
    #[default]
    EcmaScript,
    Wildcard,
    ExactMatch,
}

impl FromStr for PatternSyntax {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecmascript" => Ok(Self::EcmaScript),
            "wildcard" => Ok(Self::Wildcard),
            "exactmatch" => Ok(Self::ExactMatch),
            _ => Err(UnknownVariant::new("pattern syntax", s)),
        }
    }
}

/// Uncompiled form of a rule's `match` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDef {
    pub url: String,
    pub ignore_case: bool,
    pub negate: bool,
}

impl MatchDef {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ignore_case: true,
            negate: false,
        }
    }
}

/// Uncompiled form of one `add` element under `conditions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDef {
    pub input: String,
    pub pattern: Option<String>,
    pub match_type: ConditionMatchType,
    pub ignore_case: bool,
    pub negate: bool,
}

impl ConditionDef {
    /// A regex (or rule pattern syntax) test of `input` against `pattern`.
    #[must_use]
    pub fn new(input: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            pattern: Some(pattern.into()),
            match_type: ConditionMatchType::Pattern,
            ignore_case: true,
            negate: false,
        }
    }

    #[must_use]
    pub fn is_file(input: impl Into<String>) -> Self {
        Self::probe(input, ConditionMatchType::IsFile)
    }

    #[must_use]
    pub fn is_directory(input: impl Into<String>) -> Self {
        Self::probe(input, ConditionMatchType::IsDirectory)
    }

    fn probe(input: impl Into<String>, match_type: ConditionMatchType) -> Self {
        Self {
            input: input.into(),
            pattern: None,
            match_type,
            ignore_case: true,
            negate: false,
        }
    }

    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }
}

/// Uncompiled form of a rule's `conditions` element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConditionsDef {
    pub grouping: LogicalGrouping,
    pub track_all_captures: bool,
    pub list: Vec<ConditionDef>,
}

/// Uncompiled form of a rule's `action` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDef {
    pub action_type: ActionType,
    pub url: String,
    pub append_query_string: bool,
    pub log_rewritten_url: bool,
    pub redirect_type: RedirectType,
    pub status_code: Option<u32>,
    pub sub_status_code: Option<u32>,
    pub status_reason: Option<String>,
    pub status_description: Option<String>,
}

impl ActionDef {
    #[must_use]
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            url: String::new(),
            append_query_string: true,
            log_rewritten_url: false,
            redirect_type: RedirectType::Permanent,
            status_code: None,
            sub_status_code: None,
            status_reason: None,
            status_description: None,
        }
    }
}

/// A rule as written, before regexes and templates are compiled.
///
/// Produced by the XML parser or by [`RuleBuilder`](super::ruleset::RuleBuilder),
/// and turned into a [`Rule`] by compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub name: Option<String>,
    pub enabled: bool,
    pub global: bool,
    pub pattern_syntax: PatternSyntax,
    pub stop_processing: bool,
    pub match_def: Option<MatchDef>,
    pub conditions: ConditionsDef,
    pub action: Option<ActionDef>,
    pub(crate) location: Option<Location>,
}

impl RuleDef {
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            enabled: true,
            global: false,
            pattern_syntax: PatternSyntax::EcmaScript,
            stop_processing: false,
            match_def: None,
            conditions: ConditionsDef::default(),
            action: None,
            location: None,
        }
    }

    pub(crate) fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_owned())
    }
}

/// A compiled, immutable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: Option<String>,
    pub(crate) enabled: bool,
    pub(crate) global: bool,
    pub(crate) pattern_syntax: PatternSyntax,
    pub(crate) stop_processing: bool,
    pub(crate) initial_match: UrlMatch,
    pub(crate) conditions: Conditions,
    pub(crate) action: UrlAction,
}

impl Rule {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.global
    }

    #[must_use]
    pub fn pattern_syntax(&self) -> PatternSyntax {
        self.pattern_syntax
    }

    #[must_use]
    pub fn stop_processing(&self) -> bool {
        self.stop_processing
    }

    #[must_use]
    pub fn initial_match(&self) -> &UrlMatch {
        &self.initial_match
    }

    #[must_use]
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    #[must_use]
    pub fn action(&self) -> &UrlAction {
        &self.action
    }

    /// Global rules see the absolute URL; all others see the path.
    #[must_use]
    pub fn match_part(&self) -> UriMatchPart {
        if self.global {
            UriMatchPart::Full
        } else {
            UriMatchPart::Path
        }
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
