mod action;
mod backref;
mod condition;
mod error;
mod evaluation_report;
mod pattern;
mod request;
mod result;
mod rewrite_map;
mod rule;
mod ruleset;
mod server_variable;
mod url_match;

pub use action::{ActionType, CustomResponse, RedirectType, UrlAction};
pub use backref::{BackReferences, MatchResults};
pub use condition::{
    Condition, ConditionMatchType, ConditionOutcome, ConditionTest, Conditions, LogicalGrouping,
};
pub use error::{CompileError, TemplateError, UnknownVariant};
pub use evaluation_report::EvaluationReport;
pub use pattern::{Pattern, PatternSegment};
pub use request::{FileProbe, Request};
pub use result::{Outcome, RewrittenUrl, RuleResult};
pub use rewrite_map::{RewriteMap, RewriteMaps};
pub use rule::{
    ActionDef, ConditionDef, ConditionsDef, MatchDef, PatternSyntax, Rule, RuleDef,
};
pub use ruleset::{RuleBuilder, RuleSet, RuleSetBuilder};
pub use server_variable::{ServerVariable, UriMatchPart};
pub use url_match::UrlMatch;
