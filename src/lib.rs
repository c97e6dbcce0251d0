//! IIS-style URL rewrite rules: load a rule set from XML (or build it in
//! code), then evaluate requests against it to get a rewrite, redirect,
//! custom response, abort, or pass-through.
//!
//! ```
//! use urlrewrite::{Outcome, RuleSet};
//!
//! let rules = RuleSet::from_xml(r#"
//!     <rewrite>
//!       <rules>
//!         <rule name="legacy" stopProcessing="true">
//!           <match url="^/old/(.*)$" />
//!           <action type="Rewrite" url="/new/{R:1}" />
//!         </rule>
//!       </rules>
//!     </rewrite>"#).unwrap();
//!
//! let result = rules.evaluate("/old/abc", "");
//! assert_eq!(result.rewritten_path(), Some("/new/abc"));
//! assert!(matches!(rules.evaluate("/other", "").outcome(), Outcome::Continue));
//! ```

mod compile;
mod engine;
mod error;
mod evaluate;
pub mod parse;
mod types;

pub use compile::{MATCH_BACKTRACK_LIMIT, REGEX_SIZE_LIMIT};
pub use engine::RewriteEngine;
pub use error::RewriteError;
pub use parse::{Location, ParseError, ParseErrorKind};
pub use types::{
    ActionDef, ActionType, BackReferences, CompileError, Condition, ConditionDef,
    ConditionMatchType, ConditionOutcome, ConditionTest, Conditions, ConditionsDef,
    CustomResponse, EvaluationReport, FileProbe, LogicalGrouping, MatchDef, MatchResults, Outcome,
    Pattern, PatternSegment, PatternSyntax, RedirectType, Request, RewriteMap, RewriteMaps,
    RewrittenUrl, Rule, RuleBuilder, RuleDef, RuleResult, RuleSet, RuleSetBuilder, ServerVariable,
    TemplateError, UnknownVariant, UriMatchPart, UrlAction, UrlMatch,
};
