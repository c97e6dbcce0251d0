use std::fmt;

use super::action::{ActionType, RedirectType};
use super::condition::LogicalGrouping;
use super::error::CompileError;
use super::evaluation_report::EvaluationReport;
use super::request::Request;
use super::result::RuleResult;
use super::rewrite_map::{RewriteMap, RewriteMaps};
use super::rule::{ActionDef, ConditionDef, MatchDef, PatternSyntax, Rule, RuleDef};

/// Builder for constructing a [`RuleSet`] in code.
///
/// Each rule is defined via a closure and the whole set is compiled into an
/// immutable, thread-safe structure.
///
/// # Example
///
/// ```
/// use urlrewrite::{RedirectType, RuleSetBuilder};
///
/// let rules = RuleSetBuilder::new()
///     .rule("legacy", |r| r.matches("^/old/(.*)$").rewrite("/new/{R:1}"))
///     .rule("login", |r| {
///         r.matches("^/signin$").redirect("/login", RedirectType::Found)
///     })
///     .compile()
///     .unwrap();
///
/// let result = rules.evaluate("/old/abc", "");
/// assert_eq!(result.rewritten_path(), Some("/new/abc"));
/// ```
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    rules: Vec<RuleDef>,
    maps: RewriteMaps,
}

/// Intermediate builder passed to the rule definition closure.
///
/// The closure must call [`matches`](Self::matches) and one of the action
/// methods; otherwise compilation fails with [`CompileError::MissingMatch`]
/// or [`CompileError::MissingAction`].
#[derive(Debug)]
pub struct RuleBuilder {
    def: RuleDef,
    url: Option<String>,
    ignore_case: bool,
    negate: bool,
    append_query_string: bool,
    log_rewritten_url: bool,
    status_reason: Option<String>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule matched against the request path.
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        self.rules.push(f(RuleBuilder::new(name, false)).finish());
        self
    }

    /// Define a global rule. Global rules run before all others and match
    /// against the absolute URL when the request has a host.
    #[must_use]
    pub fn global_rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        self.rules.push(f(RuleBuilder::new(name, true)).finish());
        self
    }

    /// Register a rewrite map usable as `{Name:key}` in templates.
    #[must_use]
    pub fn rewrite_map(mut self, map: RewriteMap) -> Self {
        self.maps.add(map);
        self
    }

    /// Compile the rules into an immutable `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] for the first rule that fails to compile.
    pub fn compile(self) -> Result<RuleSet, CompileError> {
        crate::compile::compile(&self.rules, self.maps).map_err(|(err, _)| err)
    }
}

impl RuleBuilder {
    fn new(name: &str, global: bool) -> Self {
        let mut def = RuleDef::new(Some(name.to_owned()));
        def.global = global;
        Self {
            def,
            url: None,
            ignore_case: true,
            negate: false,
            append_query_string: true,
            log_rewritten_url: false,
            status_reason: None,
        }
    }

    fn finish(mut self) -> RuleDef {
        self.def.match_def = self.url.map(|url| MatchDef {
            url,
            ignore_case: self.ignore_case,
            negate: self.negate,
        });
        if let Some(action) = self.def.action.as_mut() {
            action.append_query_string = self.append_query_string;
            action.log_rewritten_url = self.log_rewritten_url;
            if action.action_type == ActionType::CustomResponse {
                action.status_reason = self.status_reason;
            }
        }
        self.def
    }

    fn action(mut self, action: ActionDef) -> Self {
        self.def.action = Some(action);
        self
    }

    /// Set the pattern the request path must match.
    #[must_use]
    pub fn matches(mut self, url: &str) -> Self {
        self.url = Some(url.to_owned());
        self
    }

    /// Case-insensitive by default.
    #[must_use]
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negate = true;
        self
    }

    #[must_use]
    pub fn pattern_syntax(mut self, syntax: PatternSyntax) -> Self {
        self.def.pattern_syntax = syntax;
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: ConditionDef) -> Self {
        self.def.conditions.list.push(condition);
        self
    }

    #[must_use]
    pub fn logical_grouping(mut self, grouping: LogicalGrouping) -> Self {
        self.def.conditions.grouping = grouping;
        self
    }

    #[must_use]
    pub fn track_all_captures(mut self) -> Self {
        self.def.conditions.track_all_captures = true;
        self
    }

    #[must_use]
    pub fn rewrite(self, url: &str) -> Self {
        let mut action = ActionDef::new(ActionType::Rewrite);
        action.url = url.to_owned();
        self.action(action)
    }

    #[must_use]
    pub fn redirect(self, url: &str, redirect_type: RedirectType) -> Self {
        let mut action = ActionDef::new(ActionType::Redirect);
        action.url = url.to_owned();
        action.redirect_type = redirect_type;
        self.action(action)
    }

    #[must_use]
    pub fn custom_response(self, status_code: u32) -> Self {
        let mut action = ActionDef::new(ActionType::CustomResponse);
        action.status_code = Some(status_code);
        self.action(action)
    }

    /// Reason phrase for a [`custom_response`](Self::custom_response), in
    /// either call order. Ignored for other actions.
    #[must_use]
    pub fn status_reason(mut self, reason: &str) -> Self {
        self.status_reason = Some(reason.to_owned());
        self
    }

    #[must_use]
    pub fn abort(self) -> Self {
        self.action(ActionDef::new(ActionType::AbortRequest))
    }

    /// Match without changing the request; combine with
    /// [`stop_processing`](Self::stop_processing) to shield paths from later rules.
    #[must_use]
    pub fn no_action(self) -> Self {
        self.action(ActionDef::new(ActionType::None))
    }

    #[must_use]
    pub fn append_query_string(mut self, append: bool) -> Self {
        self.append_query_string = append;
        self
    }

    #[must_use]
    pub fn log_rewritten_url(mut self) -> Self {
        self.log_rewritten_url = true;
        self
    }

    #[must_use]
    pub fn stop_processing(mut self) -> Self {
        self.def.stop_processing = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.def.enabled = false;
        self
    }
}

/// A compiled, immutable rule set. Thread-safe and designed to live behind
/// `Arc` (see [`RewriteEngine`](crate::RewriteEngine)).
#[derive(Debug, Default)]
pub struct RuleSet {
    pub(crate) rules: Vec<Rule>,
    pub(crate) maps: RewriteMaps,
}

impl RuleSet {
    /// Evaluate a bare path and query string.
    ///
    /// Server variables other than the URL parts resolve as for a plain
    /// `GET` over `http` with no headers.
    pub fn evaluate(&self, path: &str, query: &str) -> RuleResult {
        self.evaluate_request(&Request::new(path).query(query))
    }

    /// Evaluate against a full request description.
    pub fn evaluate_request(&self, request: &Request) -> RuleResult {
        crate::evaluate::evaluate(&self.rules, request)
    }

    /// Evaluate with diagnostics.
    ///
    /// Returns an [`EvaluationReport`] with the result, which rules fired,
    /// which were tried, and timing information.
    pub fn evaluate_detailed(&self, request: &Request) -> EvaluationReport {
        crate::evaluate::evaluate_detailed(&self.rules, request)
    }

    /// Parse rule XML and compile it into a `RuleSet`.
    ///
    /// The document is all-or-nothing: any error rejects every rule in it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::parse::ParseError) on malformed XML, a
    /// missing required element or attribute, or a rule that fails to compile.
    pub fn from_xml(input: &str) -> Result<Self, crate::parse::ParseError> {
        let parsed = crate::parse::parse(input)?;
        crate::compile::compile(&parsed.rules, parsed.maps).map_err(|(err, location)| {
            crate::parse::ParseError::new(err.into(), location)
        })
    }

    /// Read an XML rule file and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`](crate::RewriteError) on I/O, parse, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::RewriteError> {
        let input = std::fs::read_to_string(path)?;
        Ok(Self::from_xml(&input)?)
    }

    /// Compiled rules in evaluation order, global rules first.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn rewrite_maps(&self) -> &RewriteMaps {
        &self.maps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let global = self.rules.iter().filter(|r| r.global).count();
        write!(
            f,
            "RuleSet({} rules, {} global, {} rewrite maps)",
            self.rules.len(),
            global,
            self.maps.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Outcome, UrlAction};

    #[test]
    fn builder_collects_rules() {
        let builder = RuleSetBuilder::new()
            .rule("a", |r| r.matches("^/a").rewrite("/b"))
            .global_rule("g", |r| r.matches("^https?://").abort())
            .rewrite_map(RewriteMap::new("m"));

        assert_eq!(builder.rules.len(), 2);
        assert_eq!(builder.rules[0].name.as_deref(), Some("a"));
        assert!(builder.rules[1].global);
        assert_eq!(builder.maps.len(), 1);
    }

    #[test]
    fn builder_applies_match_and_action_flags() {
        let def = RuleBuilder::new("r", false)
            .log_rewritten_url()
            .append_query_string(false)
            .ignore_case(false)
            .negate()
            .matches("^/x")
            .rewrite("/y")
            .finish();
        let m = def.match_def.unwrap();
        assert!(!m.ignore_case);
        assert!(m.negate);
        let a = def.action.unwrap();
        assert!(!a.append_query_string);
        assert!(a.log_rewritten_url);
    }

    #[test]
    fn status_reason_applies_in_either_order() {
        for def in [
            RuleBuilder::new("r", false)
                .matches("^/x")
                .status_reason("Gone")
                .custom_response(410)
                .finish(),
            RuleBuilder::new("r", false)
                .matches("^/x")
                .custom_response(410)
                .status_reason("Gone")
                .finish(),
        ] {
            let action = def.action.unwrap();
            assert_eq!(action.status_code, Some(410));
            assert_eq!(action.status_reason.as_deref(), Some("Gone"));
        }
    }

    #[test]
    fn status_reason_ignored_for_other_actions() {
        let def = RuleBuilder::new("r", false)
            .matches("^/x")
            .status_reason("Gone")
            .rewrite("/y")
            .finish();
        assert_eq!(def.action.unwrap().status_reason, None);
    }

    #[test]
    fn builder_rule_without_action_returns_error() {
        let result = RuleSetBuilder::new()
            .rule("bad_rule", |r| r.matches("^/"))
            .compile();
        assert!(matches!(
            result,
            Err(CompileError::MissingAction { rule }) if rule == "bad_rule"
        ));
    }

    #[test]
    fn builder_rule_without_match_returns_error() {
        let result = RuleSetBuilder::new().rule("bad_rule", |r| r.abort()).compile();
        assert!(matches!(result, Err(CompileError::MissingMatch { .. })));
    }

    #[test]
    fn display_counts() {
        let set = RuleSetBuilder::new()
            .rule("a", |r| r.matches("^/a").rewrite("/b"))
            .global_rule("g", |r| r.matches("^x").abort())
            .compile()
            .unwrap();
        assert_eq!(set.to_string(), "RuleSet(2 rules, 1 global, 0 rewrite maps)");
        assert_eq!(set.len(), 2);
        assert!(matches!(set.rules()[1].action(), UrlAction::Rewrite { .. }));
    }

    #[test]
    fn empty_set_passes_through() {
        let set = RuleSet::default();
        assert!(set.is_empty());
        assert_eq!(set.evaluate("/anything", "q=1").outcome(), &Outcome::Continue);
    }
}
