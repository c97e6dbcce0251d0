use std::borrow::Cow;
use std::time::Instant;

use tracing::{debug, info, trace};
use url::Url;

use crate::types::{
    EvaluationReport, Outcome, Request, RewrittenUrl, Rule, RuleResult, UriMatchPart, UrlAction,
};

#[derive(Debug, Default)]
struct Trace {
    fired: Vec<String>,
    tried: Vec<String>,
}

pub(crate) fn evaluate(rules: &[Rule], request: &Request) -> RuleResult {
    run(rules, request, None)
}

pub(crate) fn evaluate_detailed(rules: &[Rule], request: &Request) -> EvaluationReport {
    let start = Instant::now();
    let mut trace = Trace::default();
    let result = run(rules, request, Some(&mut trace));
    let duration = start.elapsed();
    EvaluationReport::new(result, trace.fired, trace.tried, duration)
}

fn run(rules: &[Rule], request: &Request, mut report: Option<&mut Trace>) -> RuleResult {
    let mut current = Cow::Borrowed(request);
    let mut rewritten = false;
    let mut stop = false;

    for rule in rules.iter().filter(|r| r.enabled) {
        if let Some(t) = report.as_deref_mut() {
            t.tried.push(rule.label().to_owned());
        }

        let matched = match rule.match_part() {
            UriMatchPart::Path => rule.initial_match.evaluate(current.path_str()),
            UriMatchPart::Full => rule.initial_match.evaluate(&current.absolute_url()),
        };
        if !matched.success {
            trace!(rule = rule.label(), path = current.path_str(), "no match");
            continue;
        }
        let rule_refs = matched.back_references;

        let conditions = rule.conditions.evaluate(&current, &rule_refs);
        if !conditions.passed {
            trace!(rule = rule.label(), "conditions not met");
            continue;
        }
        let condition_refs = conditions.captures.as_ref();

        debug!(
            rule = rule.label(),
            action = ?rule.action.action_type(),
            "rule fired"
        );
        if let Some(t) = report.as_deref_mut() {
            t.fired.push(rule.label().to_owned());
        }

        match &rule.action {
            UrlAction::None => {}
            UrlAction::Rewrite {
                url,
                append_query_string,
                log_rewritten_url,
            } => {
                let target = url.evaluate(&current, &rule_refs, condition_refs);
                apply_rewrite(current.to_mut(), &target, *append_query_string);
                rewritten = true;
                if *log_rewritten_url {
                    info!(
                        target: "urlrewrite::rewritten",
                        rule = rule.label(),
                        url = %current.path_and_query(),
                        "rewrote request"
                    );
                }
            }
            UrlAction::Redirect {
                url,
                append_query_string,
                log_rewritten_url,
                redirect_type,
            } => {
                let target = url.evaluate(&current, &rule_refs, condition_refs);
                let location =
                    redirect_location(&target, current.query_str(), *append_query_string);
                if *log_rewritten_url {
                    info!(
                        target: "urlrewrite::rewritten",
                        rule = rule.label(),
                        location = %location,
                        "redirecting request"
                    );
                }
                return RuleResult::new(
                    Outcome::Redirected {
                        location,
                        status_code: redirect_type.status_code(),
                    },
                    true,
                );
            }
            UrlAction::CustomResponse(response) => {
                return RuleResult::new(Outcome::CustomResponse(response.clone()), true);
            }
            UrlAction::AbortRequest => {
                return RuleResult::new(Outcome::Aborted, true);
            }
        }

        if rule.stop_processing {
            stop = true;
            break;
        }
    }

    let outcome = if rewritten {
        Outcome::Rewritten(RewrittenUrl {
            scheme: current.scheme.clone(),
            host: current.host.clone(),
            path: current.path.clone(),
            query: current.query.clone(),
        })
    } else {
        Outcome::Continue
    };
    RuleResult::new(outcome, stop)
}

/// Join two query strings with `&`, skipping empty sides.
fn join_query(original: &str, added: &str) -> String {
    match (original.is_empty(), added.is_empty()) {
        (true, _) => added.to_owned(),
        (false, true) => original.to_owned(),
        (false, false) => format!("{original}&{added}"),
    }
}

fn apply_rewrite(request: &mut Request, target: &str, append_query_string: bool) {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    // Scheme and host come from the parsed URL; path and query keep the
    // template's text as-is, the same as for relative targets.
    if let Some((_, after_scheme)) = path.split_once("://") {
        if let Ok(url) = Url::parse(target) {
            request.scheme = url.scheme().to_owned();
            request.host = url.host_str().map(|host| match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_owned(),
            });
            request.path = match after_scheme.find('/') {
                Some(start) => after_scheme[start..].to_owned(),
                None => "/".to_owned(),
            };
            set_query(request, query, append_query_string);
            return;
        }
    }

    request.path = if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    };
    set_query(request, query, append_query_string);
}

fn set_query(request: &mut Request, query: Option<&str>, append_query_string: bool) {
    match query {
        Some(query) if append_query_string => request.query = join_query(&request.query, query),
        Some(query) => request.query = query.to_owned(),
        None if append_query_string => {}
        None => request.query.clear(),
    }
}

fn redirect_location(target: &str, original_query: &str, append_query_string: bool) -> String {
    let target = if target.is_empty() {
        "/".to_owned()
    } else if target.contains("://") || target.starts_with('/') {
        target.to_owned()
    } else {
        format!("/{target}")
    };

    if !append_query_string {
        return target;
    }
    match target.split_once('?') {
        Some((path, query)) => format!("{path}?{}", join_query(original_query, query)),
        None if original_query.is_empty() => target,
        None => format!("{target}?{original_query}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ConditionDef, CustomResponse, LogicalGrouping, RedirectType, RuleSetBuilder,
    };

    fn rewritten(result: &RuleResult) -> (&str, &str) {
        match result.outcome() {
            Outcome::Rewritten(url) => (url.path.as_str(), url.query.as_str()),
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn backreference_round_trip() {
        let set = RuleSetBuilder::new()
            .rule("old", |r| r.matches("^/old/(.*)$").rewrite("/new/{R:1}"))
            .compile()
            .unwrap();
        let result = set.evaluate("/old/abc", "");
        assert_eq!(result.rewritten_path(), Some("/new/abc"));
        assert!(!result.stopped());
    }

    #[test]
    fn negated_match_fires() {
        let set = RuleSetBuilder::new()
            .rule("not-admin", |r| r.matches("^/admin").negate().rewrite("/public{R:1}"))
            .compile()
            .unwrap();
        assert_eq!(set.evaluate("/public", "").rewritten_path(), Some("/public"));
        assert_eq!(set.evaluate("/admin", "").outcome(), &Outcome::Continue);
    }

    fn two_conditions(grouping: LogicalGrouping) -> RuleResult {
        let set = RuleSetBuilder::new()
            .rule("c", |r| {
                r.matches(".*")
                    .condition(ConditionDef::new("{REQUEST_METHOD}", "^GET$"))
                    .condition(ConditionDef::new("{QUERY_STRING}", "debug=1"))
                    .logical_grouping(grouping)
                    .abort()
            })
            .compile()
            .unwrap();
        set.evaluate("/x", "debug=0")
    }

    #[test]
    fn match_all_requires_every_condition() {
        assert_eq!(two_conditions(LogicalGrouping::MatchAll).outcome(), &Outcome::Continue);
    }

    #[test]
    fn match_any_requires_one_condition() {
        assert_eq!(two_conditions(LogicalGrouping::MatchAny).outcome(), &Outcome::Aborted);
    }

    #[test]
    fn stop_processing_keeps_first_rewrite() {
        let set = RuleSetBuilder::new()
            .rule("first", |r| r.matches("^/a").rewrite("/first").stop_processing())
            .rule("second", |r| r.matches(".*").rewrite("/second"))
            .compile()
            .unwrap();
        let result = set.evaluate("/a", "");
        assert_eq!(result.rewritten_path(), Some("/first"));
        assert!(result.stopped());
    }

    #[test]
    fn later_rules_see_rewritten_path() {
        let set = RuleSetBuilder::new()
            .rule("first", |r| r.matches("^/a$").rewrite("/b"))
            .rule("second", |r| r.matches("^/b$").rewrite("/c"))
            .compile()
            .unwrap();
        assert_eq!(set.evaluate("/a", "").rewritten_path(), Some("/c"));
    }

    #[test]
    fn redirect_terminates_without_stop_processing() {
        let set = RuleSetBuilder::new()
            .rule("go", |r| r.matches("^/old$").redirect("/new", RedirectType::Found))
            .rule("never", |r| r.matches(".*").abort())
            .compile()
            .unwrap();
        let result = set.evaluate("/old", "");
        assert_eq!(
            result.outcome(),
            &Outcome::Redirected {
                location: "/new".into(),
                status_code: 302
            }
        );
        assert!(result.stopped());
    }

    #[test]
    fn custom_response_is_terminal() {
        let set = RuleSetBuilder::new()
            .rule("deny", |r| {
                r.matches("^/secret").custom_response(403).status_reason("Forbidden")
            })
            .compile()
            .unwrap();
        let result = set.evaluate("/secret", "");
        assert_eq!(
            result.outcome(),
            &Outcome::CustomResponse(CustomResponse {
                status_code: 403,
                sub_status_code: None,
                status_reason: Some("Forbidden".into()),
                status_description: None,
            })
        );
    }

    #[test]
    fn none_action_with_stop_halts_chain() {
        let set = RuleSetBuilder::new()
            .rule("guard", |r| r.matches("^/static/").no_action().stop_processing())
            .rule("all", |r| r.matches(".*").rewrite("/index"))
            .compile()
            .unwrap();
        let result = set.evaluate("/static/a.css", "");
        assert_eq!(result.outcome(), &Outcome::Continue);
        assert!(result.stopped());
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let set = RuleSetBuilder::new()
            .rule("off", |r| r.matches(".*").abort().disabled())
            .compile()
            .unwrap();
        assert_eq!(set.evaluate("/x", "").outcome(), &Outcome::Continue);
    }

    #[test]
    fn rewrite_query_handling() {
        let keep = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/a$").rewrite("/b"))
            .compile()
            .unwrap();
        assert_eq!(rewritten(&keep.evaluate("/a", "x=1")), ("/b", "x=1"));

        let merge = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/a$").rewrite("/b?y=2"))
            .compile()
            .unwrap();
        assert_eq!(rewritten(&merge.evaluate("/a", "x=1")), ("/b", "x=1&y=2"));

        let replace = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/a$").rewrite("/b?y=2").append_query_string(false))
            .compile()
            .unwrap();
        assert_eq!(rewritten(&replace.evaluate("/a", "x=1")), ("/b", "y=2"));

        let clear = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/a$").rewrite("/b").append_query_string(false))
            .compile()
            .unwrap();
        assert_eq!(rewritten(&clear.evaluate("/a", "x=1")), ("/b", ""));
    }

    #[test]
    fn rewrite_path_normalization() {
        let set = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/a/(.*)$").rewrite("{R:1}"))
            .compile()
            .unwrap();
        assert_eq!(set.evaluate("/a/b", "").rewritten_path(), Some("/b"));
        assert_eq!(set.evaluate("/a/", "").rewritten_path(), Some("/"));
    }

    #[test]
    fn absolute_rewrite_replaces_host() {
        let set = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/img/(.*)$").rewrite("https://cdn.example.com:8443/{R:1}?v=1"))
            .compile()
            .unwrap();
        match set.evaluate("/img/cat.png", "").outcome() {
            Outcome::Rewritten(url) => {
                assert_eq!(url.scheme, "https");
                assert_eq!(url.host.as_deref(), Some("cdn.example.com:8443"));
                assert_eq!(url.path, "/cat.png");
                assert_eq!(url.query, "v=1");
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn absolute_and_relative_targets_keep_same_path_text() {
        let set = RuleSetBuilder::new()
            .rule("abs", |r| r.matches("^/abs/(.*)$").rewrite("http://cdn.example.com/{R:1}?q={R:1}"))
            .rule("rel", |r| r.matches("^/rel/(.*)$").rewrite("/{R:1}?q={R:1}"))
            .compile()
            .unwrap();
        for prefix in ["/abs/", "/rel/"] {
            match set.evaluate(&format!("{prefix}a b/ü"), "").outcome() {
                Outcome::Rewritten(url) => {
                    assert_eq!(url.path, "/a b/ü", "{prefix}");
                    assert_eq!(url.query, "q=a b/ü", "{prefix}");
                }
                other => panic!("expected rewrite, got {other:?}"),
            }
        }
    }

    #[test]
    fn absolute_target_without_path_gets_root() {
        let set = RuleSetBuilder::new()
            .rule("r", |r| r.matches("^/home$").rewrite("https://example.com"))
            .compile()
            .unwrap();
        match set.evaluate("/home", "").outcome() {
            Outcome::Rewritten(url) => {
                assert_eq!(url.host.as_deref(), Some("example.com"));
                assert_eq!(url.path, "/");
            }
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn redirect_location_query_rules() {
        assert_eq!(redirect_location("", "", true), "/");
        assert_eq!(redirect_location("login", "", true), "/login");
        assert_eq!(redirect_location("/b", "x=1", true), "/b?x=1");
        assert_eq!(redirect_location("/b?y=2", "x=1", true), "/b?x=1&y=2");
        assert_eq!(redirect_location("/b?y=2", "x=1", false), "/b?y=2");
        assert_eq!(redirect_location("/b", "x=1", false), "/b");
        assert_eq!(
            redirect_location("https://example.com/b", "x=1", true),
            "https://example.com/b?x=1"
        );
    }

    #[test]
    fn condition_captures_reach_action() {
        let set = RuleSetBuilder::new()
            .rule("host", |r| {
                r.matches("^/(.*)$")
                    .condition(ConditionDef::new("{HTTP_HOST}", r"^(\w+)\.example\.com$"))
                    .rewrite("/{C:1}/{R:1}")
            })
            .compile()
            .unwrap();
        let req = Request::new("/page").host("shop.example.com");
        assert_eq!(set.evaluate_request(&req).rewritten_path(), Some("/shop/page"));
    }

    #[test]
    fn global_rules_match_absolute_url() {
        let set = RuleSetBuilder::new()
            .rule("local", |r| r.matches("^/x$").rewrite("/local"))
            .global_rule("canonical", |r| {
                r.matches("^http://example\\.com/(.*)$")
                    .redirect("https://www.example.com/{R:1}", RedirectType::Permanent)
            })
            .compile()
            .unwrap();
        let req = Request::new("/x").host("example.com");
        assert_eq!(
            set.evaluate_request(&req).outcome(),
            &Outcome::Redirected {
                location: "https://www.example.com/x".into(),
                status_code: 301
            }
        );
        assert_eq!(set.evaluate("/x", "").rewritten_path(), Some("/local"));
    }

    #[test]
    fn detailed_report_lists_tried_and_fired() {
        let set = RuleSetBuilder::new()
            .rule("miss", |r| r.matches("^/nope").abort())
            .rule("hit", |r| r.matches("^/yes").rewrite("/ok"))
            .rule("off", |r| r.matches(".*").abort().disabled())
            .compile()
            .unwrap();
        let report = set.evaluate_detailed(&Request::new("/yes"));
        assert_eq!(report.fired(), &["hit"]);
        assert_eq!(report.evaluation_order(), &["miss", "hit"]);
        assert_eq!(report.result().rewritten_path(), Some("/ok"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let set = RuleSetBuilder::new()
            .rule("a", |r| r.matches("^/(\\w+)/(\\d+)$").rewrite("/item?kind={R:1}&id={R:2}"))
            .compile()
            .unwrap();
        let first = set.evaluate("/book/42", "ref=home");
        let second = set.evaluate("/book/42", "ref=home");
        assert_eq!(first, second);
        assert_eq!(rewritten(&first), ("/item", "ref=home&kind=book&id=42"));
    }

    #[test]
    fn join_query_skips_empty_sides() {
        assert_eq!(join_query("", "b=2"), "b=2");
        assert_eq!(join_query("a=1", ""), "a=1");
        assert_eq!(join_query("a=1", "b=2"), "a=1&b=2");
    }
}
