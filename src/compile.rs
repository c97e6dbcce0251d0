use fancy_regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::parse::template::parse_template;
use crate::parse::Location;
use crate::types::{
    ActionDef, ActionType, CompileError, Condition, ConditionDef, ConditionMatchType,
    ConditionTest, Conditions, CustomResponse, Pattern, PatternSyntax, RewriteMaps, Rule, RuleDef,
    RuleSet, UriMatchPart, UrlAction, UrlMatch,
};

/// Backtracking steps a single match may take before it is abandoned and
/// treated as a non-match.
pub const MATCH_BACKTRACK_LIMIT: usize = 1_000_000;

/// Compiled size limit, in bytes, for the automata behind each regex.
pub const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Build a regex with the crate-wide budgets applied.
pub(crate) fn build_regex(pattern: &str, ignore_case: bool) -> Result<Regex, CompileError> {
    let source = if ignore_case {
        format!("(?i){pattern}")
    } else {
        pattern.to_owned()
    };
    RegexBuilder::new(&source)
        .backtrack_limit(MATCH_BACKTRACK_LIMIT)
        .delegate_size_limit(REGEX_SIZE_LIMIT)
        .delegate_dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|err| CompileError::InvalidRegex {
            pattern: pattern.to_owned(),
            source: Box::new(err),
        })
}

/// Translate an IIS wildcard pattern into an anchored regex. Each `*`
/// becomes a capture group.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        if c == '*' || c == '?' {
            out.push_str(&fancy_regex::escape(&literal));
            literal.clear();
            out.push_str(if c == '*' { "(.*)" } else { "." });
        } else {
            literal.push(c);
        }
    }
    out.push_str(&fancy_regex::escape(&literal));
    out.push('$');
    out
}

pub(crate) fn compile_match(
    syntax: PatternSyntax,
    pattern: &str,
    ignore_case: bool,
    negate: bool,
) -> Result<UrlMatch, CompileError> {
    match syntax {
        PatternSyntax::EcmaScript => Ok(UrlMatch::Regex {
            regex: build_regex(pattern, ignore_case)?,
            negate,
        }),
        PatternSyntax::Wildcard => Ok(UrlMatch::Regex {
            regex: build_regex(&wildcard_to_regex(pattern), ignore_case)?,
            negate,
        }),
        PatternSyntax::ExactMatch => Ok(UrlMatch::Exact {
            value: pattern.to_owned(),
            ignore_case,
            negate,
        }),
    }
}

fn compile_template(
    template: &str,
    maps: &RewriteMaps,
    match_part: UriMatchPart,
) -> Result<Pattern, CompileError> {
    parse_template(template, maps, match_part).map_err(|source| CompileError::Template {
        template: template.to_owned(),
        source,
    })
}

fn compile_condition(
    def: &ConditionDef,
    syntax: PatternSyntax,
    maps: &RewriteMaps,
    match_part: UriMatchPart,
) -> Result<Condition, CompileError> {
    let input = compile_template(&def.input, maps, match_part)?;
    let test = match def.match_type {
        ConditionMatchType::Pattern => {
            let pattern =
                def.pattern
                    .as_deref()
                    .ok_or_else(|| CompileError::MissingConditionPattern {
                        input: def.input.clone(),
                    })?;
            ConditionTest::Match(compile_match(syntax, pattern, def.ignore_case, def.negate)?)
        }
        ConditionMatchType::IsFile => ConditionTest::IsFile { negate: def.negate },
        ConditionMatchType::IsDirectory => ConditionTest::IsDirectory { negate: def.negate },
    };
    Ok(Condition { input, test })
}

fn compile_action(
    def: &ActionDef,
    rule: &str,
    maps: &RewriteMaps,
    match_part: UriMatchPart,
) -> Result<UrlAction, CompileError> {
    let action = match def.action_type {
        ActionType::None => UrlAction::None,
        ActionType::Rewrite => UrlAction::Rewrite {
            url: compile_template(&def.url, maps, match_part)?,
            append_query_string: def.append_query_string,
            log_rewritten_url: def.log_rewritten_url,
        },
        ActionType::Redirect => UrlAction::Redirect {
            url: compile_template(&def.url, maps, match_part)?,
            append_query_string: def.append_query_string,
            log_rewritten_url: def.log_rewritten_url,
            redirect_type: def.redirect_type,
        },
        ActionType::CustomResponse => {
            let code = def.status_code.ok_or_else(|| CompileError::MissingStatusCode {
                rule: rule.to_owned(),
            })?;
            let status_code = u16::try_from(code)
                .ok()
                .filter(|c| (200..=999).contains(c))
                .ok_or(CompileError::InvalidStatusCode { code })?;
            UrlAction::CustomResponse(CustomResponse {
                status_code,
                sub_status_code: def.sub_status_code,
                status_reason: def.status_reason.clone(),
                status_description: def.status_description.clone(),
            })
        }
        ActionType::AbortRequest => UrlAction::AbortRequest,
    };
    Ok(action)
}

pub(crate) fn compile_rule(def: &RuleDef, maps: &RewriteMaps) -> Result<Rule, CompileError> {
    let name = def.display_name();
    let match_part = if def.global {
        UriMatchPart::Full
    } else {
        UriMatchPart::Path
    };

    let match_def = def
        .match_def
        .as_ref()
        .ok_or_else(|| CompileError::MissingMatch { rule: name.clone() })?;
    if match_def.url.is_empty() {
        return Err(CompileError::EmptyPattern { rule: name });
    }
    let action_def = def
        .action
        .as_ref()
        .ok_or_else(|| CompileError::MissingAction { rule: name.clone() })?;

    let initial_match = compile_match(
        def.pattern_syntax,
        &match_def.url,
        match_def.ignore_case,
        match_def.negate,
    )?;

    let list = def
        .conditions
        .list
        .iter()
        .map(|c| compile_condition(c, def.pattern_syntax, maps, match_part))
        .collect::<Result<Vec<_>, _>>()?;

    let action = compile_action(action_def, &name, maps, match_part)?;

    Ok(Rule {
        name: def.name.clone(),
        enabled: def.enabled,
        global: def.global,
        pattern_syntax: def.pattern_syntax,
        stop_processing: def.stop_processing,
        initial_match,
        conditions: Conditions {
            list,
            grouping: def.conditions.grouping,
            track_all_captures: def.conditions.track_all_captures,
        },
        action,
    })
}

/// Compile every definition, all or nothing. Global rules are moved ahead
/// of the others, keeping declared order within each group.
///
/// On failure, returns the error together with the source location of the
/// offending rule when it came from XML.
pub(crate) fn compile(
    defs: &[RuleDef],
    maps: RewriteMaps,
) -> Result<RuleSet, (CompileError, Option<Location>)> {
    let mut rules = Vec::with_capacity(defs.len());
    for def in defs {
        let rule = compile_rule(def, &maps).map_err(|err| (err, def.location))?;
        rules.push(rule);
    }
    rules.sort_by_key(|r| !r.global);

    debug!(
        rules = rules.len(),
        rewrite_maps = maps.len(),
        "compiled rule set"
    );
    Ok(RuleSet { rules, maps })
}
