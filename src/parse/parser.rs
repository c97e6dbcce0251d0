use std::fmt::Debug;
use std::str::FromStr;

use tracing::warn;

use crate::types::{
    ActionDef, ActionType, ConditionDef, ConditionMatchType, ConditionsDef, MatchDef, RewriteMap,
    RewriteMaps, RuleDef, UnknownVariant,
};

use super::error::{Location, ParseError, ParseErrorKind};
use super::grammar::Element;

/// The result of parsing a rule XML document, before compilation.
#[derive(Debug, Default)]
pub struct ParsedRuleSet {
    pub maps: RewriteMaps,
    /// Global rules first, then the `rules` collection, each in declared order.
    pub rules: Vec<RuleDef>,
}

struct Builder<'s> {
    source: &'s str,
}

impl Builder<'_> {
    fn location(&self, el: &Element) -> Location {
        Location::from_offset(self.source, el.offset(self.source.len()))
    }

    fn error(&self, el: &Element, kind: ParseErrorKind) -> ParseError {
        ParseError::at(kind, self.location(el))
    }

    fn required_attr<'e>(
        &self,
        el: &'e Element,
        attribute: &'static str,
        element: &'static str,
    ) -> Result<&'e str, ParseError> {
        el.attr(attribute)
            .ok_or_else(|| self.error(el, ParseErrorKind::MissingAttribute { attribute, element }))
    }

    fn required_child<'e>(
        &self,
        el: &'e Element,
        element: &'static str,
        parent: &'static str,
    ) -> Result<&'e Element, ParseError> {
        el.child(element)
            .ok_or_else(|| self.error(el, ParseErrorKind::MissingElement { element, parent }))
    }

    fn number(&self, el: &Element, attribute: &'static str) -> Result<Option<u32>, ParseError> {
        let Some(raw) = el.attr(attribute) else {
            return Ok(None);
        };
        raw.trim().parse::<u32>().map(Some).map_err(|_| {
            self.error(
                el,
                ParseErrorKind::InvalidAttribute {
                    attribute,
                    value: raw.to_owned(),
                },
            )
        })
    }

    fn rewrite_maps(&self, rewrite: &Element) -> Result<RewriteMaps, ParseError> {
        let mut maps = RewriteMaps::new();
        let Some(section) = rewrite.child("rewriteMaps") else {
            return Ok(maps);
        };
        for el in section.children_named("rewriteMap") {
            let mut map = RewriteMap::new(self.required_attr(el, "name", "rewriteMap")?);
            if let Some(default) = el.attr("defaultValue") {
                map = map.default_value(default);
            }
            for add in el.children_named("add") {
                let key = self.required_attr(add, "key", "add")?;
                let value = self.required_attr(add, "value", "add")?;
                map.insert(key, value);
            }
            maps.add(map);
        }
        Ok(maps)
    }

    fn rule(&self, el: &Element, global: bool) -> Result<RuleDef, ParseError> {
        let mut def = RuleDef::new(el.attr("name").map(str::to_owned));
        def.global = global;
        def.enabled = flag(el, "enabled", true);
        def.pattern_syntax = choice(el, "patternSyntax");
        def.stop_processing = flag(el, "stopProcessing", false);
        def.location = Some(self.location(el));

        let m = self.required_child(el, "match", "rule")?;
        let url = self.required_attr(m, "url", "match")?;
        if url.is_empty() {
            return Err(self.error(m, ParseErrorKind::MissingAttribute {
                attribute: "url",
                element: "match",
            }));
        }
        def.match_def = Some(MatchDef {
            url: url.to_owned(),
            ignore_case: flag(m, "ignoreCase", true),
            negate: flag(m, "negate", false),
        });

        if let Some(conditions) = el.child("conditions") {
            def.conditions = self.conditions(conditions)?;
        }

        let action = self.required_child(el, "action", "rule")?;
        def.action = Some(self.action(action)?);
        Ok(def)
    }

    fn conditions(&self, el: &Element) -> Result<ConditionsDef, ParseError> {
        let list = el
            .children_named("add")
            .map(|add| self.condition(add))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConditionsDef {
            grouping: choice(el, "logicalGrouping"),
            track_all_captures: if el.attr("trackAllCaptures").is_some() {
                flag(el, "trackAllCaptures", false)
            } else {
                flag(el, "trackingAllCaptures", false)
            },
            list,
        })
    }

    fn condition(&self, el: &Element) -> Result<ConditionDef, ParseError> {
        let input = self.required_attr(el, "input", "add")?;
        let match_type: ConditionMatchType = choice(el, "matchType");
        let pattern = match match_type {
            ConditionMatchType::Pattern => Some(self.required_attr(el, "pattern", "add")?.to_owned()),
            ConditionMatchType::IsFile | ConditionMatchType::IsDirectory => {
                el.attr("pattern").map(str::to_owned)
            }
        };
        Ok(ConditionDef {
            input: input.to_owned(),
            pattern,
            match_type,
            ignore_case: flag(el, "ignoreCase", true),
            negate: flag(el, "negate", false),
        })
    }

    fn action(&self, el: &Element) -> Result<ActionDef, ParseError> {
        let action_type: ActionType = choice(el, "type");
        let mut def = ActionDef::new(action_type);
        def.url = el.attr("url").unwrap_or_default().to_owned();
        def.append_query_string = flag(el, "appendQueryString", true);
        def.log_rewritten_url = flag(el, "logRewrittenUrl", false);
        def.redirect_type = choice(el, "redirectType");
        def.status_code = self.number(el, "statusCode")?;
        def.sub_status_code = self.number(el, "subStatusCode")?;
        def.status_reason = el.attr("statusReason").map(str::to_owned);
        def.status_description = el.attr("statusDescription").map(str::to_owned);
        Ok(def)
    }
}

/// Read a boolean attribute, falling back to `default` when absent or not
/// `true`/`false`.
fn flag(el: &Element, attribute: &str, default: bool) -> bool {
    match el.attr(attribute) {
        None => default,
        Some(v) if v.trim().eq_ignore_ascii_case("true") => true,
        Some(v) if v.trim().eq_ignore_ascii_case("false") => false,
        Some(v) => {
            warn!(
                element = %el.name,
                attribute,
                value = v,
                default,
                "invalid boolean attribute, using default"
            );
            default
        }
    }
}

/// Read an enum attribute, falling back to the type's default when absent
/// or unknown.
fn choice<T>(el: &Element, attribute: &str) -> T
where
    T: FromStr<Err = UnknownVariant> + Default + Debug,
{
    let Some(raw) = el.attr(attribute) else {
        return T::default();
    };
    raw.trim().parse().unwrap_or_else(|err: UnknownVariant| {
        let default = T::default();
        warn!(
            element = %el.name,
            attribute,
            error = %err,
            default = ?default,
            "invalid attribute value, using default"
        );
        default
    })
}

/// Map a parsed XML tree onto rule definitions.
pub(crate) fn build(root: &Element, source: &str) -> Result<ParsedRuleSet, ParseError> {
    let builder = Builder { source };
    let rewrite = root
        .find("rewrite")
        .ok_or_else(|| ParseError::from(ParseErrorKind::MissingRoot))?;

    let maps = builder.rewrite_maps(rewrite)?;

    let mut rules = Vec::new();
    if let Some(global) = rewrite.child("globalRules") {
        for el in global.children_named("rule") {
            rules.push(builder.rule(el, true)?);
        }
    }
    if let Some(local) = rewrite.child("rules") {
        for el in local.children_named("rule") {
            rules.push(builder.rule(el, false)?);
        }
    }

    Ok(ParsedRuleSet { maps, rules })
}
