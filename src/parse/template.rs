use winnow::combinator::{alt, cut_err, opt, preceded, repeat};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::take_till;

use crate::types::{
    Pattern, PatternSegment, RewriteMaps, ServerVariable, TemplateError, UriMatchPart,
};

const CLOSE_BRACE: StrContext = StrContext::Expected(StrContextValue::CharLiteral('}'));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'i> {
    Literal(&'i str),
    Param {
        name: &'i str,
        arg: Option<Vec<Node<'i>>>,
        /// Input length left at the opening brace.
        remaining: usize,
    },
}

// -- Grammar ----------------------------------------------------------------

fn param<'i>(input: &mut &'i str) -> ModalResult<Node<'i>> {
    let remaining = input.len();
    '{'.parse_next(input)?;
    let name = take_till(0.., |c: char| matches!(c, ':' | '{' | '}')).parse_next(input)?;
    let arg = opt(preceded(':', nested)).parse_next(input)?;
    cut_err('}').context(CLOSE_BRACE).parse_next(input)?;
    Ok(Node::Param {
        name,
        arg,
        remaining,
    })
}

/// Function arguments: a stray `}` closes the call.
fn nested<'i>(input: &mut &'i str) -> ModalResult<Vec<Node<'i>>> {
    repeat(
        0..,
        alt((
            param,
            take_till(1.., |c: char| c == '{' || c == '}').map(Node::Literal),
        )),
    )
    .parse_next(input)
}

/// Top level: a stray `}` is literal text.
fn template<'i>(input: &mut &'i str) -> ModalResult<Vec<Node<'i>>> {
    repeat(
        0..,
        alt((param, take_till(1.., '{').map(Node::Literal))),
    )
    .parse_next(input)
}

// -- Resolution -------------------------------------------------------------

struct Resolver<'a> {
    len: usize,
    maps: &'a RewriteMaps,
    match_part: UriMatchPart,
}

impl Resolver<'_> {
    fn pattern(&self, nodes: Vec<Node<'_>>) -> Result<Pattern, TemplateError> {
        let segments = nodes
            .into_iter()
            .map(|node| self.segment(node))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pattern::new(segments))
    }

    fn segment(&self, node: Node<'_>) -> Result<PatternSegment, TemplateError> {
        let (name, arg, remaining) = match node {
            Node::Literal(text) => return Ok(PatternSegment::Literal(text.to_owned())),
            Node::Param {
                name,
                arg,
                remaining,
            } => (name, arg, remaining),
        };
        let index = self.len - remaining;

        if name.is_empty() {
            return Err(TemplateError::Syntax { index });
        }

        let Some(arg) = arg else {
            return ServerVariable::from_name(name, self.match_part)
                .map(PatternSegment::ServerVariable)
                .ok_or_else(|| TemplateError::UnsupportedServerVariable {
                    name: name.to_owned(),
                });
        };

        if name.eq_ignore_ascii_case("R") || name.eq_ignore_ascii_case("C") {
            let group = back_reference_index(&arg, index, name)?;
            return Ok(if name.eq_ignore_ascii_case("R") {
                PatternSegment::RuleBackReference(group)
            } else {
                PatternSegment::ConditionBackReference(group)
            });
        }

        let inner = self.pattern(arg)?;
        match name.to_ascii_lowercase().as_str() {
            "tolower" => Ok(PatternSegment::ToLower(inner)),
            "urlencode" => Ok(PatternSegment::UrlEncode(inner)),
            _ => match self.maps.get(name) {
                Some(map) => Ok(PatternSegment::RewriteMap {
                    map: map.clone(),
                    key: inner,
                }),
                None => Err(TemplateError::UnknownFunction {
                    name: name.to_owned(),
                }),
            },
        }
    }
}

fn back_reference_index(arg: &[Node<'_>], index: usize, kind: &str) -> Result<usize, TemplateError> {
    let digits = match arg {
        [Node::Literal(text)] => text.trim(),
        _ => "",
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TemplateError::MissingBackReferenceIndex { index });
    }
    let kind = kind.chars().next().map_or('R', |c| c.to_ascii_uppercase());
    let group = digits.parse::<usize>().unwrap_or(usize::MAX);
    if group > 9 {
        return Err(TemplateError::BackReferenceOutOfRange { kind, group });
    }
    Ok(group)
}

/// Parse a condition input or action URL template into a [`Pattern`].
///
/// Rewrite map names are resolved against `maps`; `{URL}` reads the part of
/// the request URL selected by `match_part`.
pub(crate) fn parse_template(
    source: &str,
    maps: &RewriteMaps,
    match_part: UriMatchPart,
) -> Result<Pattern, TemplateError> {
    let nodes = template.parse(source).map_err(|err| {
        let expected_brace = err.inner().context().any(|c| *c == CLOSE_BRACE);
        if expected_brace {
            TemplateError::MissingCloseBrace {
                index: err.offset(),
            }
        } else {
            TemplateError::Syntax {
                index: err.offset(),
            }
        }
    })?;

    Resolver {
        len: source.len(),
        maps,
        match_part,
    }
    .pattern(nodes)
}
