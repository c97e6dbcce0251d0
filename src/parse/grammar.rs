use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, terminated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{take_till, take_until, take_while};

/// An XML element with its attributes and child elements. Text content is
/// not kept; rule files carry everything in attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Input length left at the element's `<`, for error locations.
    pub remaining: usize,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Depth-first search for the first element called `name`, including self.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Byte offset of this element's `<` in a source of `len` bytes.
    pub fn offset(&self, len: usize) -> usize {
        len - self.remaining
    }
}

// -- Whitespace, comments & declarations ------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

fn comment(input: &mut &str) -> ModalResult<()> {
    ("<!--", cut_err(terminated(take_until(0.., "-->"), "-->")))
        .void()
        .context(StrContext::Label("comment"))
        .parse_next(input)
}

fn processing_instruction(input: &mut &str) -> ModalResult<()> {
    ("<?", cut_err(terminated(take_until(0.., "?>"), "?>")))
        .void()
        .parse_next(input)
}

fn doctype(input: &mut &str) -> ModalResult<()> {
    (
        "<!DOCTYPE",
        take_till(0.., |c: char| c == '[' || c == '>'),
        opt(delimited('[', take_until(0.., "]"), ']')),
        take_till(0.., '>'),
        cut_err('>'),
    )
        .void()
        .parse_next(input)
}

fn cdata(input: &mut &str) -> ModalResult<()> {
    ("<![CDATA[", cut_err(terminated(take_until(0.., "]]>"), "]]>")))
        .void()
        .parse_next(input)
}

/// Anything allowed around the root element.
fn misc(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            comment,
            processing_instruction,
            doctype,
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Names & attribute values -----------------------------------------------

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_alphabetic() || c == '_' || c == ':'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)
}

/// Replace the predefined and numeric character references. Unknown
/// references are kept verbatim.
pub(crate) fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn attribute_value(input: &mut &str) -> ModalResult<String> {
    let quote = alt(('"', '\'')).parse_next(input)?;
    let raw = take_till(0.., quote).parse_next(input)?;
    cut_err(quote)
        .context(StrContext::Expected(StrContextValue::Description(
            "closing quote",
        )))
        .parse_next(input)?;
    Ok(decode_entities(raw))
}

fn attribute(input: &mut &str) -> ModalResult<(String, String)> {
    let key = name.parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('=')
        .context(StrContext::Expected(StrContextValue::CharLiteral('=')))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let value = cut_err(attribute_value)
        .context(StrContext::Expected(StrContextValue::Description(
            "attribute value",
        )))
        .parse_next(input)?;
    Ok((key.to_owned(), value))
}

// -- Elements ---------------------------------------------------------------

/// Content between a start and end tag: child elements, with text,
/// comments, CDATA and processing instructions skipped.
fn content(input: &mut &str) -> ModalResult<Vec<Element>> {
    let mut children = Vec::new();
    loop {
        let _ = take_till(0.., '<').parse_next(input)?;
        if input.is_empty() || input.starts_with("</") {
            return Ok(children);
        }
        if input.starts_with("<!--") {
            comment.parse_next(input)?;
        } else if input.starts_with("<![CDATA[") {
            cdata.parse_next(input)?;
        } else if input.starts_with("<?") {
            processing_instruction.parse_next(input)?;
        } else {
            children.push(cut_err(element).parse_next(input)?);
        }
    }
}

fn element(input: &mut &str) -> ModalResult<Element> {
    let remaining = input.len();
    '<'.parse_next(input)?;
    let tag = cut_err(name)
        .context(StrContext::Expected(StrContextValue::Description(
            "element name",
        )))
        .parse_next(input)?;
    let attributes: Vec<(String, String)> =
        repeat(0.., preceded(ws, attribute)).parse_next(input)?;
    ws.parse_next(input)?;

    let self_closing = cut_err(alt(("/>".value(true), ">".value(false))))
        .context(StrContext::Expected(StrContextValue::CharLiteral('>')))
        .parse_next(input)?;

    let children = if self_closing {
        Vec::new()
    } else {
        let children = content.parse_next(input)?;
        cut_err("</")
            .context(StrContext::Label("end tag"))
            .parse_next(input)?;
        let close = cut_err(name).parse_next(input)?;
        if close != tag {
            return Err(ErrMode::from_input(input).cut());
        }
        ws.parse_next(input)?;
        cut_err('>').parse_next(input)?;
        children
    };

    Ok(Element {
        name: tag.to_owned(),
        attributes,
        children,
        remaining,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_document(input: &mut &str) -> ModalResult<Element> {
    let _ = opt('\u{feff}').parse_next(input)?;
    misc.parse_next(input)?;
    let root = cut_err(element)
        .context(StrContext::Label("root element"))
        .parse_next(input)?;
    misc.parse_next(input)?;
    Ok(root)
}
