mod error;
mod grammar;
mod parser;
pub(crate) mod template;

pub use error::{Location, ParseError, ParseErrorKind};
pub use parser::ParsedRuleSet;

/// Parse a rule XML document into a [`ParsedRuleSet`].
///
/// Only the structure is checked here; regexes and templates are compiled
/// by [`RuleSet::from_xml`](crate::RuleSet::from_xml).
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not well-formed XML or lacks a
/// required element or attribute.
pub fn parse(input: &str) -> Result<ParsedRuleSet, ParseError> {
    use winnow::Parser;
    let root = grammar::parse_document.parse(input).map_err(|e| {
        let message = e.inner().to_string();
        let message = if message.is_empty() {
            "unexpected input".to_owned()
        } else {
            message.replace('\n', "; ")
        };
        ParseError::at(
            ParseErrorKind::Syntax(message),
            Location::from_offset(input, e.offset()),
        )
    })?;
    parser::build(&root, input)
}
