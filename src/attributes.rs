//! The `KEY=VALUE[,KEY=VALUE…]` attribute-list grammar (spec.md §4.2).

use crate::diagnostics::{self, DISCARDED_ATTRIBUTES_LIST};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, recognize},
    multi::separated_list0,
    sequence::{delimited, separated_pair, terminated, tuple},
    IResult,
};

/// An ordered `NAME → raw value` mapping from one attribute list, quotes
/// stripped and interior text kept verbatim. Order of insertion matches
/// source order; a repeated key keeps its last occurrence's value but its
/// first occurrence's position, mirroring an ordinary overwrite-by-key map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    entries: Vec<(String, String)>,
}

impl AttributeList {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

fn name(i: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while1(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit()),
        take_while(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'),
    )))(i)
}

fn quoted(i: &str) -> IResult<&str, &str> {
    delimited(
        char('"'),
        take_while(|c: char| c != '"' && c != '\r' && c != '\n'),
        char('"'),
    )(i)
}

fn token(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !matches!(c, ',' | '"' | '\r' | '\n' | ' ' | '\t'))(i)
}

fn value(i: &str) -> IResult<&str, &str> {
    alt((quoted, token))(i)
}

fn attr(i: &str) -> IResult<&str, (&str, &str)> {
    delimited(
        multispace0,
        separated_pair(name, char('='), value),
        multispace0,
    )(i)
}

fn attrlist(i: &str) -> IResult<&str, Vec<(&str, &str)>> {
    separated_list0(char(','), attr)(i)
}

/// Parses one complete attribute list. On any grammar violation the entire
/// list is discarded (empty result) and a single warning is emitted; a
/// well-formed empty input returns an empty, un-warned result.
pub fn parse_attributes(input: &str) -> AttributeList {
    if input.trim().is_empty() {
        return AttributeList::default();
    }

    match all_consuming(terminated(attrlist, multispace0))(input) {
        Ok((_, pairs)) => {
            let mut list = AttributeList::default();
            for (k, v) in pairs {
                list.insert(k.to_string(), v.to_string());
            }
            list
        }
        Err(_) => {
            diagnostics::warn(DISCARDED_ATTRIBUTES_LIST);
            AttributeList::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_input_is_empty_no_warn() {
        assert_eq!(parse_attributes(""), AttributeList::default());
    }

    #[test]
    fn single_pair() {
        let attrs = parse_attributes("KEY=VALUE");
        assert_eq!(attrs.get("KEY"), Some("VALUE"));
    }

    #[test]
    fn spaces_around_equals_are_rejected() {
        assert_eq!(parse_attributes("KEY = VALUE"), AttributeList::default());
    }

    #[test]
    fn off_spec_whitespace_around_commas_is_tolerated() {
        let attrs = parse_attributes(r#"A="foo",B=123 , C=VALUE,D=456 "#);
        assert_eq!(attrs.get("A"), Some("foo"));
        assert_eq!(attrs.get("B"), Some("123"));
        assert_eq!(attrs.get("C"), Some("VALUE"));
        assert_eq!(attrs.get("D"), Some("456"));
    }

    #[test]
    fn lowercase_name_is_rejected() {
        assert_eq!(parse_attributes("key=VALUE"), AttributeList::default());
    }

    #[test]
    fn missing_value_is_rejected() {
        assert_eq!(parse_attributes("KEY="), AttributeList::default());
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(parse_attributes(r#"KEY="unterminated"#), AttributeList::default());
    }

    #[test]
    fn glued_attributes_without_comma_are_rejected() {
        assert_eq!(
            parse_attributes(r#"A="foo"B=123"#),
            AttributeList::default()
        );
    }
}
