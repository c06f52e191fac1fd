// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP record tokenizer using nom combinators
//!
//! Both data-section entities (`#12=IFCWALL(...);`) and header records
//! (`FILE_NAME(...);`) share one grammar for their parameter lists.

use ifc_json_model::{AttributeValue, DecodedEntity, EntityId, IfcType};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::borrow::Cow;

/// Raw token from a STEP record (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value, still STEP-encoded
    String(&'a str),
    Integer(i64),
    Float(f64),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to owned AttributeValue, decoding string escapes
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_step_string(s).into_owned()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_string(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

/// Decode the escape sequences of a STEP string literal body
///
/// Handles doubled quotes and backslashes, `\S\` (upper ISO 8859-1 half),
/// `\X\hh` (single 8-bit code), `\X2\...\X0\` (UTF-16) and
/// `\X4\...\X0\` (UTF-32). Code page directives `\Px\` are dropped.
/// Anything malformed is kept verbatim.
pub fn decode_step_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') && !raw.contains('\'') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\\', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("''") {
            out.push('\'');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("\\\\") {
            out.push('\\');
            rest = after;
        } else if let Some((c, after)) = tail.strip_prefix("\\S\\").and_then(decode_upper_half) {
            out.push(c);
            rest = after;
        } else if let Some((s, after)) = tail
            .strip_prefix("\\X2\\")
            .and_then(|a| decode_wide(a, 4))
        {
            out.push_str(&s);
            rest = after;
        } else if let Some((s, after)) = tail
            .strip_prefix("\\X4\\")
            .and_then(|a| decode_wide(a, 8))
        {
            out.push_str(&s);
            rest = after;
        } else if let Some((c, after)) = tail.strip_prefix("\\X\\").and_then(decode_hex_byte) {
            out.push(c);
            rest = after;
        } else if tail.starts_with("\\P") && tail.get(3..4) == Some("\\") {
            rest = &tail[4..];
        } else {
            // lone quote or backslash, both single-byte
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_upper_half(input: &str) -> Option<(char, &str)> {
    let c = input.chars().next()?;
    if !c.is_ascii() {
        return None;
    }
    let shifted = char::from_u32(c as u32 + 128)?;
    Some((shifted, &input[1..]))
}

fn decode_hex_byte(input: &str) -> Option<(char, &str)> {
    let hex = input.get(..2)?;
    let byte = u8::from_str_radix(hex, 16).ok()?;
    Some((char::from(byte), &input[2..]))
}

/// Decode hex groups of `width` digits up to the `\X0\` terminator
fn decode_wide(input: &str, width: usize) -> Option<(String, &str)> {
    let end = input.find("\\X0\\")?;
    let body = &input[..end];
    if body.is_empty() || body.len() % width != 0 || !body.is_ascii() {
        return None;
    }

    let mut codes = Vec::with_capacity(body.len() / width);
    for chunk in body.as_bytes().chunks(width) {
        let digits = std::str::from_utf8(chunk).ok()?;
        codes.push(u32::from_str_radix(digits, 16).ok()?);
    }

    let decoded = if width == 4 {
        let units: Vec<u16> = codes.iter().map(|&c| c as u16).collect();
        String::from_utf16_lossy(&units)
    } else {
        codes
            .into_iter()
            .map(|c| char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    };

    Some((decoded, &input[end + 4..]))
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('#')(input)?;
    let (input, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    let id = digits.parse::<u32>().unwrap_or(0);
    Ok((input, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('\'')(input)?;

    let bytes = input.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }

    if end >= bytes.len() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }

    Ok((&input[end + 1..], Token::String(&input[..end])))
}

/// Parse a number (integer or float)
fn number(input: &str) -> IResult<&str, Token> {
    let (input, num_str) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    if num_str.contains(['.', 'e', 'E']) {
        let f: f64 = lexical_core::parse(num_str.as_bytes())
            .ok()
            .or_else(|| num_str.parse().ok())
            .unwrap_or(0.0);
        Ok((input, Token::Float(f)))
    } else {
        let i: i64 = lexical_core::parse(num_str.as_bytes()).unwrap_or(0);
        Ok((input, Token::Integer(i)))
    }
}

/// Parse an enumeration (.VALUE.)
fn enumeration(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parenthesized, comma separated parameters
fn parameters(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token> {
    let (input, items) = parameters(input)?;
    Ok((input, Token::List(items)))
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token> {
    let (input, type_name) = keyword(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = parameters(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// Record Parsing
// ============================================================================

/// Parse a keyword record `NAME(params...)`, trailing `;` optional
pub fn parse_record(input: &str) -> Result<(&str, Vec<Token<'_>>), String> {
    let input = input.trim_start();
    let (input, name) = keyword(input).map_err(|_| "Expected record keyword".to_string())?;
    let (input, _) = ws(input).unwrap_or((input, ()));
    let (_, tokens) =
        parameters(input).map_err(|e| format!("Failed to parse parameters: {:?}", e))?;
    Ok((name, tokens))
}

/// Parse a complete entity instance
///
/// Format: `#123=IFCWALL(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity, String> {
    let input = input.trim_start();

    let (input, _) = char::<&str, nom::error::Error<&str>>('#')
        .parse(input)
        .map_err(|_| "Expected # at start of entity")?;

    let (input, id_str) = take_while1::<_, &str, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_digit()
    })
    .parse(input)
    .map_err(|_| "Expected entity ID")?;

    let id: u32 = id_str.parse().map_err(|_| "Invalid entity ID")?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| "Expected = after entity ID")?;

    let (type_name, tokens) = parse_record(input)?;

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes: tokens.iter().map(|t| t.to_attribute_value()).collect(),
    })
}

/// Parse the entity stored at the given byte span
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<DecodedEntity, String> {
    let slice = content
        .get(start..end)
        .ok_or_else(|| format!("Span {}..{} out of bounds", start, end))?;
    parse_entity(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string_keeps_raw_body() {
        let (remaining, token) = step_string("'it''s a test',").unwrap();
        assert_eq!(remaining, ",");
        assert_eq!(token, Token::String("it''s a test"));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'never closed").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(number("42").unwrap().1, Token::Integer(42));
        match number("-1.5E-3").unwrap().1 {
            Token::Float(f) => assert!((f + 0.0015).abs() < 1e-12),
            other => panic!("Expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_enum_and_list() {
        assert_eq!(enumeration(".T.").unwrap().1, Token::Enum("T"));
        match list("( 1 , #2 ,'x' )").unwrap().1 {
            Token::List(items) => assert_eq!(items.len(), 3),
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_step_string() {
        assert_eq!(decode_step_string("plain"), "plain");
        assert_eq!(decode_step_string("it''s"), "it's");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("Stra\\X2\\00DF\\X0\\e"), "Straße");
        assert_eq!(decode_step_string("\\X\\E9t\\X\\E9"), "été");
        assert_eq!(decode_step_string("\\S\\i"), "é");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "\u{1F600}");
        assert_eq!(decode_step_string("\\PA\\abc"), "abc");
        assert_eq!(decode_step_string("broken \\X2\\00"), "broken \\X2\\00");
    }

    #[test]
    fn test_parse_entity() {
        let entity = parse_entity("#1=IFCWALL('abc',$,'Mur d''angle',#2);").unwrap();
        assert_eq!(entity.id, EntityId(1));
        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.attributes.len(), 4);
        assert_eq!(entity.name(), Some("Mur d'angle"));
        assert_eq!(entity.get_ref(3), Some(EntityId(2)));
    }

    #[test]
    fn test_parse_header_record() {
        let (name, tokens) =
            parse_record("FILE_SCHEMA(('IFC4'));").unwrap();
        assert_eq!(name, "FILE_SCHEMA");
        assert_eq!(tokens, vec![Token::List(vec![Token::String("IFC4")])]);
    }

    #[test]
    fn test_parse_entity_at_rejects_bad_span() {
        assert!(parse_entity_at("#1=IFCWALL();", 0, 99).is_err());
    }
}
