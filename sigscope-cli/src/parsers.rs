//! Parser for capture dump files.
//!
//! A dump is a sequence of whitespace-separated tokens, where `#` starts a
//! comment running to the end of the line. A token of `0x` and one to eight
//! hex digits is one packed capture word: 32 samples, earliest in the least
//! significant bit. A token made only of `0` and `1` gives one sample per
//! character. The two forms can be mixed freely.

use nom::{IResult, Parser};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Token<'a> {
    Word(u32),
    Levels(&'a [u8]),
    Invalid(&'a [u8]),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub line: usize,
    pub token: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: invalid token {:?}", self.line, self.token)
    }
}

/// Returns the next token after any whitespace and comments, or `None` at
/// the end of the input.
pub(crate) fn next_token<'a>(input: &'a [u8]) -> (Option<Token<'a>>, &'a [u8]) {
    let input = match skip(input) {
        Ok((remain, _)) => remain,
        Err(_) => input,
    };
    if input.is_empty() {
        return (None, input);
    }
    match raw_token(input) {
        Ok((remain, raw)) => (Some(classify(raw)), remain),
        // Only reachable if the input starts with a separator, which `skip`
        // has already consumed.
        Err(_) => (Some(Token::Invalid(input)), &b""[..]),
    }
}

/// Parses a whole dump into one level per sample.
pub fn parse_samples(input: &[u8]) -> Result<Vec<bool>, ParseError> {
    let mut samples = Vec::new();
    let mut remain = input;
    loop {
        let (token, next) = next_token(remain);
        match token {
            None => return Ok(samples),
            Some(Token::Word(w)) => samples.extend((0..32).map(|j| (w >> j) & 1 != 0)),
            Some(Token::Levels(levels)) => samples.extend(levels.iter().map(|b| *b == b'1')),
            Some(Token::Invalid(raw)) => {
                let consumed = input.len() - next.len() - raw.len();
                return Err(ParseError {
                    line: line_at(input, consumed),
                    token: String::from_utf8_lossy(raw).into_owned(),
                });
            }
        }
        remain = next;
    }
}

fn line_at(input: &[u8], offset: usize) -> usize {
    1 + input[..offset].iter().filter(|b| **b == b'\n').count()
}

fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'#'
}

fn comment(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::combinator::recognize(nom::sequence::preceded(
        nom::bytes::complete::tag(&b"#"[..]),
        nom::bytes::complete::take_till(|b| b == b'\n'),
    ))(i)
}

fn skip(i: &[u8]) -> IResult<&[u8], usize> {
    nom::multi::many0_count(nom::branch::alt((
        nom::character::complete::multispace1,
        comment,
    )))(i)
}

fn raw_token(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take_till1(is_separator)(i)
}

fn hex_word(i: &[u8]) -> IResult<&[u8], u32> {
    nom::combinator::all_consuming(nom::sequence::preceded(
        nom::bytes::complete::tag_no_case(&b"0x"[..]),
        nom::combinator::map_opt(
            nom::bytes::complete::take_while_m_n(1, 8, nom::character::is_hex_digit),
            |digits: &[u8]| {
                std::str::from_utf8(digits)
                    .ok()
                    .and_then(|s| u32::from_str_radix(s, 16).ok())
            },
        ),
    ))(i)
}

fn levels(i: &[u8]) -> IResult<&[u8], &[u8]> {
    nom::combinator::all_consuming(nom::bytes::complete::take_while1(|b| {
        b == b'0' || b == b'1'
    }))(i)
}

fn classify(raw: &[u8]) -> Token {
    let token = nom::branch::alt((hex_word.map(Token::Word), levels.map(Token::Levels)))(raw);
    match token {
        Ok((_, token)) => token,
        Err(_) => Token::Invalid(raw),
    }
}
