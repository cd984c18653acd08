//! Tokenizer for stylesheet and inline-style text.
//!
//! [`Lexer`] is a lazy iterator over [`Token`]s that ends with a single
//! [`TokenKind::Eof`]. It never fails: unrecognized characters, unterminated
//! strings and unterminated comments become [`TokenKind::Error`] tokens so the
//! parser can report them and keep going.
//!
//! Whitespace and comments (`/* ... */` and `// ...`) are not tokens; instead
//! the token that follows them has `spaced` set, which is what the selector
//! parser uses to recognize the descendant combinator.
//!
//! ```
//! use chimera::lexer::{tokenize, TokenKind};
//! use chimera::types::Unit;
//!
//! let tokens = tokenize("padding: 4px;");
//! assert_eq!(tokens[0].kind, TokenKind::Ident);
//! assert_eq!(tokens[2].kind, TokenKind::Number(4.0, Unit::Px));
//! assert!(tokens[2].spaced);
//! ```

use std::borrow::Cow;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, satisfy},
    combinator::{map_res, not, opt, recognize},
    sequence::{pair, preceded, terminated, tuple},
};

use crate::diagnostics::Location;
use crate::types::Unit;

/// What went wrong in an error token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexProblem {
    UnexpectedChar(char),
    UnterminatedString,
    UnterminatedComment,
}

impl LexProblem {
    pub fn message(&self) -> String {
        match self {
            LexProblem::UnexpectedChar(c) => format!("unexpected character '{}'", c.escape_default()),
            LexProblem::UnterminatedString => "unterminated string".to_string(),
            LexProblem::UnterminatedComment => "unterminated comment".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind {
    Ident,
    /// `#name`; an id selector or a hex color depending on context.
    Hash,
    String,
    Number(f32, Unit),
    Dollar,
    Ampersand,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Semicolon,
    Comma,
    Dot,
    Bang,
    Equals,
    /// `~=`
    Includes,
    /// `|=`
    DashMatch,
    /// `^=`
    PrefixMatch,
    /// `$=`
    SuffixMatch,
    /// `*=`
    SubstringMatch,
    Greater,
    Plus,
    Tilde,
    Star,
    Slash,
    Minus,
    Error(LexProblem),
    Eof,
}

/// A lexed token.
#[derive(Clone, Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The raw source slice.
    pub text: &'a str,
    /// Identifier or hash name, or unescaped string contents. Raw text otherwise.
    pub value: Cow<'a, str>,
    pub location: Location,
    /// Whitespace or a comment came before this token.
    pub spaced: bool,
}

impl Token<'_> {
    /// Byte offset one past the end of this token.
    pub fn end(&self) -> usize {
        self.location.offset + self.text.len()
    }

    /// Human readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Identifier: optional leading `-`, then a name-start character or `-`.
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        satisfy(|c| is_name_start(c) || c == '-'),
        take_while(is_name_char),
    )))(input)
}

fn hash_name(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_while1(is_name_char))(input)
}

/// Unit suffix, matched against [`Unit::SUFFIXES`] longest first. A suffix
/// only counts when no further name characters follow it.
fn unit_suffix(input: &str) -> IResult<&str, Unit> {
    for (suffix, unit) in Unit::SUFFIXES {
        let matched: IResult<&str, &str> =
            terminated(tag(suffix), not(satisfy(is_name_start)))(input);
        if let Ok((rest, _)) = matched {
            return Ok((rest, unit));
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

/// Unsigned number with an optional unit suffix. Signs are separate tokens.
fn number_literal(input: &str) -> IResult<&str, (f32, Unit)> {
    let (input, value) = map_res(
        recognize(alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f32>(),
    )(input)?;
    let (input, unit) = opt(unit_suffix)(input)?;
    Ok((input, (value, unit.unwrap_or(Unit::None))))
}

/// Lazy tokenizer over one source text.
///
/// Each lexer owns its cursor, so independent lexers over the same text never
/// interfere with each other.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            done: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn location(&self) -> Location {
        Location::new(self.pos, self.line, self.column)
    }

    fn bump(&mut self, len: usize) {
        for c in self.source[self.pos..self.pos + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }

    fn emit(&mut self, len: usize, kind: TokenKind, spaced: bool) -> Token<'a> {
        let location = self.location();
        let text = &self.source[self.pos..self.pos + len];
        self.bump(len);
        Token {
            kind,
            text,
            value: Cow::Borrowed(text),
            location,
            spaced,
        }
    }

    /// Skips whitespace and comments. Returns whether anything was skipped,
    /// or an error token for an unterminated block comment.
    fn skip_trivia(&mut self) -> Result<bool, Token<'a>> {
        let mut skipped = false;
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            if trimmed.len() != rest.len() {
                self.bump(rest.len() - trimmed.len());
                skipped = true;
                continue;
            }
            if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.bump(end + 4),
                    None => {
                        return Err(self.emit(
                            rest.len(),
                            TokenKind::Error(LexProblem::UnterminatedComment),
                            skipped,
                        ));
                    }
                }
                skipped = true;
                continue;
            }
            if rest.starts_with("//") {
                self.bump(rest.find('\n').unwrap_or(rest.len()));
                skipped = true;
                continue;
            }
            return Ok(skipped);
        }
    }

    fn next_token(&mut self) -> Token<'a> {
        let spaced = match self.skip_trivia() {
            Ok(spaced) => spaced,
            Err(token) => return token,
        };

        let rest = self.rest();
        let mut chars = rest.chars();
        let Some(c) = chars.next() else {
            return self.emit(0, TokenKind::Eof, spaced);
        };
        let next = chars.next();

        if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            if let Ok((after, (value, unit))) = number_literal(rest) {
                return self.emit(rest.len() - after.len(), TokenKind::Number(value, unit), spaced);
            }
        }

        if is_name_start(c) || c == '-' {
            if let Ok((after, name)) = identifier(rest) {
                let mut token = self.emit(rest.len() - after.len(), TokenKind::Ident, spaced);
                token.value = Cow::Borrowed(name);
                return token;
            }
        }

        let followed_by_eq = next == Some('=');
        let (len, kind) = match c {
            '#' => match hash_name(rest) {
                Ok((after, name)) => {
                    let mut token = self.emit(rest.len() - after.len(), TokenKind::Hash, spaced);
                    token.value = Cow::Borrowed(name);
                    return token;
                }
                Err(_) => (1, TokenKind::Error(LexProblem::UnexpectedChar('#'))),
            },
            '"' | '\'' => return self.string(c, spaced),
            '$' if followed_by_eq => (2, TokenKind::SuffixMatch),
            '*' if followed_by_eq => (2, TokenKind::SubstringMatch),
            '~' if followed_by_eq => (2, TokenKind::Includes),
            '|' if followed_by_eq => (2, TokenKind::DashMatch),
            '^' if followed_by_eq => (2, TokenKind::PrefixMatch),
            '$' => (1, TokenKind::Dollar),
            '*' => (1, TokenKind::Star),
            '~' => (1, TokenKind::Tilde),
            '&' => (1, TokenKind::Ampersand),
            '{' => (1, TokenKind::LBrace),
            '}' => (1, TokenKind::RBrace),
            '(' => (1, TokenKind::LParen),
            ')' => (1, TokenKind::RParen),
            '[' => (1, TokenKind::LBracket),
            ']' => (1, TokenKind::RBracket),
            ':' => (1, TokenKind::Colon),
            ';' => (1, TokenKind::Semicolon),
            ',' => (1, TokenKind::Comma),
            '.' => (1, TokenKind::Dot),
            '!' => (1, TokenKind::Bang),
            '=' => (1, TokenKind::Equals),
            '>' => (1, TokenKind::Greater),
            '+' => (1, TokenKind::Plus),
            '/' => (1, TokenKind::Slash),
            '-' => (1, TokenKind::Minus),
            other => (
                other.len_utf8(),
                TokenKind::Error(LexProblem::UnexpectedChar(other)),
            ),
        };
        self.emit(len, kind, spaced)
    }

    /// Lexes a quoted string starting at the current position.
    fn string(&mut self, quote: char, spaced: bool) -> Token<'a> {
        let rest = self.rest();
        let mut value = String::new();
        let mut end = None;
        let mut stop = rest.len();
        let mut chars = rest.char_indices().skip(1).peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                c if c == quote => {
                    end = Some(i + c.len_utf8());
                    break;
                }
                '\n' => {
                    stop = i;
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, h)) if h.is_ascii_hexdigit() => {
                        let mut code = h.to_digit(16).unwrap_or(0);
                        let mut digits = 1;
                        while digits < 6 {
                            match chars.peek() {
                                Some((_, d)) if d.is_ascii_hexdigit() => {
                                    code = code * 16 + d.to_digit(16).unwrap_or(0);
                                    digits += 1;
                                    chars.next();
                                }
                                _ => break,
                            }
                        }
                        if chars.peek().is_some_and(|(_, c)| *c == ' ') {
                            chars.next();
                        }
                        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                c => value.push(c),
            }
        }

        let (len, kind) = match end {
            Some(len) => (len, TokenKind::String),
            None => (stop, TokenKind::Error(LexProblem::UnterminatedString)),
        };
        let mut token = self.emit(len, kind, spaced);
        token.value = Cow::Owned(value);
        token
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

/// Tokenizes a whole source text. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_identifiers_allow_dashes() {
        let tokens = tokenize("padding-left -moz-thing --custom");
        assert_eq!(tokens[0].value, "padding-left");
        assert_eq!(tokens[1].value, "-moz-thing");
        assert_eq!(tokens[2].value, "--custom");
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_numbers_with_units() {
        assert_eq!(
            kinds("4px 50% .5 12deg 3"),
            vec![
                TokenKind::Number(4.0, Unit::Px),
                TokenKind::Number(50.0, Unit::Percent),
                TokenKind::Number(0.5, Unit::None),
                TokenKind::Number(12.0, Unit::Deg),
                TokenKind::Number(3.0, Unit::None),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unit_requires_word_boundary() {
        // "pxa" is not a unit; the number stays unitless and an ident follows
        let tokens = tokenize("4pxa");
        assert_eq!(tokens[0].kind, TokenKind::Number(4.0, Unit::None));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].value, "pxa");
    }

    #[test]
    fn test_unit_then_minus() {
        assert_eq!(
            kinds("4px-2px"),
            vec![
                TokenKind::Number(4.0, Unit::Px),
                TokenKind::Minus,
                TokenKind::Number(2.0, Unit::Px),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        let tokens = tokenize(r#""a\"b" 'c\41 d'"#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "a\"b");
        assert_eq!(tokens[1].value, "cAd");
    }

    #[test]
    fn test_unterminated_string_is_error_token() {
        let tokens = tokenize("\"abc\nx");
        assert_eq!(
            tokens[0].kind,
            TokenKind::Error(LexProblem::UnterminatedString)
        );
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].location.line, 2);
    }

    #[test]
    fn test_unknown_character_continues() {
        assert_eq!(
            kinds("a @ b"),
            vec![
                TokenKind::Ident,
                TokenKind::Error(LexProblem::UnexpectedChar('@')),
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_mark_spacing() {
        let tokens = tokenize("a/* x */b // tail\nc");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[1].spaced);
        assert!(tokens[2].spaced);
        assert_eq!(tokens[2].location.line, 2);
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            kinds("a /* never closed"),
            vec![
                TokenKind::Ident,
                TokenKind::Error(LexProblem::UnterminatedComment),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(
            kinds("~= |= ^= $= *= $ * ~"),
            vec![
                TokenKind::Includes,
                TokenKind::DashMatch,
                TokenKind::PrefixMatch,
                TokenKind::SuffixMatch,
                TokenKind::SubstringMatch,
                TokenKind::Dollar,
                TokenKind::Star,
                TokenKind::Tilde,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hash_and_locations() {
        let tokens = tokenize("div\n  #main");
        assert_eq!(tokens[1].kind, TokenKind::Hash);
        assert_eq!(tokens[1].value, "main");
        assert_eq!(tokens[1].location, Location::new(6, 2, 3));
    }

    #[test]
    fn test_lexers_are_independent() {
        let source = "a b c";
        let mut first = Lexer::new(source);
        let mut second = Lexer::new(source);
        first.next();
        first.next();
        assert_eq!(second.next().map(|t| t.text), Some("a"));
        assert_eq!(first.next().map(|t| t.text), Some("c"));
    }
}
