use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{pair, tuple},
};

use super::{ParseResult, Parser, SyntaxError};
use crate::lexer::TokenKind;
use crate::selector::{AnB, AttributeOp, CombinatorKind, PseudoClass, PseudoFunction, Selector};

impl Parser<'_> {
    /// Parses a comma-separated selector group (e.g. `Button, .primary`).
    ///
    /// `nested` allows `&` and a leading combinator (`> .child`), both of
    /// which refer to the enclosing rule's selector.
    pub(super) fn selector_group(&mut self, nested: bool) -> ParseResult<Selector> {
        let mut alternatives = vec![self.complex_selector(nested)?];
        while self.eat(TokenKind::Comma) {
            alternatives.push(self.complex_selector(nested)?);
        }
        Ok(match alternatives.len() {
            1 => alternatives.remove(0),
            _ => Selector::Group(alternatives),
        })
    }

    /// Parses compound selectors joined by combinators (e.g. `Container > Button`).
    fn complex_selector(&mut self, nested: bool) -> ParseResult<Selector> {
        let mut left = if nested && self.at_combinator() {
            Selector::Parent
        } else {
            self.compound_selector(nested)?
        };

        loop {
            let kind = match self.peek_kind() {
                TokenKind::Greater => CombinatorKind::Child,
                TokenKind::Plus => CombinatorKind::AdjacentSibling,
                TokenKind::Tilde => CombinatorKind::Sibling,
                // Whitespace followed by another compound is a descendant combinator
                _ if self.peek().spaced && self.starts_compound() => CombinatorKind::Descendant,
                _ => return Ok(left),
            };
            if kind != CombinatorKind::Descendant {
                self.advance();
            }
            let right = self.compound_selector(nested)?;
            left = Selector::combinator(kind, left, right);
        }
    }

    fn at_combinator(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Greater | TokenKind::Plus | TokenKind::Tilde
        )
    }

    fn starts_compound(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Ident
                | TokenKind::Star
                | TokenKind::Hash
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::Colon
                | TokenKind::Ampersand
        )
    }

    /// Parses simple selectors that apply to one element (e.g. `Button.primary#submit`).
    fn compound_selector(&mut self, nested: bool) -> ParseResult<Selector> {
        let mut parts = Vec::new();
        match self.peek_kind() {
            TokenKind::Ident => parts.push(Selector::TagName(self.advance().value.into_owned())),
            TokenKind::Star => {
                self.advance();
                parts.push(Selector::MatchAll);
            }
            _ => {}
        }

        loop {
            // Simple selectors of one compound are written without spaces
            if !parts.is_empty() && self.peek().spaced {
                break;
            }
            let part = match self.peek_kind() {
                TokenKind::Ampersand if !nested => {
                    return Err(SyntaxError::syntax(
                        self.peek().location,
                        "'&' is only allowed in nested rules",
                    ));
                }
                TokenKind::Ampersand => {
                    self.advance();
                    Selector::Parent
                }
                TokenKind::Hash => Selector::Id(self.advance().value.into_owned()),
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect(TokenKind::Ident, "class name")?;
                    Selector::ClassName(name.value.into_owned())
                }
                TokenKind::LBracket => self.attribute_selector()?,
                TokenKind::Colon => self.pseudo_selector()?,
                _ => break,
            };
            parts.push(part);
        }

        match parts.len() {
            0 => Err(self.unexpected("a selector")),
            1 => Ok(parts.remove(0)),
            _ => Ok(Selector::Compound(parts)),
        }
    }

    fn attribute_selector(&mut self) -> ParseResult<Selector> {
        self.advance();
        let name = self.expect(TokenKind::Ident, "attribute name")?.value.into_owned();
        let op = match self.peek_kind() {
            TokenKind::RBracket => {
                self.advance();
                return Ok(Selector::Attribute {
                    name,
                    op: AttributeOp::Exists,
                    value: None,
                });
            }
            TokenKind::Equals => AttributeOp::Equals,
            TokenKind::Includes => AttributeOp::Includes,
            TokenKind::DashMatch => AttributeOp::DashMatch,
            TokenKind::PrefixMatch => AttributeOp::Prefix,
            TokenKind::SuffixMatch => AttributeOp::Suffix,
            TokenKind::SubstringMatch => AttributeOp::Substring,
            _ => return Err(self.unexpected("an attribute operator or ']'")),
        };
        self.advance();
        let value = match self.peek_kind() {
            TokenKind::Ident | TokenKind::String => self.advance().value.into_owned(),
            TokenKind::Number(..) => self.advance().text.to_string(),
            _ => return Err(self.unexpected("an attribute value")),
        };
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Selector::Attribute {
            name,
            op,
            value: Some(value),
        })
    }

    fn pseudo_selector(&mut self) -> ParseResult<Selector> {
        self.advance();
        let name_token = self.expect(TokenKind::Ident, "pseudo-class name")?;
        let name = name_token.value.to_ascii_lowercase();

        if !(self.at(TokenKind::LParen) && !self.peek().spaced) {
            return PseudoClass::from_name(&name)
                .map(Selector::PseudoClass)
                .ok_or_else(|| {
                    SyntaxError::semantic(
                        name_token.location,
                        format!("unknown pseudo-class ':{}'", name),
                    )
                });
        }

        self.advance();
        let function = match name.as_str() {
            "nth-child" | "nth-last-child" => {
                let anb = self.anb()?;
                let of = if self.at_keyword("of") {
                    self.advance();
                    Some(Box::new(self.selector_group(false)?))
                } else {
                    None
                };
                if name == "nth-child" {
                    PseudoFunction::NthChild { anb, of }
                } else {
                    PseudoFunction::NthLastChild { anb, of }
                }
            }
            "nth-of-type" => PseudoFunction::NthOfType(self.anb()?),
            "nth-last-of-type" => PseudoFunction::NthLastOfType(self.anb()?),
            "not" => PseudoFunction::Not(Box::new(self.selector_group(false)?)),
            "is" => PseudoFunction::Is(Box::new(self.selector_group(false)?)),
            _ => {
                return Err(SyntaxError::semantic(
                    name_token.location,
                    format!("unknown pseudo-function ':{}()'", name),
                ));
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Selector::PseudoFunction(function))
    }

    /// Reads the raw text of an `an+b` argument, up to `)` or `of`.
    fn anb(&mut self) -> ParseResult<AnB> {
        let location = self.peek().location;
        let mut end = location.offset;
        while !matches!(
            self.peek_kind(),
            TokenKind::RParen | TokenKind::Eof | TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace
        ) && !self.at_keyword("of")
        {
            end = self.advance().end();
        }

        let text = self.source[location.offset..end].trim();
        all_consuming(anb_expr)(text)
            .map(|(_, anb)| anb)
            .map_err(|_| {
                SyntaxError::syntax(location, format!("invalid an+b expression '{}'", text))
            })
    }
}

fn number(input: &str) -> IResult<&str, i32> {
    map_res(digit1, str::parse::<i32>)(input)
}

fn signed_integer(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i32>)(input)
}

/// `an`, `an+b`, `an-b`, `-n+b`, `+n`, ...
fn anb_progression(input: &str) -> IResult<&str, AnB> {
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, step) = opt(number)(input)?;
    let (input, _) = tag_no_case("n")(input)?;
    let (input, offset) = opt(tuple((multispace0, one_of("+-"), multispace0, number)))(input)?;

    let a = step.unwrap_or(1) * if sign == Some('-') { -1 } else { 1 };
    let b = match offset {
        Some((_, '-', _, b)) => -b,
        Some((_, _, _, b)) => b,
        None => 0,
    };
    Ok((input, AnB::new(a, b)))
}

fn anb_expr(input: &str) -> IResult<&str, AnB> {
    alt((
        value(AnB::EVEN, tag_no_case("even")),
        value(AnB::ODD, tag_no_case("odd")),
        anb_progression,
        map(signed_integer, |b| AnB::new(0, b)),
    ))(input)
}
