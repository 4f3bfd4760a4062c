//! Tokenizer for the candidate expression string.
//!
//! The committed expression concatenated with the in-progress token is plain
//! text; this module turns it into tokens the evaluator can run. Display
//! glyphs (`×`, `÷`, `−`) are normalized, identifiers resolve against the
//! function table and the named constants, and implicit multiplication is
//! inserted wherever a value-ending token abuts a value-starting one, so
//! `2(3+4)`, `(3+4)2` and `)(` all read as explicit products.

use tracing::trace;

use crate::errors::{CalcError, CalcResult};
use crate::eval::{Constant, Function, UNARY_MINUS};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    /// Binary operator, or [`UNARY_MINUS`] for negation.
    Op(char),
    Func(Function),
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// A token that can end a value: implicit multiplication applies after it.
    fn ends_value(&self) -> bool {
        matches!(self, Token::Number(_) | Token::RParen)
    }
}

/// True when `-` at this position negates rather than subtracts.
fn unary_position(last: Option<&Token>) -> bool {
    matches!(
        last,
        None | Some(Token::Op(_)) | Some(Token::LParen) | Some(Token::Comma) | Some(Token::Func(_))
    )
}

/// Pushes `token`, inserting a multiplication first when two values abut.
fn push_value(tokens: &mut Vec<Token>, token: Token) {
    if tokens.last().is_some_and(Token::ends_value) {
        tokens.push(Token::Op('*'));
    }
    tokens.push(token);
}

pub fn tokenize(input: &str) -> CalcResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let c = chars[index];
        match c {
            ' ' | '\t' => {
                index += 1;
            }
            '0'..='9' | '.' => {
                let start = index;
                while index < chars.len() && (chars[index].is_ascii_digit() || chars[index] == '.')
                {
                    index += 1;
                }
                let text: String = chars[start..index].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| CalcError::BadNumber(text.clone()))?;
                push_value(&mut tokens, Token::Number(value));
            }
            '(' => {
                push_value(&mut tokens, Token::LParen);
                index += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                index += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                index += 1;
            }
            '+' => {
                // unary plus is a no-op
                if !unary_position(tokens.last()) {
                    tokens.push(Token::Op('+'));
                }
                index += 1;
            }
            '-' | '−' => {
                if unary_position(tokens.last()) {
                    tokens.push(Token::Op(UNARY_MINUS));
                } else {
                    tokens.push(Token::Op('-'));
                }
                index += 1;
            }
            '*' | '×' => {
                tokens.push(Token::Op('*'));
                index += 1;
            }
            '/' | '÷' => {
                tokens.push(Token::Op('/'));
                index += 1;
            }
            '%' | '^' => {
                tokens.push(Token::Op(c));
                index += 1;
            }
            c if c.is_ascii_alphabetic() => {
                let start = index;
                while index < chars.len() && chars[index].is_ascii_alphabetic() {
                    index += 1;
                }
                let name: String = chars[start..index].iter().collect();
                if let Some(func) = Function::from_name(&name) {
                    push_value(&mut tokens, Token::Func(func));
                } else if let Some(constant) = Constant::from_name(&name) {
                    push_value(&mut tokens, Token::Number(constant.value()));
                } else {
                    return Err(CalcError::UnknownName(name));
                }
            }
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }

    trace!(input, ?tokens, "tokenized");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            tokenize("2+3.5").unwrap(),
            vec![Token::Number(2.0), Token::Op('+'), Token::Number(3.5)]
        );
    }

    #[test]
    fn display_glyphs_normalize() {
        assert_eq!(
            tokenize("6×7").unwrap(),
            vec![Token::Number(6.0), Token::Op('*'), Token::Number(7.0)]
        );
        assert_eq!(
            tokenize("8÷2").unwrap(),
            vec![Token::Number(8.0), Token::Op('/'), Token::Number(2.0)]
        );
        assert_eq!(
            tokenize("5−1").unwrap(),
            vec![Token::Number(5.0), Token::Op('-'), Token::Number(1.0)]
        );
    }

    #[test]
    fn implicit_multiplication_insertion() {
        assert_eq!(
            tokenize("2(3").unwrap(),
            vec![
                Token::Number(2.0),
                Token::Op('*'),
                Token::LParen,
                Token::Number(3.0)
            ]
        );
        assert_eq!(
            tokenize(")2").unwrap(),
            vec![Token::RParen, Token::Op('*'), Token::Number(2.0)]
        );
        assert_eq!(
            tokenize(")(").unwrap(),
            vec![Token::RParen, Token::Op('*'), Token::LParen]
        );
        // exactly one multiplication, never two
        assert_eq!(
            tokenize("2sin(").unwrap(),
            vec![
                Token::Number(2.0),
                Token::Op('*'),
                Token::Func(Function::Sin),
                Token::LParen
            ]
        );
    }

    #[test]
    fn unary_minus_detection() {
        assert_eq!(
            tokenize("-5").unwrap(),
            vec![Token::Op(UNARY_MINUS), Token::Number(5.0)]
        );
        assert_eq!(
            tokenize("(-5").unwrap(),
            vec![Token::LParen, Token::Op(UNARY_MINUS), Token::Number(5.0)]
        );
        assert_eq!(
            tokenize("3-5").unwrap(),
            vec![Token::Number(3.0), Token::Op('-'), Token::Number(5.0)]
        );
    }

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(
            tokenize("SIN(").unwrap(),
            vec![Token::Func(Function::Sin), Token::LParen]
        );
        assert_eq!(
            tokenize("PI").unwrap(),
            vec![Token::Number(std::f64::consts::PI)]
        );
        assert_eq!(
            tokenize("bogus(1)"),
            Err(CalcError::UnknownName("bogus".to_string()))
        );
    }

    #[test]
    fn malformed_numbers_fault() {
        assert_eq!(
            tokenize("1.2.3"),
            Err(CalcError::BadNumber("1.2.3".to_string()))
        );
        assert_eq!(tokenize("2+#"), Err(CalcError::UnexpectedChar('#')));
    }
}
