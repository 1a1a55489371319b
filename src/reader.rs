use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::expr::{Atom, Expr};

/// Why a piece of surface text failed to read as an expression.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected an expression, found end of input")]
    UnexpectedEnd,

    #[error("unbalanced `)`")]
    UnbalancedClose,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("trailing input after expression: `{0}`")]
    TrailingInput(String),
}

/// Reads exactly one expression from `source`.
///
/// The surface syntax is deliberately minimal: `(`…`)` delimits an
/// application, `"…"` and leading-digit tokens read as atoms, and every
/// other token reads as an identifier. Reading never rewrites the tree, so
/// the result is already in the primitive form the analyzer consumes.
pub fn read(source: &str) -> Result<Expr, ParseError> {
    let mut chars = source.chars().peekable();
    let expr = read_expr(&mut chars)?;
    skip_whitespace(&mut chars);
    let rest: String = chars.collect();
    if rest.is_empty() { Ok(expr) } else { Err(ParseError::TrailingInput(rest)) }
}

fn read_expr(chars: &mut Peekable<Chars>) -> Result<Expr, ParseError> {
    skip_whitespace(chars);
    match chars.peek() {
        None => Err(ParseError::UnexpectedEnd),
        Some(')') => Err(ParseError::UnbalancedClose),
        Some('(') => read_application(chars),
        Some('"') => read_string(chars),
        Some(_) => Ok(read_word(chars)),
    }
}

fn read_application(chars: &mut Peekable<Chars>) -> Result<Expr, ParseError> {
    let _ = chars.next(); // the `(`
    let mut elements = Vec::new();
    loop {
        skip_whitespace(chars);
        match chars.peek() {
            None => return Err(ParseError::UnexpectedEnd),
            Some(')') => { let _ = chars.next(); return Ok(Expr::Application(elements)); },
            Some(_) => { elements.push(read_expr(chars)?); },
        }
    }
}

fn read_string(chars: &mut Peekable<Chars>) -> Result<Expr, ParseError> {
    let _ = chars.next(); // the opening `"`
    let mut text = String::new();
    for c in chars {
        if c == '"' { return Ok(Expr::Atom(Atom::Text(text))); }
        text.push(c);
    }
    Err(ParseError::UnterminatedString)
}

fn read_word(chars: &mut Peekable<Chars>) -> Expr {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' { break; }
        word.push(c);
        let _ = chars.next();
    }
    if let Ok(i) = word.parse::<i64>() {
        Expr::Atom(Atom::Int(i))
    } else {
        Expr::Identifier(word.into())
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        let _ = chars.next();
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_identifiers_and_atoms() {
        assert_eq!(read("x"), Ok(Expr::identifier("x")));
        assert_eq!(read("42"), Ok(Expr::Atom(Atom::Int(42))));
        assert_eq!(read("-7"), Ok(Expr::Atom(Atom::Int(-7))));
        assert_eq!(read("\"two words\""), Ok(Expr::Atom(Atom::Text("two words".into()))));
    }

    #[test]
    fn reads_nested_applications() {
        let e = read("(lambda (x) (f x 1))").unwrap();
        assert_eq!(e.to_string(), "(lambda (x) (f x 1))");
    }

    #[test]
    fn empty_list_reads_as_empty_application() {
        assert_eq!(read("()"), Ok(Expr::Application(vec![])));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(read(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(read("(f x"), Err(ParseError::UnexpectedEnd));
        assert_eq!(read(")"), Err(ParseError::UnbalancedClose));
        assert_eq!(read("\"oops"), Err(ParseError::UnterminatedString));
        assert_eq!(read("x y"), Err(ParseError::TrailingInput("y".into())));
    }
}
