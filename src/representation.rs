use std::fmt;

use super::analysis::{self, AnalysisError, Globals};
use super::expr::Expr;

/// One of possibly several alternative descriptions of a [`Unit`].
///
/// An immutable value type: "updating" a representation means building a new
/// one, never mutating a value another holder can observe.
///
/// [`Unit`]: super::unit::Unit
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    /// An opaque textual description. Never analyzed, and never by itself
    /// sufficient evidence of well-posedness.
    Text(String),

    /// A core expression; a self-contained description iff the expression
    /// is closed.
    Object(Expr),

    /// An ordered composite of parts, all of which must hold up.
    Compound(Vec<Representation>),
}

impl Representation {
    /// Whether `self` is a sufficient, self-contained closed description.
    ///
    /// `Text` is always `false`: prose alone is not evidence. `Object`
    /// defers to the free-variable analysis under an empty scope stack.
    /// `Compound` is a short-circuiting AND over its parts, vacuously true
    /// when empty.
    pub fn is_closed(&self, globals: &impl Globals) -> Result<bool, AnalysisError> {
        match self {
            Self::Text(_) => Ok(false),
            Self::Object(expr) => analysis::is_closed(expr, globals),
            Self::Compound(parts) => {
                for part in parts {
                    if !part.is_closed(globals)? { return Ok(false); }
                }
                Ok(true)
            },
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Object(expr) => expr.fmt(f),
            Self::Compound(parts) => {
                f.write_str("[[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 { f.write_str(" ")?; }
                    part.fmt(f)?;
                }
                f.write_str("]]")
            },
        }
    }
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::analysis::NoGlobals;

    fn closed_object() -> Representation {
        // (lambda (x) x)
        Representation::Object(Expr::Application(vec![
            Expr::identifier("lambda"),
            Expr::Application(vec![Expr::identifier("x")]),
            Expr::identifier("x"),
        ]))
    }

    fn open_object() -> Representation {
        Representation::Object(Expr::identifier("undefined_name"))
    }

    #[test]
    fn text_is_never_closed() {
        let rep = Representation::Text("a perfectly nice description".into());
        assert!(!rep.is_closed(&NoGlobals).unwrap());
    }

    #[test]
    fn object_follows_the_analyzer() {
        assert!(closed_object().is_closed(&NoGlobals).unwrap());
        assert!(!open_object().is_closed(&NoGlobals).unwrap());
    }

    #[test]
    fn empty_compound_is_vacuously_closed() {
        let rep = Representation::Compound(vec![]);
        assert!(rep.is_closed(&NoGlobals).unwrap());
    }

    #[test]
    fn compound_requires_every_part() {
        let rep = Representation::Compound(vec![closed_object(), open_object()]);
        assert!(!rep.is_closed(&NoGlobals).unwrap());
        let rep = Representation::Compound(vec![closed_object(), closed_object()]);
        assert!(rep.is_closed(&NoGlobals).unwrap());
    }

    #[test]
    fn compound_containing_text_is_not_closed() {
        let rep = Representation::Compound(vec![
            Representation::Text("prose".into()),
            closed_object(),
        ]);
        assert!(!rep.is_closed(&NoGlobals).unwrap());
    }
}
