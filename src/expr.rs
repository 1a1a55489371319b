use std::fmt;
use std::sync::Arc;

/// Represents an identifier name.
///
/// Names are interned as cheap shared strings so that expression trees and
/// free-variable sets can copy them freely.
// TODO: Represent as a 64-bit integer.
pub type Name = Arc<str>;

// ----------------------------------------------------------------------------

/// A literal value carried by an [`Expr::Atom`].
///
/// Atoms are data, never identifiers; the analyzer ignores them entirely.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(i64),
    Text(String),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(i) => i.fmt(f),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

// ----------------------------------------------------------------------------

/// A core expression, as delivered by the expander.
///
/// The expander guarantees that the only special forms reaching this crate
/// are applications headed by a [`Keyword`]; every other application is a
/// generic combination of sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal.
    Atom(Atom),

    /// A symbolic name, a candidate free variable.
    Identifier(Name),

    /// An ordered sequence: a special form or a generic combination.
    Application(Vec<Expr>),
}

impl Expr {
    /// Makes an `Identifier` from a string.
    pub fn identifier(name: &str) -> Self {
        Self::Identifier(name.into())
    }

    /// The name of `self`, if it is an `Identifier`.
    pub fn as_identifier(&self) -> Option<&Name> {
        if let Self::Identifier(name) = self { Some(name) } else { None }
    }

    /// The [`Keyword`] heading `self`, if `self` is an application whose
    /// first element is a recognized primitive keyword.
    pub fn head_keyword(&self) -> Option<Keyword> {
        let Self::Application(elements) = self else { return None; };
        let name = elements.first()?.as_identifier()?;
        Keyword::from_name(name)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Atom(atom) => atom.fmt(f),
            Self::Identifier(name) => f.write_str(name),
            Self::Application(elements) => {
                f.write_str("(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 { f.write_str(" ")?; }
                    e.fmt(f)?;
                }
                f.write_str(")")
            },
        }
    }
}

// ----------------------------------------------------------------------------

/// The primitive special forms the analyzer recognizes.
///
/// This is a fixed enumeration; the expander conforms to it. Any application
/// headed by anything else is a generic combination.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Keyword {
    Lambda,
    Let,
    LetStar,
    LetRec,
    Parameterize,
    FluidLet,
    Define,
    Set,
    Quote,
    Quasiquote,
}

/// How a [`Keyword`] shapes the scope stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeywordClass {
    /// Binds a parameter list over the remaining body forms.
    Lambda,

    /// Takes a list of bindings, then a body; one flat scope over the body.
    LetLike,

    /// Binds its target (a bare name, or every name in a compound target)
    /// over the remaining forms.
    Define,

    /// Binds the assigned name over the remaining forms.
    Set,

    /// Suppresses analysis of everything inside.
    Quoted,
}

impl Keyword {
    /// Returns the keyword written as `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "lambda" => Self::Lambda,
            "let" => Self::Let,
            "let*" => Self::LetStar,
            "letrec" => Self::LetRec,
            "parameterize" => Self::Parameterize,
            "fluid-let" => Self::FluidLet,
            "define" => Self::Define,
            "set!" => Self::Set,
            "quote" => Self::Quote,
            "quasiquote" => Self::Quasiquote,
            _ => return None,
        })
    }

    /// The source spelling of `self`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::Let => "let",
            Self::LetStar => "let*",
            Self::LetRec => "letrec",
            Self::Parameterize => "parameterize",
            Self::FluidLet => "fluid-let",
            Self::Define => "define",
            Self::Set => "set!",
            Self::Quote => "quote",
            Self::Quasiquote => "quasiquote",
        }
    }

    /// The scope behaviour of `self`.
    pub fn class(self) -> KeywordClass {
        match self {
            Self::Lambda => KeywordClass::Lambda,
            Self::Let | Self::LetStar | Self::LetRec
            | Self::Parameterize | Self::FluidLet => KeywordClass::LetLike,
            Self::Define => KeywordClass::Define,
            Self::Set => KeywordClass::Set,
            Self::Quote | Self::Quasiquote => KeywordClass::Quoted,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

// ----------------------------------------------------------------------------
