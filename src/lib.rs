pub mod expr;
pub use expr::{Atom, Expr, Keyword, KeywordClass, Name};

pub mod analysis;
pub use analysis::{free_variables, is_closed, AnalysisError, Globals, NoGlobals, ScopeStack, Unavailable};

pub mod representation;
pub use representation::Representation;

pub mod unit;
pub use unit::{Unit, UnitGraph, UnitId};

pub mod reader;
pub use reader::{read, ParseError};

pub mod token;
pub use token::{Token, TokenStructure};

pub mod interpreter;
pub use interpreter::{Environment, Interpreter};
