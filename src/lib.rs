//! Finite automata for lexical analysis.
//!
//! Patterns are parsed into an [`Ast`], compiled into an epsilon-[`Nfa`] by
//! Thompson's construction, determinized into a [`Dfa`] by the subset
//! construction and minimized by table filling. A [`Lexer`] runs a
//! prioritized list of such patterns as a longest-match tokenizer.
//!
//! ```
//! use dfalex::Regex;
//!
//! let re = Regex::new("a*b").unwrap();
//! assert!(re.is_match("aab"));
//! assert!(!re.is_match("ba"));
//! ```

use thiserror::Error;

pub mod dfa;
pub mod lexer;
pub mod nfa;
mod parser;
mod thompson;

pub use dfa::Dfa;
pub use lexer::{Diagnostic, Lexer, LexerError, Position, Token};
pub use nfa::{Nfa, Symbol};
pub use parser::{parse, Ast, ParseError};
pub use thompson::CompileError;

/// Dense state handle, an index into the automaton's tables.
pub type StateId = usize;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Misuse of the automaton building API.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("unknown state {0}")]
    UnknownState(StateId),
    #[error("symbol {0:?} is not in the alphabet")]
    UnknownSymbol(char),
    #[error("state id overflow")]
    StateOverflow,
}

/// Run the whole pipeline: parse, Thompson, subset construction, minimize.
pub(crate) fn compile(pattern: &str) -> Result<Dfa, Error> {
    let nfa = parse(pattern)?.thompson()?;
    Ok(nfa.subset_construction().minimize())
}

/// A compiled pattern that matches whole strings.
#[derive(Debug, Clone)]
pub struct Regex {
    dfa: Dfa,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Ok(Self {
            dfa: compile(pattern)?,
        })
    }

    /// Whether the pattern matches all of `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.dfa.accept(text)
    }

    /// The minimal DFA for this pattern.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }
}
