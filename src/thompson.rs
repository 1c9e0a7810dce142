use thiserror::Error;

use crate::nfa::{Nfa, Symbol};
use crate::parser::Ast;
use crate::StateId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CompileError {
    #[error("state counter overflow occured")]
    StateOverflow,
}

/// A sub-automaton with one entry and one exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

/// Builds an NFA by Thompson's construction.
///
/// Fresh state IDs come from a single counter, so fragments never share
/// a state and need no renumbering when they are combined.
#[derive(Debug)]
struct Compiler {
    next: StateId,
    nfa: Nfa,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            next: 0,
            nfa: Nfa::new(),
        }
    }
}

impl Compiler {
    fn compile(mut self, ast: &Ast) -> Result<Nfa, CompileError> {
        let fragment = self.expr(ast)?;
        self.nfa
            .set_start(fragment.start)
            .and_then(|()| self.nfa.add_accepting(fragment.accept))
            .map_err(|_| CompileError::StateOverflow)?;
        Ok(self.nfa)
    }

    /// Allocate a fresh state.
    fn state(&mut self) -> Result<StateId, CompileError> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or(CompileError::StateOverflow)?;
        Ok(id)
    }

    fn edge(&mut self, from: StateId, symbol: Symbol, to: StateId) -> Result<(), CompileError> {
        self.nfa
            .add_transition(from, symbol, to)
            .map_err(|_| CompileError::StateOverflow)
    }

    fn pair(&mut self) -> Result<Fragment, CompileError> {
        Ok(Fragment {
            start: self.state()?,
            accept: self.state()?,
        })
    }

    fn expr(&mut self, ast: &Ast) -> Result<Fragment, CompileError> {
        match ast {
            Ast::Char(c) => self.char(*c),
            Ast::Range(from, to) => self.range(*from, *to),
            Ast::Concat(lhs, rhs) => self.concat(lhs, rhs),
            Ast::Or(lhs, rhs) => self.or(lhs, rhs),
            Ast::Question(e) => self.repeat(e, false, true),
            Ast::Star(e) => self.repeat(e, true, true),
            Ast::Plus(e) => self.repeat(e, true, false),
        }
    }

    /// c
    /// ```txt
    /// s --c--> a
    /// ```
    fn char(&mut self, c: char) -> Result<Fragment, CompileError> {
        let f = self.pair()?;
        self.edge(f.start, Symbol::Char(c), f.accept)?;
        Ok(f)
    }

    /// [from-to]
    /// ```txt
    /// s --from..=to--> a
    /// ```
    fn range(&mut self, from: char, to: char) -> Result<Fragment, CompileError> {
        let f = self.pair()?;
        for c in from..=to {
            self.edge(f.start, Symbol::Char(c), f.accept)?;
        }
        Ok(f)
    }

    /// e1e2
    /// ```txt
    /// e1 --ε--> e2
    /// ```
    fn concat(&mut self, lhs: &Ast, rhs: &Ast) -> Result<Fragment, CompileError> {
        let l = self.expr(lhs)?;
        let r = self.expr(rhs)?;
        self.edge(l.accept, Symbol::Epsilon, r.start)?;
        Ok(Fragment {
            start: l.start,
            accept: r.accept,
        })
    }

    /// e1|e2
    /// ```txt
    ///   +--ε--> e1 --ε--+
    /// s                  a
    ///   +--ε--> e2 --ε--+
    /// ```
    fn or(&mut self, lhs: &Ast, rhs: &Ast) -> Result<Fragment, CompileError> {
        let l = self.expr(lhs)?;
        let r = self.expr(rhs)?;
        let f = self.pair()?;
        self.edge(f.start, Symbol::Epsilon, l.start)?;
        self.edge(f.start, Symbol::Epsilon, r.start)?;
        self.edge(l.accept, Symbol::Epsilon, f.accept)?;
        self.edge(r.accept, Symbol::Epsilon, f.accept)?;
        Ok(f)
    }

    /// e?, e* and e+
    /// ```txt
    /// s --ε--> e --ε--> a
    ///  \       ^ |      ^
    ///   \      +-+ (loop: * and +)
    ///    +------ε-------+ (skip: ? and *)
    /// ```
    fn repeat(&mut self, e: &Ast, repeat: bool, skip: bool) -> Result<Fragment, CompileError> {
        let inner = self.expr(e)?;
        let f = self.pair()?;
        self.edge(f.start, Symbol::Epsilon, inner.start)?;
        if skip {
            self.edge(f.start, Symbol::Epsilon, f.accept)?;
        }
        if repeat {
            self.edge(inner.accept, Symbol::Epsilon, inner.start)?;
        }
        self.edge(inner.accept, Symbol::Epsilon, f.accept)?;
        Ok(f)
    }
}

impl Ast {
    /// Compile into an epsilon-NFA by Thompson's construction.
    ///
    /// The NFA has one start and one accepting state, every state is
    /// reachable from the start, and the state count is linear in the size
    /// of the tree.
    pub fn thompson(&self) -> Result<Nfa, CompileError> {
        Compiler::default().compile(self)
    }
}
