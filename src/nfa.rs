//! Nondeterministic finite automaton with epsilon transitions.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, trace};

use crate::dfa::Dfa;
use crate::{AutomatonError, StateId};

/// Transition label.
///
/// `Epsilon` is its own variant, so no alphabet symbol can collide with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

/// A set of NFA states.
pub type StateSet = BTreeSet<StateId>;

/// An epsilon-NFA over `char` symbols.
///
/// States are the dense range `0..num_states()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    alphabet: BTreeSet<char>,
    num_states: usize,
    start: StateId,
    transitions: BTreeMap<(StateId, Symbol), StateSet>,
    accepting: StateSet,
}

impl Nfa {
    /// Create an NFA with the single start state `0` and no transitions.
    pub fn new() -> Self {
        Self {
            alphabet: BTreeSet::new(),
            num_states: 1,
            start: 0,
            transitions: BTreeMap::new(),
            accepting: StateSet::new(),
        }
    }

    fn ensure_state(&mut self, state: StateId) -> Result<(), AutomatonError> {
        if state >= self.num_states {
            self.num_states = state.checked_add(1).ok_or(AutomatonError::StateOverflow)?;
        }
        Ok(())
    }

    /// Add a transition, growing the state range to cover both ends.
    pub fn add_transition(
        &mut self,
        source: StateId,
        symbol: Symbol,
        destination: StateId,
    ) -> Result<(), AutomatonError> {
        self.ensure_state(source)?;
        self.ensure_state(destination)?;
        if let Symbol::Char(c) = symbol {
            self.alphabet.insert(c);
        }
        self.transitions
            .entry((source, symbol))
            .or_default()
            .insert(destination);
        Ok(())
    }

    pub fn add_epsilon_transition(
        &mut self,
        source: StateId,
        destination: StateId,
    ) -> Result<(), AutomatonError> {
        self.add_transition(source, Symbol::Epsilon, destination)
    }

    fn check_state(&self, state: StateId) -> Result<(), AutomatonError> {
        if state < self.num_states {
            Ok(())
        } else {
            Err(AutomatonError::UnknownState(state))
        }
    }

    pub fn set_start(&mut self, state: StateId) -> Result<(), AutomatonError> {
        self.check_state(state)?;
        self.start = state;
        Ok(())
    }

    /// Mark an existing state as accepting.
    pub fn add_accepting(&mut self, state: StateId) -> Result<(), AutomatonError> {
        self.check_state(state)?;
        self.accepting.insert(state);
        Ok(())
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.num_states
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accepting(&self) -> &StateSet {
        &self.accepting
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    /// Destinations of `state` on `symbol`, empty if there is no such edge.
    pub fn targets(&self, state: StateId, symbol: Symbol) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .get(&(state, symbol))
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    /// All transitions as `(source, symbol, destination)` triples.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, Symbol, StateId)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(&(src, sym), dests)| dests.iter().map(move |&dst| (src, sym, dst)))
    }

    /// States reachable from `state` by zero or more epsilon transitions.
    pub fn epsilon_closure(&self, state: StateId) -> StateSet {
        self.epsilon_closure_of_set(std::iter::once(state))
    }

    /// Union of the epsilon closures of every state in `states`.
    pub fn epsilon_closure_of_set(&self, states: impl IntoIterator<Item = StateId>) -> StateSet {
        let mut closure = StateSet::new();
        let mut stack = states.into_iter().collect::<Vec<_>>();

        while let Some(s) = stack.pop() {
            if !closure.insert(s) {
                continue;
            }
            for dest in self.targets(s, Symbol::Epsilon) {
                if !closure.contains(&dest) {
                    stack.push(dest);
                }
            }
        }

        closure
    }

    /// The closed set of states reached from `states` on `c`.
    pub fn step(&self, states: &StateSet, c: char) -> StateSet {
        let reached = states
            .iter()
            .flat_map(|&s| self.targets(s, Symbol::Char(c)))
            .collect::<Vec<_>>();
        self.epsilon_closure_of_set(reached)
    }

    /// Simulate the NFA on `word` by tracking the set of live states.
    pub fn accept(&self, word: &str) -> bool {
        let mut current = self.epsilon_closure(self.start);
        for c in word.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.step(&current, c);
        }
        current.iter().any(|s| self.accepting.contains(s))
    }

    /// Determinize with the power-set construction.
    ///
    /// The result is total: every subset without a successor on some symbol
    /// goes to a single shared sink, whose origin is the empty subset.
    pub fn subset_construction(&self) -> Dfa {
        let mut dfa = Dfa::new(self.alphabet.iter().copied());
        let mut ids: BTreeMap<StateSet, StateId> = BTreeMap::new();
        let mut worklist = VecDeque::new();

        let initial = self.epsilon_closure(self.start);
        let start = dfa.start();
        dfa.set_accepting_unchecked(start, initial.iter().any(|s| self.is_accepting(*s)));
        dfa.set_origin(start, initial.clone());
        ids.insert(initial.clone(), start);
        worklist.push_back(initial);

        let mut sink = None;

        while let Some(subset) = worklist.pop_front() {
            let from = ids[&subset];
            for &c in &self.alphabet {
                let next = self.step(&subset, c);
                let to = if next.is_empty() {
                    *sink.get_or_insert_with(|| {
                        let sink = dfa.add_state();
                        for &c in &self.alphabet {
                            dfa.set_transition_unchecked(sink, c, sink);
                        }
                        sink
                    })
                } else if let Some(&id) = ids.get(&next) {
                    id
                } else {
                    let id = dfa.add_state();
                    trace!("discovered subset {next:?} as state {id}");
                    dfa.set_accepting_unchecked(id, next.iter().any(|s| self.is_accepting(*s)));
                    dfa.set_origin(id, next.clone());
                    ids.insert(next.clone(), id);
                    worklist.push_back(next);
                    id
                };
                dfa.set_transition_unchecked(from, c, to);
            }
        }

        debug!(
            "subset construction: {} NFA states -> {} DFA states (sink: {})",
            self.num_states,
            dfa.num_states(),
            sink.is_some(),
        );
        dfa
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}
