//! Deterministic finite automaton with table-filling minimization.

use std::collections::VecDeque;

use log::debug;

use crate::nfa::StateSet;
use crate::{AutomatonError, StateId};

/// A deterministic finite automaton over a fixed, sorted alphabet.
///
/// Transitions live in a flat table indexed by
/// `state * alphabet.len() + symbol_index`. A `None` entry is a dead end:
/// simulation rejects as soon as it hits one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Vec<char>,
    start: StateId,
    table: Vec<Option<StateId>>,
    accepting: Vec<bool>,
    /// What each state stands for: an NFA subset after subset construction,
    /// or a class of original states after minimization.
    origins: Vec<StateSet>,
}

impl Dfa {
    /// Create a DFA with a single, non-accepting start state `0`.
    pub fn new(alphabet: impl IntoIterator<Item = char>) -> Self {
        let mut alphabet = alphabet.into_iter().collect::<Vec<_>>();
        alphabet.sort_unstable();
        alphabet.dedup();

        let mut dfa = Self {
            alphabet,
            start: 0,
            table: Vec::new(),
            accepting: Vec::new(),
            origins: Vec::new(),
        };
        dfa.add_state();
        dfa
    }

    /// Add a new state without transitions and return its ID.
    pub fn add_state(&mut self) -> StateId {
        let id = self.accepting.len();
        self.table
            .extend(std::iter::repeat(None).take(self.alphabet.len()));
        self.accepting.push(false);
        self.origins.push(StateSet::new());
        id
    }

    fn check_state(&self, state: StateId) -> Result<(), AutomatonError> {
        if state < self.num_states() {
            Ok(())
        } else {
            Err(AutomatonError::UnknownState(state))
        }
    }

    fn symbol_index(&self, c: char) -> Option<usize> {
        self.alphabet.binary_search(&c).ok()
    }

    pub fn set_start(&mut self, state: StateId) -> Result<(), AutomatonError> {
        self.check_state(state)?;
        self.start = state;
        Ok(())
    }

    pub fn set_accepting(&mut self, state: StateId, accepting: bool) -> Result<(), AutomatonError> {
        self.check_state(state)?;
        self.accepting[state] = accepting;
        Ok(())
    }

    /// Set `δ(source, c) = destination`, replacing any previous edge.
    pub fn add_transition(
        &mut self,
        source: StateId,
        c: char,
        destination: StateId,
    ) -> Result<(), AutomatonError> {
        self.check_state(source)?;
        self.check_state(destination)?;
        let index = self
            .symbol_index(c)
            .ok_or(AutomatonError::UnknownSymbol(c))?;
        self.table[source * self.alphabet.len() + index] = Some(destination);
        Ok(())
    }

    /// Callers guarantee that the state exists.
    pub(crate) fn set_accepting_unchecked(&mut self, state: StateId, accepting: bool) {
        self.accepting[state] = accepting;
    }

    /// Callers guarantee that both states exist; unknown symbols are ignored.
    pub(crate) fn set_transition_unchecked(&mut self, source: StateId, c: char, destination: StateId) {
        if let Some(index) = self.symbol_index(c) {
            self.table[source * self.alphabet.len() + index] = Some(destination);
        }
    }

    pub(crate) fn set_origin(&mut self, state: StateId, origin: StateSet) {
        self.origins[state] = origin;
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn num_states(&self) -> usize {
        self.accepting.len()
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> {
        0..self.num_states()
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.get(state).copied().unwrap_or(false)
    }

    pub fn accepting(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states().filter(|&s| self.accepting[s])
    }

    /// The states this state was built from.
    ///
    /// # Panics
    ///
    /// Panics if `state` is not a state of this DFA.
    pub fn origin(&self, state: StateId) -> &StateSet {
        &self.origins[state]
    }

    /// `δ(state, c)`, or `None` for a dead end or a symbol outside the alphabet.
    pub fn next(&self, state: StateId, c: char) -> Option<StateId> {
        if state >= self.num_states() {
            return None;
        }
        let index = self.symbol_index(c)?;
        self.table[state * self.alphabet.len() + index]
    }

    /// All defined transitions as `(source, symbol, destination)` triples.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, char, StateId)> + '_ {
        let k = self.alphabet.len();
        self.table.iter().enumerate().filter_map(move |(i, dst)| {
            dst.map(|dst| (i / k, self.alphabet[i % k], dst))
        })
    }

    /// Whether every state has a transition on every symbol.
    pub fn is_total(&self) -> bool {
        self.table.iter().all(Option::is_some)
    }

    /// Run the DFA on `word`; an undefined transition rejects the word.
    pub fn accept(&self, word: &str) -> bool {
        let mut state = self.start;
        for c in word.chars() {
            match self.next(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accepting(state)
    }

    /// For each state, whether some accepting state is reachable from it.
    pub fn live_states(&self) -> Vec<bool> {
        let n = self.num_states();
        let mut reverse = vec![Vec::new(); n];
        for (src, _, dst) in self.transitions() {
            reverse[dst].push(src);
        }

        let mut live = self.accepting.clone();
        let mut queue = self.accepting().collect::<VecDeque<_>>();
        while let Some(state) = queue.pop_front() {
            for &pred in &reverse[state] {
                if !live[pred] {
                    live[pred] = true;
                    queue.push_back(pred);
                }
            }
        }
        live
    }

    /// Minimize with the table-filling algorithm.
    ///
    /// Each state of the result stands for a class of equivalent states of
    /// `self`; [`Dfa::origin`] returns that class.
    pub fn minimize(&self) -> Dfa {
        let n = self.num_states();
        let k = self.alphabet.len();

        // marked[p * n + q]: p and q are distinguishable. Kept symmetric.
        let mut marked = vec![false; n * n];
        for p in 0..n {
            for q in 0..p {
                if self.accepting[p] != self.accepting[q] {
                    marked[p * n + q] = true;
                    marked[q * n + p] = true;
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for p in 0..n {
                for q in 0..p {
                    if marked[p * n + q] {
                        continue;
                    }
                    let distinct = (0..k).any(|a| {
                        match (self.table[p * k + a], self.table[q * k + a]) {
                            (Some(x), Some(y)) => marked[x * n + y],
                            (None, None) => false,
                            _ => true,
                        }
                    });
                    if distinct {
                        marked[p * n + q] = true;
                        marked[q * n + p] = true;
                        changed = true;
                    }
                }
            }
        }

        // Unmarked is an equivalence at the fixed point, so grouping each
        // state with its unmarked successors in ID order is enough.
        let mut class_of = vec![None; n];
        let mut classes: Vec<StateSet> = Vec::new();
        for p in 0..n {
            if class_of[p].is_some() {
                continue;
            }
            let id = classes.len();
            let mut class = StateSet::new();
            for q in p..n {
                if class_of[q].is_none() && !marked[p * n + q] {
                    class_of[q] = Some(id);
                    class.insert(q);
                }
            }
            classes.push(class);
        }
        let class_of = class_of.into_iter().flatten().collect::<Vec<_>>();

        let mut minimized = Dfa::new(self.alphabet.iter().copied());
        for _ in 1..classes.len() {
            minimized.add_state();
        }
        minimized.start = class_of[self.start];
        for (id, class) in classes.into_iter().enumerate() {
            if let Some(&rep) = class.iter().next() {
                for a in 0..k {
                    minimized.table[id * k + a] = self.table[rep * k + a].map(|t| class_of[t]);
                }
                minimized.accepting[id] = self.accepting[rep];
            }
            minimized.origins[id] = class;
        }

        debug!("minimization: {} -> {} states", n, minimized.num_states());
        minimized
    }

    /// Whether `other` is this DFA up to a renaming of states.
    ///
    /// Only states reachable from the start are matched, so both automata
    /// must have no unreachable states for a positive answer.
    pub fn is_isomorphic(&self, other: &Dfa) -> bool {
        if self.alphabet != other.alphabet || self.num_states() != other.num_states() {
            return false;
        }

        let mut forward = vec![None; self.num_states()];
        let mut backward = vec![None; other.num_states()];
        let mut queue = VecDeque::from([(self.start, other.start)]);
        forward[self.start] = Some(other.start);
        backward[other.start] = Some(self.start);

        while let Some((p, q)) = queue.pop_front() {
            if self.accepting[p] != other.accepting[q] {
                return false;
            }
            for &c in &self.alphabet {
                match (self.next(p, c), other.next(q, c)) {
                    (None, None) => {}
                    (Some(x), Some(y)) => match (forward[x], backward[y]) {
                        (None, None) => {
                            forward[x] = Some(y);
                            backward[y] = Some(x);
                            queue.push_back((x, y));
                        }
                        (Some(fx), Some(by)) if fx == y && by == x => {}
                        _ => return false,
                    },
                    _ => return false,
                }
            }
        }

        forward.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// 0 -a-> 1 -b-> 3, 0 -b-> 2 -b-> 4; 3 and 4 accepting.
    fn redundant() -> Dfa {
        let mut dfa = Dfa::new(['a', 'b']);
        for _ in 0..4 {
            dfa.add_state();
        }
        dfa.set_accepting(3, true).unwrap();
        dfa.set_accepting(4, true).unwrap();
        dfa.add_transition(0, 'a', 1).unwrap();
        dfa.add_transition(0, 'b', 2).unwrap();
        dfa.add_transition(1, 'b', 3).unwrap();
        dfa.add_transition(2, 'b', 4).unwrap();
        dfa
    }

    #[test]
    fn accept_partial() {
        let dfa = redundant();
        assert!(dfa.accept("ab"));
        assert!(dfa.accept("bb"));
        assert!(!dfa.accept("a"));
        assert!(!dfa.accept("aa"));
        assert!(!dfa.accept("abb"));
        // Outside the alphabet.
        assert!(!dfa.accept("xb"));
        assert!(!dfa.is_total());
    }

    #[test]
    fn accept_without_transitions() {
        let mut dfa = Dfa::new(['x']);
        dfa.set_accepting(0, true).unwrap();
        assert!(dfa.accept(""));
        assert!(!dfa.accept("x"));
    }

    #[test]
    fn builder_errors() {
        let mut dfa = Dfa::new(['a']);
        assert_eq!(dfa.add_transition(0, 'b', 0), Err(AutomatonError::UnknownSymbol('b')));
        assert_eq!(dfa.add_transition(0, 'a', 1), Err(AutomatonError::UnknownState(1)));
        assert_eq!(dfa.set_start(2), Err(AutomatonError::UnknownState(2)));
        assert_eq!(dfa.set_accepting(5, true), Err(AutomatonError::UnknownState(5)));
    }

    #[test]
    fn transitions() {
        let dfa = redundant();
        let mut edges = dfa.transitions().collect::<Vec<_>>();
        edges.sort_unstable();
        assert_eq!(
            edges,
            vec![(0, 'a', 1), (0, 'b', 2), (1, 'b', 3), (2, 'b', 4)]
        );
    }

    #[test]
    fn live_states() {
        let mut dfa = redundant();
        let dead = dfa.add_state();
        dfa.add_transition(0, 'a', 1).unwrap();
        dfa.add_transition(3, 'a', dead).unwrap();
        dfa.add_transition(dead, 'a', dead).unwrap();
        assert_eq!(dfa.live_states(), vec![true, true, true, true, true, false]);
    }

    #[test]
    fn minimize_merges_equivalent_states() {
        let dfa = redundant();
        let min = dfa.minimize();

        // {0}, {1, 2}, {3, 4}
        assert_eq!(min.num_states(), 3);
        assert_eq!(min.origin(min.start()), &StateSet::from([0]));
        let classes = min.states().map(|s| min.origin(s).clone()).collect::<Vec<_>>();
        assert!(classes.contains(&StateSet::from([1, 2])));
        assert!(classes.contains(&StateSet::from([3, 4])));

        for word in ["ab", "bb", "", "a", "b", "abb", "ba"] {
            assert_eq!(min.accept(word), dfa.accept(word), "{word:?}");
        }
    }

    #[test]
    fn minimize_missing_transition_distinguishes() {
        // 1 and 2 are both non-accepting, but only 1 can go on.
        let mut dfa = Dfa::new(['a']);
        dfa.add_state();
        dfa.add_state();
        dfa.add_state();
        dfa.add_transition(0, 'a', 1).unwrap();
        dfa.add_transition(1, 'a', 3).unwrap();
        dfa.set_accepting(3, true).unwrap();
        let min = dfa.minimize();
        assert_eq!(min.num_states(), 4);
    }

    #[test]
    fn minimize_classes_agree_on_acceptance() {
        let min = redundant().minimize();
        let original = redundant();
        for s in min.states() {
            let class = min.origin(s);
            assert!(class
                .iter()
                .all(|&q| original.is_accepting(q) == min.is_accepting(s)));
        }
    }

    #[test]
    fn minimize_idempotent() {
        let once = redundant().minimize();
        let twice = once.minimize();
        assert_eq!(once.num_states(), twice.num_states());
        assert!(once.is_isomorphic(&twice));
    }

    #[test]
    fn isomorphism() {
        let mut a = Dfa::new(['a']);
        a.add_state();
        a.add_transition(0, 'a', 1).unwrap();
        a.set_accepting(1, true).unwrap();

        // Same automaton with the states swapped.
        let mut b = Dfa::new(['a']);
        b.add_state();
        b.set_start(1).unwrap();
        b.add_transition(1, 'a', 0).unwrap();
        b.set_accepting(0, true).unwrap();
        assert!(a.is_isomorphic(&b));

        b.set_accepting(1, true).unwrap();
        assert!(!a.is_isomorphic(&b));
    }
}
