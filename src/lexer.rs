//! Longest-match tokenizer over prioritized patterns.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, trace};
use thiserror::Error;

use crate::dfa::Dfa;

#[derive(Error, Debug)]
pub enum LexerError {
    #[error("invalid pattern for token `{kind}`")]
    InvalidPattern {
        kind: String,
        #[source]
        source: crate::Error,
    },
}

/// A matched token: its kind and the text it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: impl Into<String>, lexeme: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            lexeme: lexeme.into(),
        }
    }
}

/// Where in the current line lexing got stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// 0-based character offset within the line.
    Char(usize),
    /// The failing character is the last one in the input and is an
    /// alphanumeric character written in some rule's pattern.
    Eof,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Char(n) => write!(f, "{n}"),
            Position::Eof => f.write_str("EOF"),
        }
    }
}

/// Why a lex run failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No viable alternative at character {position}, line {line}")]
pub struct Diagnostic {
    /// Character index of the failure in the whole input.
    pub offset: usize,
    /// Number of newlines before the failure.
    pub line: usize,
    pub position: Position,
}

#[derive(Debug)]
struct Rule {
    kind: String,
    dfa: Dfa,
    live: Vec<bool>,
}

impl Rule {
    /// Length in characters of the longest non-empty prefix of `input`
    /// that this rule matches.
    fn longest_match(&self, input: &[char]) -> Option<usize> {
        let mut state = self.dfa.start();
        let mut best = None;
        for (i, &c) in input.iter().enumerate() {
            match self.dfa.next(state, c) {
                Some(next) if self.live[next] => state = next,
                _ => break,
            }
            if self.dfa.is_accepting(state) {
                best = Some(i + 1);
            }
        }
        best
    }
}

/// A tokenizer built from an ordered list of `(kind, pattern)` rules.
///
/// At every position the longest match wins; among equally long matches
/// the rule declared first wins.
#[derive(Debug)]
pub struct Lexer {
    rules: Vec<Rule>,
    /// Alphanumeric characters written in any rule's pattern. A range
    /// contributes its endpoints only.
    literals: BTreeSet<char>,
}

impl Lexer {
    pub fn new<I, K, P>(rules: I) -> Result<Self, LexerError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: AsRef<str>,
    {
        let mut compiled = Vec::new();
        let mut literals = BTreeSet::new();

        for (kind, pattern) in rules {
            let kind: String = kind.into();
            let pattern = pattern.as_ref();
            let dfa = match crate::compile(pattern) {
                Ok(dfa) => dfa,
                Err(source) => return Err(LexerError::InvalidPattern { kind, source }),
            };
            literals.extend(pattern.chars().filter(|c| c.is_alphanumeric()));
            let live = dfa.live_states();
            compiled.push(Rule { kind, dfa, live });
        }

        debug!("lexer: {} rules", compiled.len());
        Ok(Self {
            rules: compiled,
            literals,
        })
    }

    /// Split `input` into tokens, or report where no rule matches.
    pub fn lex(&self, input: &str) -> Result<Vec<Token>, Diagnostic> {
        let chars = input.chars().collect::<Vec<_>>();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let mut best: Option<(usize, &Rule)> = None;
            for rule in &self.rules {
                if let Some(len) = rule.longest_match(&chars[i..]) {
                    // Strictly longer only: ties go to the earlier rule.
                    if best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, rule));
                    }
                }
            }

            let Some((len, rule)) = best else {
                return Err(self.diagnostic(&chars, i));
            };
            let lexeme = chars[i..i + len].iter().collect::<String>();
            trace!("{} {:?} at {}", rule.kind, lexeme, i);
            tokens.push(Token::new(rule.kind.as_str(), lexeme));
            i += len;
        }

        Ok(tokens)
    }

    /// Like [`Lexer::lex`], but as `(kind, lexeme)` pairs. A failure is a
    /// single pair with an empty kind and the rendered diagnostic.
    pub fn lex_pairs(&self, input: &str) -> Vec<(String, String)> {
        match self.lex(input) {
            Ok(tokens) => tokens.into_iter().map(|t| (t.kind, t.lexeme)).collect(),
            Err(diagnostic) => vec![(String::new(), diagnostic.to_string())],
        }
    }

    fn diagnostic(&self, chars: &[char], offset: usize) -> Diagnostic {
        let consumed = &chars[..offset];
        let line = consumed.iter().filter(|&&c| c == '\n').count();
        let line_start = consumed
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |nl| nl + 1);

        let last = offset + 1 == chars.len();
        let position = if last && self.literals.contains(&chars[offset]) {
            Position::Eof
        } else {
            Position::Char(offset - line_start)
        };

        Diagnostic {
            offset,
            line,
            position,
        }
    }
}
