use thiserror::Error;

/// Regular expression syntax tree.
///
/// Built once by [`parse`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Char(char),
    /// Inclusive range `[from-to]`.
    Range(char, char),
    Concat(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Question(Box<Ast>),
    Star(Box<Ast>),
    Plus(Box<Ast>),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing operand for `{0}`")]
    MissingOperand(char),
    #[error("unclosed parenthesis")]
    UnclosedParenthesis,
    #[error("unexpected parenthesis")]
    UnexpectedParenthesis,
    #[error("unmatched opening bracket `[`")]
    UnmatchedBracket,
    #[error("invalid character range [{0}]")]
    InvalidRange(String),
    #[error("invalid escape character {0:?}")]
    InvalidEscape(char),
    #[error("pattern ends with a backslash")]
    TrailingEscape,
    #[error("unsupported character {0:?}")]
    Unsupported(char),
    #[error("empty expression")]
    Empty,
}

/// Characters that stand for themselves without escaping.
fn is_literal(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':' | '@' | '\n')
}

/// Characters that may follow a backslash.
fn is_escapable(c: char) -> bool {
    matches!(c, ' ' | '(' | ')' | '+' | '*' | '/')
}

/// Fold the operand stack into left-associative concatenations.
fn fold_concat(operands: Vec<Ast>) -> Option<Ast> {
    operands
        .into_iter()
        .reduce(|lhs, rhs| Ast::Concat(Box::new(lhs), Box::new(rhs)))
}

/// Find the index of the `)` closing the group opened just before `chars[0]`.
fn closing_paren(chars: &[char]) -> Result<usize, ParseError> {
    let mut depth = 1usize;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            // Escaped parentheses do not count.
            '\\' => i += 1,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ParseError::UnclosedParenthesis)
}

/// Parse the body of a bracket expression, which must be `x-y`.
fn range(body: &[char]) -> Result<Ast, ParseError> {
    match *body {
        [from, '-', to] if from.is_alphanumeric() && to.is_alphanumeric() && from <= to => {
            Ok(Ast::Range(from, to))
        }
        _ => Err(ParseError::InvalidRange(body.iter().collect())),
    }
}

fn parse_chars(chars: &[char]) -> Result<Ast, ParseError> {
    let mut operands = Vec::new();

    macro_rules! quantifier {
        ($operator:expr, $c:expr) => {
            if let Some(prev_ast) = operands.pop() {
                operands.push($operator(Box::new(prev_ast)));
            } else {
                return Err(ParseError::MissingOperand($c));
            }
        };
    }

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => {}
            '(' => {
                let len = closing_paren(&chars[i + 1..])?;
                operands.push(parse_chars(&chars[i + 1..i + 1 + len])?);
                i += len + 1;
            }
            ')' => return Err(ParseError::UnexpectedParenthesis),
            '[' => {
                let Some(len) = chars[i + 1..].iter().position(|&c| c == ']') else {
                    return Err(ParseError::UnmatchedBracket);
                };
                operands.push(range(&chars[i + 1..i + 1 + len])?);
                i += len + 1;
            }
            '\\' => match chars.get(i + 1) {
                Some(&e) if is_escapable(e) => {
                    operands.push(Ast::Char(e));
                    i += 1;
                }
                Some(&e) => return Err(ParseError::InvalidEscape(e)),
                None => return Err(ParseError::TrailingEscape),
            },
            '?' => quantifier!(Ast::Question, c),
            '*' => quantifier!(Ast::Star, c),
            '+' => quantifier!(Ast::Plus, c),
            '|' => {
                // Lowest precedence: everything scanned so far is the left
                // operand and the whole remainder is the right one.
                let Some(lhs) = fold_concat(operands) else {
                    return Err(ParseError::MissingOperand('|'));
                };
                let rhs = match parse_chars(&chars[i + 1..]) {
                    Err(ParseError::Empty) => return Err(ParseError::MissingOperand('|')),
                    rhs => rhs?,
                };
                return Ok(Ast::Or(Box::new(lhs), Box::new(rhs)));
            }
            c if is_literal(c) => operands.push(Ast::Char(c)),
            c => return Err(ParseError::Unsupported(c)),
        }
        i += 1;
    }

    fold_concat(operands).ok_or(ParseError::Empty)
}

/// Parse a pattern into an abstract syntax tree (AST).
pub fn parse(pattern: &str) -> Result<Ast, ParseError> {
    let chars = pattern.chars().collect::<Vec<_>>();
    parse_chars(&chars)
}

#[cfg(test)]
mod test {
    use super::*;

    fn ch(c: char) -> Box<Ast> {
        Box::new(Ast::Char(c))
    }

    fn cat(lhs: Ast, rhs: Ast) -> Ast {
        Ast::Concat(Box::new(lhs), Box::new(rhs))
    }

    #[test]
    fn concat_or() {
        // Concatenation folds to the left.
        let ast = cat(cat(Ast::Char('a'), Ast::Char('b')), Ast::Char('c'));
        assert_eq!(parse("abc").unwrap(), ast);

        let ast = Ast::Or(ch('a'), Ast::Or(ch('b'), ch('c')).into());
        assert_eq!(parse("a|b|c").unwrap(), ast);

        let ast = Ast::Or(
            cat(cat(Ast::Char('x'), Ast::Char('y')), Ast::Char('z')).into(),
            Ast::Or(ch('b'), ch('c')).into(),
        );
        assert_eq!(parse("xyz|b|c").unwrap(), ast);

        // Error
        assert_eq!(parse("|b"), Err(ParseError::MissingOperand('|')));
        assert_eq!(parse("a|"), Err(ParseError::MissingOperand('|')));
        assert_eq!(parse("|"), Err(ParseError::MissingOperand('|')));

        // Empty expression
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn parenthesis() {
        let ast = cat(
            cat(Ast::Char('a'), Ast::Char('b')),
            Ast::Or(
                cat(Ast::Char('c'), Ast::Char('d')).into(),
                cat(Ast::Char('e'), Ast::Char('f')).into(),
            ),
        );
        assert_eq!(parse("ab(cd|ef)").unwrap(), ast);

        let ast = Ast::Star(Ast::Or(ch('a'), ch('b')).into());
        assert_eq!(parse("(a|b)*").unwrap(), ast);

        // Error
        assert_eq!(parse("(ab"), Err(ParseError::UnclosedParenthesis));
        assert_eq!(parse("ab)"), Err(ParseError::UnexpectedParenthesis));
        assert_eq!(parse("("), Err(ParseError::UnclosedParenthesis));
        assert_eq!(parse(")"), Err(ParseError::UnexpectedParenthesis));

        // Empty expression
        assert_eq!(parse("()"), Err(ParseError::Empty));
    }

    #[test]
    fn escape() {
        assert_eq!(parse(r"\+").unwrap(), Ast::Char('+'));
        assert_eq!(parse(r"\ ").unwrap(), Ast::Char(' '));

        let ast = cat(cat(Ast::Char('*'), Ast::Char('b')), Ast::Char('/'));
        assert_eq!(parse(r"\*b\/").unwrap(), ast);

        // An escaped parenthesis does not close a group.
        let ast = cat(Ast::Char('a'), Ast::Char(')'));
        assert_eq!(parse(r"(a\))").unwrap(), ast);

        // Error
        assert_eq!(parse(r"\a"), Err(ParseError::InvalidEscape('a')));
        assert_eq!(parse(r"\|"), Err(ParseError::InvalidEscape('|')));
        assert_eq!(parse(r"ab\"), Err(ParseError::TrailingEscape));
    }

    #[test]
    fn literals() {
        let ast = cat(
            cat(cat(Ast::Char('@'), Ast::Char('.')), Ast::Char('_')),
            Ast::Char(':'),
        );
        assert_eq!(parse("@._:").unwrap(), ast);
        assert_eq!(parse("\n").unwrap(), Ast::Char('\n'));
        assert_eq!(parse("a b").unwrap(), cat(Ast::Char('a'), Ast::Char('b')));

        assert_eq!(parse("a#"), Err(ParseError::Unsupported('#')));
        assert_eq!(parse("]"), Err(ParseError::Unsupported(']')));
    }

    #[test]
    fn range() {
        assert_eq!(parse("[0-9]").unwrap(), Ast::Range('0', '9'));
        assert_eq!(
            parse("[a-z]+").unwrap(),
            Ast::Plus(Ast::Range('a', 'z').into())
        );

        // Error
        assert_eq!(parse("[a-z"), Err(ParseError::UnmatchedBracket));
        assert_eq!(parse("[az]"), Err(ParseError::InvalidRange("az".into())));
        assert_eq!(parse("[z-a]"), Err(ParseError::InvalidRange("z-a".into())));
        assert_eq!(parse("[a-_]"), Err(ParseError::InvalidRange("a-_".into())));
    }

    #[test]
    fn quantifiers() {
        assert_eq!(parse("a?").unwrap(), Ast::Question(ch('a')));
        assert_eq!(parse("a*b").unwrap(), cat(Ast::Star(ch('a')), Ast::Char('b')));
        assert_eq!(
            parse("a(bc)+").unwrap(),
            cat(
                Ast::Char('a'),
                Ast::Plus(cat(Ast::Char('b'), Ast::Char('c')).into())
            )
        );
        assert_eq!(parse("a**").unwrap(), Ast::Star(Ast::Star(ch('a')).into()));

        // Error
        assert_eq!(parse("?"), Err(ParseError::MissingOperand('?')));
        assert_eq!(parse("*abc"), Err(ParseError::MissingOperand('*')));
        assert_eq!(parse("a|+b"), Err(ParseError::MissingOperand('+')));
    }
}
