//! Conditional rule expressions gating dependency declarations.
//!
//! Rules are boolean expressions over exactly two symbols: `target` (the
//! build target identifier, compared with `==`/`!=`) and `idf_version` (the
//! toolchain version, compared with the constraint operators). `&&` binds
//! tighter than `||`; parentheses override. Parsing happens once, into an
//! AST; evaluation is pure and takes an explicit environment.

use std::fmt;

use crate::core::env::{BuildEnvironment, EnvError};
use crate::core::version::{parse_version_lenient, ConstraintError};

/// Error evaluating a rule against an incomplete environment.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RuleEvalError(#[from] EnvError);

/// A parsed rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    TargetCmp {
        negated: bool,
        value: String,
    },
    VersionCmp {
        op: VersionOp,
        value: semver::Version,
    },
    And(Box<Rule>, Box<Rule>),
    Or(Box<Rule>, Box<Rule>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl VersionOp {
    fn eval(self, lhs: &semver::Version, rhs: &semver::Version) -> bool {
        match self {
            VersionOp::Eq => lhs == rhs,
            VersionOp::Ne => lhs != rhs,
            VersionOp::Lt => lhs < rhs,
            VersionOp::Le => lhs <= rhs,
            VersionOp::Gt => lhs > rhs,
            VersionOp::Ge => lhs >= rhs,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            VersionOp::Eq => "==",
            VersionOp::Ne => "!=",
            VersionOp::Lt => "<",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Ge => ">=",
        }
    }
}

impl Rule {
    /// Parse a rule expression such as `idf_version >= 5 && target == esp32`.
    pub fn parse(input: &str) -> Result<Self, ConstraintError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            input,
        };
        let rule = parser.parse_or()?;
        if parser.pos != tokens.len() {
            return Err(ConstraintError::InvalidRule(input.to_string()));
        }
        Ok(rule)
    }

    /// Evaluate against an environment. Total for complete environments;
    /// errors only when a referenced symbol is unbound.
    pub fn eval(&self, env: &BuildEnvironment) -> Result<bool, RuleEvalError> {
        match self {
            Rule::TargetCmp { negated, value } => {
                let target = env.require_target(&self.to_string())?;
                Ok((target == value) != *negated)
            }
            Rule::VersionCmp { op, value } => {
                let version = env.require_idf_version(&self.to_string())?;
                Ok(op.eval(version, value))
            }
            Rule::And(a, b) => Ok(a.eval(env)? && b.eval(env)?),
            Rule::Or(a, b) => Ok(a.eval(env)? || b.eval(env)?),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::TargetCmp { negated, value } => {
                write!(f, "target {} {}", if *negated { "!=" } else { "==" }, value)
            }
            Rule::VersionCmp { op, value } => write!(f, "idf_version {} {}", op.as_str(), value),
            Rule::And(a, b) => write!(f, "({a} && {b})"),
            Rule::Or(a, b) => write!(f, "({a} || {b})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Op(String),
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConstraintError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '&' | '|' => {
                chars.next();
                match chars.next() {
                    Some((_, c2)) if c2 == c => tokens.push(if c == '&' {
                        Token::AndAnd
                    } else {
                        Token::OrOr
                    }),
                    _ => return Err(ConstraintError::InvalidRule(input.to_string())),
                }
            }
            '=' | '!' | '<' | '>' => {
                let mut op = String::new();
                op.push(c);
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    op.push('=');
                    chars.next();
                }
                tokens.push(Token::Op(op));
            }
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let start = i;
                let mut end = i;
                while let Some(&(j, c2)) = chars.peek() {
                    if c2.is_ascii_alphanumeric() || c2 == '_' || c2 == '.' || c2 == '-' {
                        end = j + c2.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let word = &input[start..end];
                // Values and identifiers share a shape; the parser sorts
                // them out by position.
                tokens.push(Token::Ident(word.to_string()));
            }
            _ => return Err(ConstraintError::InvalidRule(input.to_string())),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn invalid(&self) -> ConstraintError {
        ConstraintError::InvalidRule(self.input.to_string())
    }

    fn parse_or(&mut self) -> Result<Rule, ConstraintError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::OrOr)) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Rule::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Rule, ConstraintError> {
        let mut lhs = self.parse_atom()?;
        while matches!(self.peek(), Some(Token::AndAnd)) {
            self.bump();
            let rhs = self.parse_atom()?;
            lhs = Rule::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_atom(&mut self) -> Result<Rule, ConstraintError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.bump();
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.invalid()),
                }
            }
            Some(Token::Ident(_)) => self.parse_comparison(),
            _ => Err(self.invalid()),
        }
    }

    fn parse_comparison(&mut self) -> Result<Rule, ConstraintError> {
        let symbol = match self.bump() {
            Some(Token::Ident(s)) => s.clone(),
            _ => return Err(self.invalid()),
        };

        let op = match self.bump() {
            Some(Token::Op(op)) => op.clone(),
            _ => return Err(self.invalid()),
        };

        let value = match self.bump() {
            Some(Token::Ident(v)) => v.clone(),
            _ => return Err(self.invalid()),
        };

        match symbol.as_str() {
            "target" | "idf_target" => {
                let negated = match op.as_str() {
                    "==" | "=" => false,
                    "!=" => true,
                    _ => return Err(self.invalid()),
                };
                Ok(Rule::TargetCmp { negated, value })
            }
            "idf_version" => {
                let op = match op.as_str() {
                    "==" | "=" => VersionOp::Eq,
                    "!=" => VersionOp::Ne,
                    "<" => VersionOp::Lt,
                    "<=" => VersionOp::Le,
                    ">" => VersionOp::Gt,
                    ">=" => VersionOp::Ge,
                    _ => return Err(self.invalid()),
                };
                let value = parse_version_lenient(&value)
                    .ok_or_else(|| ConstraintError::InvalidVersion(value.clone()))?;
                Ok(Rule::VersionCmp { op, value })
            }
            other => Err(ConstraintError::UnknownSymbol(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn env(target: &str, version: &str) -> BuildEnvironment {
        BuildEnvironment::new(target, version.parse().unwrap())
    }

    #[test]
    fn test_target_comparison() {
        let rule = Rule::parse("target == esp32").unwrap();
        assert!(rule.eval(&env("esp32", "5.0.0")).unwrap());
        assert!(!rule.eval(&env("esp32s2", "5.0.0")).unwrap());

        let rule = Rule::parse("target != esp32").unwrap();
        assert!(rule.eval(&env("esp32s2", "5.0.0")).unwrap());
    }

    #[test]
    fn test_version_comparison() {
        let rule = Rule::parse("idf_version >= 5").unwrap();
        assert!(rule.eval(&env("esp32", "5.0.0")).unwrap());
        assert!(rule.eval(&env("esp32", "5.1.2")).unwrap());
        assert!(!rule.eval(&env("esp32", "4.4.4")).unwrap());

        let rule = Rule::parse("idf_version > 4").unwrap();
        assert!(rule.eval(&env("esp32", "5.0.0")).unwrap());
        assert!(!rule.eval(&env("esp32", "3.0.0")).unwrap());
    }

    #[test]
    fn test_precedence_and_parens() {
        // && binds tighter than ||.
        let rule = Rule::parse("target == esp32 || target == esp32s2 && idf_version >= 5").unwrap();
        assert!(rule.eval(&env("esp32", "4.0.0")).unwrap());
        assert!(!rule.eval(&env("esp32s2", "4.0.0")).unwrap());

        let rule =
            Rule::parse("(target == esp32 || target == esp32s2) && idf_version >= 5").unwrap();
        assert!(!rule.eval(&env("esp32", "4.0.0")).unwrap());
        assert!(rule.eval(&env("esp32s2", "5.0.0")).unwrap());
    }

    #[test]
    fn test_unknown_symbol() {
        let err = Rule::parse("chip == esp32").unwrap_err();
        assert!(err.to_string().contains("chip"));
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(Rule::parse("target ==").is_err());
        assert!(Rule::parse("(target == esp32").is_err());
        assert!(Rule::parse("target == esp32 &&").is_err());
        assert!(Rule::parse("target == esp32 extra").is_err());
        assert!(Rule::parse("target < esp32").is_err());
    }

    #[test]
    fn test_missing_symbol_is_hard_error() {
        let rule = Rule::parse("idf_version >= 5").unwrap();
        let unbound = BuildEnvironment::unbound().with_target("esp32");
        assert!(rule.eval(&unbound).is_err());

        // A rule that never touches the version does not need it.
        let rule = Rule::parse("target == esp32").unwrap();
        assert!(rule.eval(&unbound).unwrap());
    }

    #[test]
    fn test_eval_is_pure() {
        let rule = Rule::parse("idf_version >= 5 && target == esp32").unwrap();
        let e = env("esp32", "5.0.0");
        assert!(rule.eval(&e).unwrap());
        assert!(rule.eval(&e).unwrap());
        assert_eq!(
            rule,
            Rule::And(
                Box::new(Rule::VersionCmp {
                    op: VersionOp::Ge,
                    value: Version::new(5, 0, 0)
                }),
                Box::new(Rule::TargetCmp {
                    negated: false,
                    value: "esp32".to_string()
                })
            )
        );
    }
}
