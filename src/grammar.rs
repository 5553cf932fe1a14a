//! Axiom and production-rule parsing.
//!
//! A [`Symbol`] is one non-digit character followed by any number of digits,
//! so `F`, `F1` and `F2` are three distinct symbols. Rules are written as
//! `LHS=RHS` pairs separated by `;` or newlines.
//!
//! Malformed rule lines never fail a parse. They are dropped, logged, and kept
//! as [`MalformedRule`] diagnostics on the resulting [`Grammar`] so callers can
//! surface them.

use crate::turtle::TurtleOp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single grammar token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The turtle operation this symbol performs when interpreted directly.
    pub fn op(&self) -> TurtleOp {
        TurtleOp::classify(&self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits `text` into symbols.
///
/// Whitespace separates symbols and is otherwise ignored. Digits extend the
/// preceding symbol; a digit run with nothing to attach to is dropped.
pub fn tokenize(text: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    let mut current: Option<String> = None;

    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if let Some(symbol) = current.as_mut() {
                symbol.push(ch);
            }
            continue;
        }
        if let Some(symbol) = current.take() {
            symbols.push(Symbol(symbol));
        }
        if !ch.is_whitespace() {
            current = Some(ch.to_string());
        }
    }
    if let Some(symbol) = current {
        symbols.push(Symbol(symbol));
    }

    symbols
}

/// Why a rule line was dropped or altered.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedReason {
    #[error("missing `=`")]
    MissingSeparator,
    #[error("empty left-hand side")]
    EmptyKey,
    #[error("left-hand side is not a single symbol")]
    CompoundKey,
    #[error("empty replacement")]
    EmptyReplacement,
    /// The rule was kept, but text after the second `=` was discarded.
    #[error("text after a second `=` was ignored")]
    ExtraSeparator,
}

/// A rule line that did not parse cleanly.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("malformed rule #{index} `{text}`: {reason}")]
pub struct MalformedRule {
    /// Zero-based index of the pair within the non-blank rule pairs.
    pub index: usize,
    pub text: String,
    pub reason: MalformedReason,
}

/// An axiom plus its production rules. Immutable once built.
///
/// Equality compares the axiom and rule mapping only; diagnostics are
/// ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Grammar {
    axiom: Vec<Symbol>,
    rules: BTreeMap<Symbol, Vec<Symbol>>,
    #[serde(skip)]
    diagnostics: Vec<MalformedRule>,
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.axiom == other.axiom && self.rules == other.rules
    }
}

impl Grammar {
    /// Parses an axiom and a rule text.
    pub fn parse(axiom_text: &str, rules_text: &str) -> Self {
        let mut rules = BTreeMap::new();
        let mut diagnostics = Vec::new();

        let pairs = rules_text
            .split([';', '\n'])
            .filter(|pair| !pair.trim().is_empty());

        for (index, pair) in pairs.enumerate() {
            let mut reject = |reason: MalformedReason| {
                let rule = MalformedRule {
                    index,
                    text: pair.trim().to_string(),
                    reason,
                };
                tracing::warn!("{rule}");
                diagnostics.push(rule);
            };

            let mut parts = pair.split('=');
            let key = parts.next().unwrap_or_default().trim();
            let Some(value) = parts.next().map(str::trim) else {
                reject(MalformedReason::MissingSeparator);
                continue;
            };
            if key.is_empty() {
                reject(MalformedReason::EmptyKey);
                continue;
            }
            if value.is_empty() {
                reject(MalformedReason::EmptyReplacement);
                continue;
            }

            let mut key_symbols = tokenize(key);
            if key_symbols.len() != 1 {
                reject(MalformedReason::CompoundKey);
                continue;
            }
            if parts.next().is_some() {
                reject(MalformedReason::ExtraSeparator);
            }

            if let Some(symbol) = key_symbols.pop() {
                rules.insert(symbol, tokenize(value));
            }
        }

        Self {
            axiom: tokenize(axiom_text),
            rules,
            diagnostics,
        }
    }

    /// Builds a grammar from already tokenized parts.
    ///
    /// Unlike [`Grammar::parse`] this can express empty replacements.
    pub fn from_parts(
        axiom: Vec<Symbol>,
        rules: impl IntoIterator<Item = (Symbol, Vec<Symbol>)>,
    ) -> Self {
        Self {
            axiom,
            rules: rules.into_iter().collect(),
            diagnostics: Vec::new(),
        }
    }

    pub fn axiom(&self) -> &[Symbol] {
        &self.axiom
    }

    pub fn rules(&self) -> &BTreeMap<Symbol, Vec<Symbol>> {
        &self.rules
    }

    /// The replacement for `symbol`, or `None` if it is terminal.
    pub fn production(&self, symbol: &Symbol) -> Option<&[Symbol]> {
        self.rules.get(symbol).map(Vec::as_slice)
    }

    pub fn has_production(&self, symbol: &Symbol) -> bool {
        self.rules.contains_key(symbol)
    }

    /// Rule lines that were dropped or altered while parsing.
    pub fn diagnostics(&self) -> &[MalformedRule] {
        &self.diagnostics
    }

    /// True when every replacement leaves the branch stack as it found it.
    ///
    /// Each replacement must never pop below its own starting depth and must
    /// end at depth zero, and no bracket symbol may itself be rewritten.
    /// Expansions of such grammars can be traced with a fresh stack per rule.
    pub fn is_bracket_local(&self) -> bool {
        self.rules.iter().all(|(key, replacement)| {
            if matches!(key.op(), TurtleOp::Push | TurtleOp::Pop) {
                return false;
            }
            let mut depth = 0usize;
            for symbol in replacement {
                match symbol.op() {
                    TurtleOp::Push => depth += 1,
                    TurtleOp::Pop => match depth.checked_sub(1) {
                        Some(d) => depth = d,
                        None => return false,
                    },
                    _ => {}
                }
            }
            depth == 0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(Symbol::as_str).collect()
    }

    #[test]
    fn digit_suffixes_stay_with_their_symbol() {
        let symbols = tokenize("F1-F2+F+F12X");
        assert_eq!(
            names(&symbols),
            ["F1", "-", "F2", "+", "F", "+", "F12", "X"]
        );
    }

    #[test]
    fn whitespace_and_orphan_digits_are_skipped() {
        assert_eq!(names(&tokenize(" 12F  f\t+")), ["F", "f", "+"]);
        assert_eq!(names(&tokenize("F 1")), ["F"]);
    }

    #[test]
    fn parses_rules_split_on_semicolon_and_newline() {
        let grammar = Grammar::parse("A", "A=+BF-AFA-FB+; B = -AF+BFB+FA-\n\n");
        assert_eq!(grammar.rules().len(), 2);
        let b = grammar.production(&Symbol::new("B")).unwrap();
        assert_eq!(
            names(b),
            ["-", "A", "F", "+", "B", "F", "B", "+", "F", "A", "-"]
        );
        assert!(grammar.diagnostics().is_empty());
    }

    #[test]
    fn malformed_lines_are_dropped_with_diagnostics() {
        let grammar = Grammar::parse("F", "F=FF;nonsense;=F;X=;AB=F;Y=F=G");
        assert_eq!(grammar.rules().len(), 2);
        let reasons: Vec<_> = grammar
            .diagnostics()
            .iter()
            .map(|d| d.reason.clone())
            .collect();
        assert_eq!(
            reasons,
            [
                MalformedReason::MissingSeparator,
                MalformedReason::EmptyKey,
                MalformedReason::EmptyReplacement,
                MalformedReason::CompoundKey,
                MalformedReason::ExtraSeparator,
            ]
        );
        let y = grammar.production(&Symbol::new("Y")).unwrap();
        assert_eq!(names(y), ["F"]);
    }

    #[test]
    fn later_rule_wins() {
        let grammar = Grammar::parse("F", "F=F+F\nF=F-F");
        assert_eq!(
            names(grammar.production(&Symbol::new("F")).unwrap()),
            ["F", "-", "F"]
        );
    }

    #[test]
    fn equality_ignores_formatting() {
        let a = Grammar::parse("F1", "F1=F1+F2+\nF2=-F1-F2");
        let b = Grammar::parse("F1", " F2 = -F1-F2 ; F1=F1+F2+ ;");
        let c = Grammar::parse("F1", "F1=F1+F2+");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Grammar::parse("F2", "F1=F1+F2+\nF2=-F1-F2"));
    }

    #[test]
    fn bracket_locality() {
        assert!(
            Grammar::parse("F", "F=FF-[-F+F+F]+[+F-F-F]").is_bracket_local()
        );
        assert!(Grammar::parse("]F[", "F=FF").is_bracket_local());
        assert!(!Grammar::parse("F", "F=[F").is_bracket_local());
        assert!(!Grammar::parse("F", "F=]F[").is_bracket_local());
        assert!(!Grammar::parse("[", "[=F").is_bracket_local());
    }
}
