//! Boolean set-algebra search over the inverted index.
//!
//! Queries are whitespace-separated tokens. `И`/`AND`, `ИЛИ`/`OR` and
//! `НЕ`/`NOT` are operators; every other token is a search term,
//! case-folded before lookup. There are no parentheses and no operator
//! precedence: binary operators apply strictly left to right, and `NOT`
//! negates the next term only. Operator tokens issued back to back keep
//! the inherited "last operator before a term wins" behavior.

use crate::corpus::{doc_order_key, DocId};
use crate::index::InvertedIndex;
use std::collections::BTreeSet;

/// Parsed query shape, evaluated recursively against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Not,
}

fn operator(token: &str) -> Option<Op> {
    match token {
        "И" | "AND" => Some(Op::And),
        "ИЛИ" | "OR" => Some(Op::Or),
        "НЕ" | "NOT" => Some(Op::Not),
        _ => None,
    }
}

/// Parse a query into an expression tree, or `None` for a query with no
/// terms. A single left-to-right pass over the tokens keeps an operand
/// stack and one pending-operator slot; the result is the top of the
/// stack, so operands never joined by an operator are discarded.
pub fn parse(query: &str) -> Option<Expr> {
    let mut stack: Vec<Expr> = Vec::new();
    let mut pending: Option<Op> = None;

    for token in query.split_whitespace() {
        if let Some(op) = operator(token) {
            pending = Some(op);
            continue;
        }

        let mut node = Expr::Term(token.to_lowercase());
        if pending == Some(Op::Not) {
            node = Expr::Not(Box::new(node));
            pending = None;
        }
        stack.push(node);

        if let Some(op) = pending {
            if stack.len() >= 2 {
                let right = stack.pop()?;
                let left = stack.pop()?;
                stack.push(match op {
                    Op::And => Expr::And(Box::new(left), Box::new(right)),
                    Op::Or => Expr::Or(Box::new(left), Box::new(right)),
                    // NOT is consumed when the term is read.
                    Op::Not => return None,
                });
                pending = None;
            }
        }
    }

    stack.pop()
}

/// Evaluate an expression against the index. `NOT` complements against
/// `universe`, the set of every document id present in the index.
pub fn eval(expr: &Expr, index: &InvertedIndex, universe: &BTreeSet<DocId>) -> BTreeSet<DocId> {
    match expr {
        Expr::Term(term) => index.postings(term).iter().cloned().collect(),
        Expr::And(left, right) => {
            let left = eval(left, index, universe);
            let right = eval(right, index, universe);
            left.intersection(&right).cloned().collect()
        }
        Expr::Or(left, right) => {
            let left = eval(left, index, universe);
            let right = eval(right, index, universe);
            left.union(&right).cloned().collect()
        }
        Expr::Not(inner) => {
            let inner = eval(inner, index, universe);
            universe.difference(&inner).cloned().collect()
        }
    }
}

/// Run a boolean query end to end: matching document ids in numeric
/// order, empty for an empty or term-less query.
pub fn search(query: &str, index: &InvertedIndex) -> Vec<DocId> {
    let Some(expr) = parse(query) else {
        return Vec::new();
    };
    let universe = index.universe();
    let mut ids: Vec<DocId> = eval(&expr, index, &universe).into_iter().collect();
    ids.sort_by_key(|id| doc_order_key(id));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, Document};

    fn index() -> InvertedIndex {
        // {"cat": [1, 2], "dog": [2, 3]}
        let corpus = Corpus {
            docs: vec![
                Document::new("1", vec!["cat".into()]),
                Document::new("2", vec!["cat".into(), "dog".into()]),
                Document::new("3", vec!["dog".into()]),
            ],
        };
        InvertedIndex::build(&corpus)
    }

    #[test]
    fn and_intersects() {
        assert_eq!(search("cat AND dog", &index()), ["2"]);
    }

    #[test]
    fn or_unions() {
        assert_eq!(search("cat OR dog", &index()), ["1", "2", "3"]);
    }

    #[test]
    fn not_complements_against_universe() {
        assert_eq!(search("NOT cat", &index()), ["3"]);
    }

    #[test]
    fn localized_operators_match_english_ones() {
        let idx = index();
        assert_eq!(search("cat И dog", &idx), search("cat AND dog", &idx));
        assert_eq!(search("cat ИЛИ dog", &idx), search("cat OR dog", &idx));
        assert_eq!(search("НЕ cat", &idx), search("NOT cat", &idx));
    }

    #[test]
    fn terms_are_case_folded() {
        assert_eq!(search("CAT AND Dog", &index()), ["2"]);
    }

    #[test]
    fn unknown_term_is_an_empty_set() {
        assert!(search("bird", &index()).is_empty());
        assert!(search("cat AND bird", &index()).is_empty());
    }

    #[test]
    fn empty_query_yields_no_results() {
        assert!(search("", &index()).is_empty());
        assert!(search("   ", &index()).is_empty());
        assert!(search("AND OR NOT", &index()).is_empty());
    }

    #[test]
    fn binary_operators_apply_left_to_right() {
        // (cat OR dog) AND dog
        assert_eq!(search("cat OR dog AND dog", &index()), ["2", "3"]);
    }

    #[test]
    fn last_operator_before_a_term_wins() {
        // AND is overwritten by NOT before any term is read, so the
        // result is the negated term alone.
        assert_eq!(search("cat AND NOT dog", &index()), ["1"]);
    }

    #[test]
    fn juxtaposed_terms_keep_the_last_one() {
        assert_eq!(search("cat dog", &index()), ["2", "3"]);
    }
}
