use crate::index::{Model, Term};
use std::collections::{BTreeSet, HashMap};

/// Sorted set of every term in a model. A term's position is its coordinate
/// in every document and query vector projected against this vocabulary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<Term>,
    positions: HashMap<Term, usize>,
}

impl Vocabulary {
    pub fn from_model(model: &Model) -> Self {
        let sorted: BTreeSet<&Term> = model.docs.values().flat_map(|terms| terms.keys()).collect();
        Self::from_sorted(sorted.into_iter().cloned().collect())
    }

    pub fn from_terms<I: IntoIterator<Item = Term>>(terms: I) -> Self {
        let sorted: BTreeSet<Term> = terms.into_iter().collect();
        Self::from_sorted(sorted.into_iter().collect())
    }

    fn from_sorted(terms: Vec<Term>) -> Self {
        let positions = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, positions }
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn terms(&self) -> &[Term] { &self.terms }

    pub fn position(&self, term: &str) -> Option<usize> { self.positions.get(term).copied() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn terms_are_sorted_and_deduplicated() {
        let mut model = Model::new();
        model.docs.insert(2, BTreeMap::from([("ZINC".to_string(), 0.1), ("ACID".to_string(), 0.2)]));
        model.docs.insert(1, BTreeMap::from([("ACID".to_string(), 0.3), ("BONE".to_string(), 0.4)]));
        let vocab = Vocabulary::from_model(&model);
        assert_eq!(vocab.terms(), ["ACID", "BONE", "ZINC"]);
        assert_eq!(vocab.position("BONE"), Some(1));
        assert_eq!(vocab.position("LUNG"), None);
    }

    #[test]
    fn byte_order_puts_uppercase_first() {
        let vocab = Vocabulary::from_terms(["b".to_string(), "B".to_string(), "A".to_string()]);
        assert_eq!(vocab.terms(), ["A", "B", "b"]);
    }
}
