//! Dense projection of documents and queries onto a vocabulary.
//!
//! Document coordinates are TF-IDF weights; query coordinates are binary term
//! presence. The two sides are weighted differently on purpose.

use crate::index::{DocId, Model, Term};
use crate::vocabulary::Vocabulary;
use rayon::prelude::*;
use std::collections::BTreeMap;

pub fn project_document(vocab: &Vocabulary, weights: &BTreeMap<Term, f64>) -> Vec<f64> {
    let mut v = vec![0.0; vocab.len()];
    for (term, &w) in weights {
        if let Some(i) = vocab.position(term) {
            v[i] = w;
        }
    }
    v
}

/// 1.0 at every coordinate whose term occurs in `tokens`, else 0.0.
/// Tokens outside the vocabulary are ignored.
pub fn project_query(vocab: &Vocabulary, tokens: &[Term]) -> Vec<f64> {
    let mut v = vec![0.0; vocab.len()];
    for token in tokens {
        if let Some(i) = vocab.position(token) {
            v[i] = 1.0;
        }
    }
    v
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Every model document projected onto one vocabulary, in ascending id order.
#[derive(Debug, Clone)]
pub struct DocumentMatrix {
    pub doc_ids: Vec<DocId>,
    pub vectors: Vec<Vec<f64>>,
    pub norms: Vec<f64>,
}

impl DocumentMatrix {
    pub fn project(model: &Model, vocab: &Vocabulary) -> Self {
        let rows: Vec<(DocId, Vec<f64>, f64)> = model
            .docs
            .par_iter()
            .map(|(&doc_id, weights)| {
                let v = project_document(vocab, weights);
                let norm = l2_norm(&v);
                (doc_id, v, norm)
            })
            .collect();

        let mut m = Self { doc_ids: Vec::with_capacity(rows.len()), vectors: Vec::with_capacity(rows.len()), norms: Vec::with_capacity(rows.len()) };
        for (doc_id, v, norm) in rows {
            m.doc_ids.push(doc_id);
            m.vectors.push(v);
            m.norms.push(norm);
        }
        m
    }

    pub fn len(&self) -> usize { self.doc_ids.len() }

    pub fn is_empty(&self) -> bool { self.doc_ids.is_empty() }
}
