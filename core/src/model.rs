//! TF-IDF weighting of an inverted index.
//!
//! `tf(t,d)` is the raw count normalized by the most frequent term of `d`, and
//! `idf(t) = ln(N / df(t))`. A term present in every document weighs 0.

use crate::error::{Result, VsmError};
use crate::index::{DocId, InvertedIndex, Model, Term};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Raw counts and document frequencies tallied from an inverted index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CorpusStats {
    pub term_counts: BTreeMap<DocId, BTreeMap<Term, u32>>,
    pub document_frequency: BTreeMap<Term, u32>,
    pub total_documents: u32,
}

impl CorpusStats {
    pub fn tally(index: &InvertedIndex) -> Self {
        let mut term_counts: BTreeMap<DocId, BTreeMap<Term, u32>> = BTreeMap::new();
        let mut document_frequency = BTreeMap::new();
        let mut all_docs = BTreeSet::new();

        for (term, doc_ids) in &index.entries {
            if doc_ids.is_empty() {
                tracing::warn!(term = %term, "term has no occurrences; skipping");
                continue;
            }
            let mut distinct = BTreeSet::new();
            for &doc_id in doc_ids {
                distinct.insert(doc_id);
                *term_counts.entry(doc_id).or_default().entry(term.clone()).or_insert(0) += 1;
            }
            document_frequency.insert(term.clone(), distinct.len() as u32);
            all_docs.extend(distinct);
        }

        Self { term_counts, document_frequency, total_documents: all_docs.len() as u32 }
    }
}

/// Maximum-normalized term frequency, in (0, 1].
pub fn term_frequency(raw: u32, max_raw: u32) -> f64 {
    debug_assert!(raw > 0 && raw <= max_raw);
    raw as f64 / max_raw as f64
}

pub fn inverse_document_frequency(total_documents: u32, document_frequency: u32) -> Result<f64> {
    if total_documents == 0 {
        return Err(VsmError::Arithmetic("empty collection: no documents to weight".into()));
    }
    if document_frequency == 0 {
        return Err(VsmError::Arithmetic("zero document frequency".into()));
    }
    if document_frequency > total_documents {
        return Err(VsmError::Arithmetic(format!(
            "document frequency {document_frequency} exceeds total documents {total_documents}"
        )));
    }
    Ok((total_documents as f64 / document_frequency as f64).ln())
}

fn weigh_document(stats: &CorpusStats, terms: &BTreeMap<Term, u32>) -> Result<BTreeMap<Term, f64>> {
    let Some(&max_raw) = terms.values().max() else {
        return Ok(BTreeMap::new());
    };
    let mut weights = BTreeMap::new();
    for (term, &raw) in terms {
        let df = stats.document_frequency.get(term).copied().unwrap_or(0);
        let idf = inverse_document_frequency(stats.total_documents, df)?;
        weights.insert(term.clone(), term_frequency(raw, max_raw) * idf);
    }
    Ok(weights)
}

/// Build the TF-IDF model. Documents are weighted independently in parallel.
pub fn build_model(index: &InvertedIndex) -> Result<Model> {
    let stats = CorpusStats::tally(index);
    if stats.total_documents == 0 {
        return Err(VsmError::Arithmetic("empty collection: inverted index has no document occurrences".into()));
    }
    tracing::info!(
        docs = stats.total_documents,
        terms = stats.document_frequency.len(),
        "tallied corpus statistics"
    );

    let weighted: Vec<(DocId, BTreeMap<Term, f64>)> = stats
        .term_counts
        .par_iter()
        .map(|(&doc_id, terms)| weigh_document(&stats, terms).map(|w| (doc_id, w)))
        .collect::<Result<_>>()?;

    let model = Model { docs: weighted.into_iter().collect() };
    tracing::info!(docs = model.num_docs(), weights = model.num_weights(), "built tf-idf model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> InvertedIndex {
        // doc1 {A:2,B:1}, doc2 {A:1}, doc3 {B:3}
        let mut index = InvertedIndex::new();
        index.add_occurrences("A".into(), [1, 1, 2]);
        index.add_occurrences("B".into(), [1, 3, 3, 3]);
        index
    }

    #[test]
    fn tally_counts_occurrences_and_distinct_docs() {
        let stats = CorpusStats::tally(&sample_index());
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.document_frequency["A"], 2);
        assert_eq!(stats.document_frequency["B"], 2);
        assert_eq!(stats.term_counts[&1]["A"], 2);
        assert_eq!(stats.term_counts[&3]["B"], 3);
    }

    #[test]
    fn worked_example_weights() {
        let model = build_model(&sample_index()).unwrap();
        let idf = 1.5f64.ln();
        assert!((model.weight(1, "A").unwrap() - idf).abs() < 1e-12);
        assert!((model.weight(1, "B").unwrap() - 0.5 * idf).abs() < 1e-12);
        assert!((model.weight(2, "A").unwrap() - idf).abs() < 1e-12);
        assert!((model.weight(3, "B").unwrap() - idf).abs() < 1e-12);
        assert_eq!(model.weight(2, "B"), None);
    }

    #[test]
    fn max_tf_is_one_per_document() {
        let mut index = sample_index();
        index.add_occurrences("C".into(), [1, 1, 1, 1, 2, 4]);
        let stats = CorpusStats::tally(&index);
        for terms in stats.term_counts.values() {
            let max_raw = *terms.values().max().unwrap();
            let tfs: Vec<f64> = terms.values().map(|&raw| term_frequency(raw, max_raw)).collect();
            assert!(tfs.iter().all(|&tf| tf > 0.0 && tf <= 1.0));
            assert_eq!(tfs.iter().cloned().fold(f64::MIN, f64::max), 1.0);
        }
    }

    #[test]
    fn idf_is_zero_only_when_term_is_everywhere() {
        assert_eq!(inverse_document_frequency(5, 5).unwrap(), 0.0);
        for df in 1..5 {
            assert!(inverse_document_frequency(5, df).unwrap() > 0.0);
        }
        let idfs: Vec<f64> = (1..=5).map(|df| inverse_document_frequency(5, df).unwrap()).collect();
        assert!(idfs.windows(2).all(|w| w[0] > w[1]), "idf must strictly decrease in df");
    }

    #[test]
    fn idf_faults_instead_of_nan() {
        assert!(matches!(inverse_document_frequency(0, 0), Err(VsmError::Arithmetic(_))));
        assert!(matches!(inverse_document_frequency(3, 0), Err(VsmError::Arithmetic(_))));
        assert!(matches!(inverse_document_frequency(3, 4), Err(VsmError::Arithmetic(_))));
    }

    #[test]
    fn empty_index_is_an_arithmetic_fault() {
        assert!(matches!(build_model(&InvertedIndex::new()), Err(VsmError::Arithmetic(_))));
        let mut only_empty = InvertedIndex::new();
        only_empty.add_occurrences("A".into(), Vec::<DocId>::new());
        assert!(matches!(build_model(&only_empty), Err(VsmError::Arithmetic(_))));
    }

    #[test]
    fn ubiquitous_term_weighs_zero_but_document_is_kept() {
        let mut index = InvertedIndex::new();
        index.add_occurrences("COMMON".into(), [1, 2]);
        index.add_occurrences("RARE".into(), [2]);
        let model = build_model(&index).unwrap();
        assert_eq!(model.num_docs(), 2);
        assert_eq!(model.weight(1, "COMMON"), Some(0.0));
        assert!(model.weight(2, "RARE").unwrap() > 0.0);
    }

    #[test]
    fn build_is_deterministic() {
        let a = build_model(&sample_index()).unwrap();
        let b = build_model(&sample_index()).unwrap();
        assert_eq!(a, b);
    }
}
