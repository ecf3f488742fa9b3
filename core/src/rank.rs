//! Brute-force cosine ranking of every model document against each query.
//!
//! Rankings are complete: every document gets a rank, ties on score are broken
//! by ascending document id.

use crate::error::{Result, VsmError};
use crate::index::{Model, Query, RankedEntry, RankedResults, Ranking};
use crate::vector::{dot, l2_norm, project_query, DocumentMatrix};
use crate::vocabulary::Vocabulary;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Cosine similarity of two non-negative vectors, in [0, 1]. Zero when
/// either vector has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    similarity_with_norms(a, l2_norm(a), b, l2_norm(b))
}

fn similarity_with_norms(a: &[f64], norm_a: f64, b: &[f64], norm_b: f64) -> f64 {
    let denom = norm_a * norm_b;
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    let sim = dot(a, b) / denom;
    if sim.is_nan() { 0.0 } else { sim.clamp(0.0, 1.0) }
}

fn by_score_then_id(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// Score `query` against every document and assign ranks 1..=N.
pub fn rank_query(query: &[f64], docs: &DocumentMatrix) -> Ranking {
    let query_norm = l2_norm(query);
    let mut ranking: Ranking = docs
        .doc_ids
        .iter()
        .zip(docs.vectors.iter().zip(&docs.norms))
        .map(|(&doc_id, (v, &norm))| RankedEntry {
            rank: 0,
            doc_id,
            score: similarity_with_norms(query, query_norm, v, norm),
        })
        .collect();
    ranking.sort_by(by_score_then_id);
    for (i, entry) in ranking.iter_mut().enumerate() {
        entry.rank = i + 1;
    }
    ranking
}

/// Rank every document for every query, preserving query order.
pub fn rank_queries(queries: &[Query], model: &Model) -> Result<RankedResults> {
    rank_with_vocabulary(queries, model, &Vocabulary::from_model(model))
}

/// Like [`rank_queries`], for callers that already hold the model's vocabulary.
pub fn rank_with_vocabulary(queries: &[Query], model: &Model, vocab: &Vocabulary) -> Result<RankedResults> {
    if model.num_docs() == 0 {
        return Err(VsmError::Arithmetic("model contains no documents".into()));
    }
    let docs = DocumentMatrix::project(model, vocab);
    tracing::info!(docs = docs.len(), vocabulary = vocab.len(), queries = queries.len(), "projected vector space");

    let results: RankedResults = queries
        .par_iter()
        .map(|q| {
            let qv = project_query(vocab, &q.terms);
            let ranking = rank_query(&qv, &docs);
            tracing::debug!(query = q.id, top_score = ranking.first().map(|e| e.score).unwrap_or(0.0), "ranked query");
            (q.id, ranking)
        })
        .collect();
    tracing::info!(queries = results.len(), "ranked all queries");
    Ok(results)
}
