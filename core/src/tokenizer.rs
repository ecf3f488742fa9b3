use crate::index::Term;

/// Split already-normalized text into terms on whitespace.
///
/// Upstream normalization (accent stripping, uppercasing, stopword removal)
/// has happened before text reaches this crate, so tokens are kept verbatim.
pub fn split_terms(text: &str) -> Vec<Term> {
    text.split_whitespace().map(str::to_string).collect()
}
