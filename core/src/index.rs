use std::collections::BTreeMap;

pub type Term = String;
pub type DocId = u32;

/// Term -> occurrence list. A document id repeated in a list is a repeated
/// occurrence of the term in that document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    pub entries: BTreeMap<Term, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Appends occurrences for `term`, merging with any earlier row for it.
    pub fn add_occurrences(&mut self, term: Term, doc_ids: impl IntoIterator<Item = DocId>) {
        self.entries.entry(term).or_default().extend(doc_ids);
    }

    pub fn num_terms(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Per-document TF-IDF weights, sorted by document then term.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Model {
    pub docs: BTreeMap<DocId, BTreeMap<Term, f64>>,
}

impl Model {
    pub fn new() -> Self { Self::default() }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_weights(&self) -> usize { self.docs.values().map(|terms| terms.len()).sum() }

    pub fn weight(&self, doc_id: DocId, term: &str) -> Option<f64> {
        self.docs.get(&doc_id).and_then(|terms| terms.get(term)).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub id: u32,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub doc_id: DocId,
    pub score: f64,
}

/// Complete ranking of every model document for one query, rank 1 first.
pub type Ranking = Vec<RankedEntry>;

/// Rankings in query-file order.
pub type RankedResults = Vec<(u32, Ranking)>;
