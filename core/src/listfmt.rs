//! Parser and serializer for the bracketed list literals embedded in the
//! index and results files, e.g. `[12, 12, 45]` and `[1, 12, 0.89]`.

use crate::index::DocId;

fn strip_brackets(literal: &str) -> Result<&str, String> {
    let trimmed = literal.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("expected a bracketed list, got {trimmed:?}"))
}

fn split_items(inner: &str) -> Result<Vec<&str>, String> {
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            if item.is_empty() { Err("empty list item".to_string()) } else { Ok(item) }
        })
        .collect()
}

fn parse_unsigned<T: std::str::FromStr>(item: &str) -> Result<T, String> {
    if !item.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid integer {item:?}"));
    }
    item.parse::<T>().map_err(|_| format!("integer out of range {item:?}"))
}

pub fn parse_id_list(literal: &str) -> Result<Vec<DocId>, String> {
    let inner = strip_brackets(literal)?;
    split_items(inner)?.into_iter().map(parse_unsigned::<DocId>).collect()
}

pub fn format_id_list(ids: &[DocId]) -> String {
    let items: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Parses `[rank, docId, score]`. The docId may be quoted.
pub fn parse_ranked_triple(literal: &str) -> Result<(usize, DocId, f64), String> {
    let inner = strip_brackets(literal)?;
    let items = split_items(inner)?;
    let [rank, doc_id, score] = items.as_slice() else {
        return Err(format!("expected 3 items, got {}", items.len()));
    };
    let rank = parse_unsigned::<usize>(rank)?;
    let doc_id = parse_unsigned::<DocId>(unquote(doc_id))?;
    let score = parse_score(score)?;
    Ok((rank, doc_id, score))
}

/// The docId is written single-quoted: the evaluator matches it against the
/// textual ids of its relevance file.
pub fn format_ranked_triple(rank: usize, doc_id: DocId, score: f64) -> String {
    format!("[{rank}, '{doc_id}', {score}]")
}

/// Finite float; scientific notation accepted.
pub fn parse_score(item: &str) -> Result<f64, String> {
    let value: f64 = item.trim().parse().map_err(|_| format!("invalid number {item:?}"))?;
    if !value.is_finite() {
        return Err(format!("non-finite number {item:?}"));
    }
    Ok(value)
}

fn unquote(item: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = item.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    item
}
