use crate::error::{Result, VsmError};
use crate::index::InvertedIndex;
use crate::listfmt::{format_id_list, parse_id_list};
use crate::persist::{open_file, split_fields, write_atomically, write_line};
use std::io::BufRead;
use std::path::Path;

/// Read an inverted index of `term;[docId, ...]` rows.
pub fn read_inverted_index(path: &Path) -> Result<InvertedIndex> {
    let reader = open_file(path)?;
    parse_inverted_index(reader, &path.display().to_string())
}

pub fn parse_inverted_index<R: BufRead>(reader: R, source: &str) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    let mut rows = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| VsmError::Io { path: source.into(), source: e })?;
        if line.trim().is_empty() { continue; }
        let fields = split_fields(&line).map_err(|m| VsmError::parse(source, line_no, m))?;
        let [term, ids] = fields.as_slice() else {
            return Err(VsmError::parse(source, line_no, format!("expected 2 fields, got {}", fields.len())));
        };
        let term = term.trim();
        if term.is_empty() {
            return Err(VsmError::parse(source, line_no, "empty term"));
        }
        let doc_ids = parse_id_list(ids).map_err(|m| VsmError::parse(source, line_no, m))?;
        if index.entries.contains_key(term) {
            tracing::warn!(source, line = line_no, term, "term repeated; merging occurrence lists");
        }
        index.add_occurrences(term.to_string(), doc_ids);
        rows += 1;
    }
    tracing::info!(source, rows, terms = index.num_terms(), "read inverted index");
    Ok(index)
}

pub fn write_inverted_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    write_atomically(path, |w| {
        for (term, ids) in &index.entries {
            write_line(w, path, &format!("{};{}", term, format_id_list(ids)))?;
        }
        Ok(())
    })
}
