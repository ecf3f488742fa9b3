//! `;`-delimited file formats for the model snapshot, query set and ranked
//! results, plus the JSON meta sidecar written next to the model.

use crate::error::{Result, VsmError};
use crate::index::{DocId, Model, Query, RankedEntry, RankedResults};
use crate::listfmt::{format_ranked_triple, parse_ranked_triple, parse_score};
use crate::tokenizer::split_terms;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const QUERY_HEADER: &str = "QueryNumber;QueryText";
pub const META_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub(crate) fn open_file(path: &Path) -> Result<BufReader<File>> {
    let f = File::open(path).map_err(|e| VsmError::from_io(path, e))?;
    Ok(BufReader::new(f))
}

/// Writes `path` through a temp file in the same directory, renamed into
/// place only once `body` and the flush succeed.
pub(crate) fn write_atomically<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let io_err = |e: std::io::Error| VsmError::Io { path: path.to_path_buf(), source: e };
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|e| VsmError::Io { path: parent.to_path_buf(), source: e })?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        body(&mut w)?;
        w.flush().map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

pub(crate) fn write_line<W: Write>(w: &mut W, path: &Path, line: &str) -> Result<()> {
    writeln!(w, "{line}").map_err(|e| VsmError::Io { path: path.to_path_buf(), source: e })
}

/// Splits a `;`-delimited row, honouring CSV double-quoting.
pub(crate) fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();
    let mut in_quotes = false;
    let mut was_quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() && !was_quoted => {
                field.clear();
                in_quotes = true;
                was_quoted = true;
            }
            ';' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                was_quoted = false;
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

pub fn read_model(path: &Path) -> Result<Model> {
    let reader = open_file(path)?;
    parse_model(reader, &path.display().to_string())
}

/// Parse `docId;term;score` rows.
pub fn parse_model<R: BufRead>(reader: R, source: &str) -> Result<Model> {
    let mut model = Model::new();
    let mut rows = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| VsmError::Io { path: source.into(), source: e })?;
        if line.trim().is_empty() { continue; }
        let fields = split_fields(&line).map_err(|m| VsmError::parse(source, line_no, m))?;
        let [doc_id, term, score] = fields.as_slice() else {
            return Err(VsmError::parse(source, line_no, format!("expected 3 fields, got {}", fields.len())));
        };
        let doc_id: DocId = doc_id
            .trim()
            .parse()
            .map_err(|_| VsmError::parse(source, line_no, format!("invalid document id {doc_id:?}")))?;
        let term = term.trim();
        if term.is_empty() {
            return Err(VsmError::parse(source, line_no, "empty term"));
        }
        let score = parse_score(score).map_err(|m| VsmError::parse(source, line_no, m))?;
        if score < 0.0 {
            return Err(VsmError::parse(source, line_no, format!("negative weight {score}")));
        }
        if model.docs.entry(doc_id).or_default().insert(term.to_string(), score).is_some() {
            return Err(VsmError::parse(source, line_no, format!("duplicate weight for document {doc_id}, term {term}")));
        }
        rows += 1;
    }
    tracing::info!(source, rows, docs = model.num_docs(), "read model");
    Ok(model)
}

pub fn write_model(path: &Path, model: &Model) -> Result<()> {
    write_atomically(path, |w| {
        for (doc_id, terms) in &model.docs {
            for (term, score) in terms {
                write_line(w, path, &format!("{doc_id};{term};{score}"))?;
            }
        }
        Ok(())
    })?;
    tracing::info!(path = %path.display(), weights = model.num_weights(), "wrote model");
    Ok(())
}

/// Sidecar path for a model file: `<model>.meta.json`.
pub fn meta_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

pub fn save_meta(path: &Path, meta: &ModelMeta) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomically(path, |w| write_line(w, path, &json))
}

pub fn load_meta(path: &Path) -> Result<ModelMeta> {
    let reader = open_file(path)?;
    let meta: ModelMeta = serde_json::from_reader(reader)?;
    Ok(meta)
}

pub fn read_queries(path: &Path) -> Result<Vec<Query>> {
    let reader = open_file(path)?;
    parse_queries(reader, &path.display().to_string())
}

/// Parse a `QueryNumber;QueryText` query set. Query text is whitespace-split
/// into terms as-is; it is expected to arrive normalized.
pub fn parse_queries<R: BufRead>(reader: R, source: &str) -> Result<Vec<Query>> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.map_err(|e| VsmError::Io { path: source.into(), source: e })?,
        None => return Err(VsmError::parse(source, 1, "missing header")),
    };
    if header.trim().trim_start_matches('\u{feff}') != QUERY_HEADER {
        return Err(VsmError::parse(source, 1, format!("expected header {QUERY_HEADER:?}, got {header:?}")));
    }

    let mut queries = Vec::new();
    let mut seen = HashSet::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let line = line.map_err(|e| VsmError::Io { path: source.into(), source: e })?;
        if line.trim().is_empty() { continue; }
        let fields = split_fields(&line).map_err(|m| VsmError::parse(source, line_no, m))?;
        let [id, text] = fields.as_slice() else {
            return Err(VsmError::parse(source, line_no, format!("expected 2 fields, got {}", fields.len())));
        };
        let id: u32 = id
            .trim()
            .parse()
            .map_err(|_| VsmError::parse(source, line_no, format!("invalid query number {id:?}")))?;
        if !seen.insert(id) {
            return Err(VsmError::parse(source, line_no, format!("duplicate query number {id}")));
        }
        queries.push(Query { id, terms: split_terms(text) });
    }
    tracing::info!(source, queries = queries.len(), "read queries");
    Ok(queries)
}

pub fn write_queries(path: &Path, queries: &[Query]) -> Result<()> {
    write_atomically(path, |w| {
        write_line(w, path, QUERY_HEADER)?;
        for q in queries {
            write_line(w, path, &format!("{};{}", q.id, q.terms.join(" ")))?;
        }
        Ok(())
    })
}

/// One `queryId;[rank, docId, score]` row per (query, document) pair.
pub fn write_results(path: &Path, results: &RankedResults) -> Result<()> {
    let mut rows = 0usize;
    write_atomically(path, |w| {
        for (query_id, ranking) in results {
            for entry in ranking {
                write_line(w, path, &format!("{};{}", query_id, format_ranked_triple(entry.rank, entry.doc_id, entry.score)))?;
                rows += 1;
            }
        }
        Ok(())
    })?;
    tracing::info!(path = %path.display(), queries = results.len(), rows, "wrote results");
    Ok(())
}

pub fn read_results(path: &Path) -> Result<RankedResults> {
    let reader = open_file(path)?;
    parse_results(reader, &path.display().to_string())
}

/// Rows are grouped by query in first-seen order and kept in file order
/// within each query.
pub fn parse_results<R: BufRead>(reader: R, source: &str) -> Result<RankedResults> {
    let mut results: RankedResults = Vec::new();
    let mut slot: BTreeMap<u32, usize> = BTreeMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| VsmError::Io { path: source.into(), source: e })?;
        if line.trim().is_empty() { continue; }
        let fields = split_fields(&line).map_err(|m| VsmError::parse(source, line_no, m))?;
        let [query_id, triple] = fields.as_slice() else {
            return Err(VsmError::parse(source, line_no, format!("expected 2 fields, got {}", fields.len())));
        };
        let query_id: u32 = query_id
            .trim()
            .parse()
            .map_err(|_| VsmError::parse(source, line_no, format!("invalid query id {query_id:?}")))?;
        let (rank, doc_id, score) = parse_ranked_triple(triple).map_err(|m| VsmError::parse(source, line_no, m))?;
        let idx = *slot.entry(query_id).or_insert_with(|| {
            results.push((query_id, Vec::new()));
            results.len() - 1
        });
        results[idx].1.push(RankedEntry { rank, doc_id, score });
    }
    Ok(results)
}
