use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use vsm_core::config::{KeyValueConfig, SearchConfig, KEY_MODEL, KEY_QUERIES, KEY_RESULTS};
use vsm_core::persist::{load_meta, meta_path, read_model, read_queries, write_results};
use vsm_core::rank::rank_with_vocabulary;
use vsm_core::vocabulary::Vocabulary;
use vsm_core::{Model, VsmError};

#[derive(Debug, Serialize)]
pub struct SearchSummary {
    pub queries: usize,
    pub documents: usize,
    pub vocabulary: usize,
    pub rows: usize,
    pub took_s: f64,
}

/// Command-line replacements for the MODELO, CONSULTAS and RESULTADOS keys.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub queries: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

/// Read the configuration with `overrides` applied before required keys are
/// checked; a missing file is fine when overrides are given.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<SearchConfig> {
    tracing::info!(path = %path.display(), "reading configuration");
    let pairs = [
        (KEY_MODEL, overrides.model.as_deref()),
        (KEY_QUERIES, overrides.queries.as_deref()),
        (KEY_RESULTS, overrides.results.as_deref()),
    ];
    KeyValueConfig::load_with_overrides(path, &pairs)
        .and_then(|kv| SearchConfig::from_config(&kv))
        .map_err(|e| log_failure("config", path, e))
        .with_context(|| format!("reading search configuration {}", path.display()))
}

/// One search run: rank every model document for every query and write the
/// complete rankings to the results file.
pub fn run(cfg: &SearchConfig) -> Result<SearchSummary> {
    let start = std::time::Instant::now();
    tracing::info!(model = %cfg.model.display(), queries = %cfg.queries.display(), "search started");

    let model = read_model(&cfg.model)
        .map_err(|e| log_failure("read_model", &cfg.model, e))
        .with_context(|| format!("reading model {}", cfg.model.display()))?;
    let vocabulary = Vocabulary::from_model(&model);
    check_meta(&cfg.model, &model, vocabulary.len());

    let queries = read_queries(&cfg.queries)
        .map_err(|e| log_failure("read_queries", &cfg.queries, e))
        .with_context(|| format!("reading queries {}", cfg.queries.display()))?;
    if queries.is_empty() {
        tracing::warn!(queries = %cfg.queries.display(), "query set is empty");
    }

    let results = rank_with_vocabulary(&queries, &model, &vocabulary)
        .map_err(|e| log_failure("rank", &cfg.model, e))
        .context("ranking documents")?;

    write_results(&cfg.results, &results)
        .map_err(|e| log_failure("write_results", &cfg.results, e))
        .with_context(|| format!("writing results {}", cfg.results.display()))?;

    let summary = SearchSummary {
        queries: results.len(),
        documents: model.num_docs(),
        vocabulary: vocabulary.len(),
        rows: results.iter().map(|(_, r)| r.len()).sum(),
        took_s: start.elapsed().as_secs_f64(),
    };
    tracing::info!(results = %cfg.results.display(), rows = summary.rows, "search completed");
    Ok(summary)
}

/// The meta sidecar is optional; a mismatch only means the model file was
/// edited or replaced after indexing.
fn check_meta(model_path: &Path, model: &Model, vocabulary: usize) {
    let path = meta_path(model_path);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no model meta sidecar");
        return;
    }
    match load_meta(&path) {
        Ok(meta) if meta.num_docs as usize != model.num_docs() || meta.num_terms as usize != vocabulary => {
            tracing::warn!(
                path = %path.display(),
                meta_docs = meta.num_docs,
                meta_terms = meta.num_terms,
                docs = model.num_docs(),
                terms = vocabulary,
                "model meta does not match model contents"
            );
        }
        Ok(meta) => tracing::debug!(created_at = %meta.created_at, "model meta matches"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable model meta"),
    }
}

fn log_failure(stage: &str, path: &Path, e: VsmError) -> VsmError {
    tracing::error!(stage, path = %path.display(), error = %e, "search failed");
    e
}
