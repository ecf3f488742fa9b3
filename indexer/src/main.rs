use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use vsm_core::config::{IndexerConfig, KeyValueConfig, KEY_INDEX_INPUT, KEY_MODEL_OUTPUT};
use vsm_core::loader::read_inverted_index;
use vsm_core::model::build_model;
use vsm_core::persist::{meta_path, save_meta, write_model, ModelMeta, META_VERSION};
use vsm_core::vocabulary::Vocabulary;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a TF-IDF model from an inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the model named by ESCREVA from the inverted index named by LEIA
    Build {
        /// Configuration file with LEIA= and ESCREVA= keys
        #[arg(long, default_value = "index.cfg")]
        config: PathBuf,
        /// Override LEIA
        #[arg(long)]
        input: Option<PathBuf>,
        /// Override ESCREVA
        #[arg(long)]
        output: Option<PathBuf>,
        /// Worker threads for weighting (defaults to one per core)
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, input, output, threads } => {
            if let Some(n) = threads {
                rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
            }
            let cfg = load_config(&config, input.as_deref(), output.as_deref())?;
            build_model_file(&cfg)
        }
    }
}

/// Overrides replace LEIA and ESCREVA before the keys are required.
fn load_config(path: &Path, input: Option<&Path>, output: Option<&Path>) -> Result<IndexerConfig> {
    tracing::info!(path = %path.display(), "reading configuration");
    KeyValueConfig::load_with_overrides(path, &[(KEY_INDEX_INPUT, input), (KEY_MODEL_OUTPUT, output)])
        .and_then(|kv| IndexerConfig::from_config(&kv))
        .map_err(|e| {
            tracing::error!(stage = "config", path = %path.display(), error = %e, "indexer failed");
            e
        })
        .with_context(|| format!("reading indexer configuration {}", path.display()))
}

/// Read the inverted index, weight it, and persist the model plus its meta sidecar.
fn build_model_file(cfg: &IndexerConfig) -> Result<()> {
    tracing::info!(input = %cfg.input.display(), output = %cfg.output.display(), "indexer started");

    let index = read_inverted_index(&cfg.input)
        .map_err(|e| log_failure("read_index", &cfg.input, e))
        .with_context(|| format!("reading inverted index {}", cfg.input.display()))?;

    let model = build_model(&index)
        .map_err(|e| log_failure("build_model", &cfg.input, e))
        .context("building tf-idf model")?;

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .context("formatting model creation time")?;

    write_model(&cfg.output, &model)
        .map_err(|e| log_failure("write_model", &cfg.output, e))
        .with_context(|| format!("writing model {}", cfg.output.display()))?;

    let meta = ModelMeta {
        num_docs: model.num_docs() as u32,
        num_terms: Vocabulary::from_model(&model).len() as u32,
        created_at,
        version: META_VERSION,
    };
    let meta_file = meta_path(&cfg.output);
    save_meta(&meta_file, &meta)
        .map_err(|e| log_failure("write_meta", &meta_file, e))
        .with_context(|| format!("writing model meta {}", meta_file.display()))?;

    tracing::info!(output = %cfg.output.display(), docs = meta.num_docs, "indexer completed");
    Ok(())
}

fn log_failure(stage: &str, path: &Path, e: vsm_core::VsmError) -> vsm_core::VsmError {
    tracing::error!(stage, path = %path.display(), error = %e, "indexer failed");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use vsm_core::persist::{load_meta, read_model};

    #[test]
    fn builds_model_and_meta_from_config() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("lista.csv");
        let output = dir.path().join("RESULT/modelo.csv");
        fs::write(&input, "A;[1, 1, 2]\nB;[1, 3, 3, 3]\n").unwrap();
        let cfg_path = dir.path().join("index.cfg");
        fs::write(&cfg_path, format!("LEIA={}\nESCREVA={}\n", input.display(), output.display())).unwrap();

        let cfg = load_config(&cfg_path, None, None).unwrap();
        build_model_file(&cfg).unwrap();

        let model = read_model(&output).unwrap();
        assert_eq!(model.num_docs(), 3);
        assert!((model.weight(1, "B").unwrap() - 0.5 * 1.5f64.ln()).abs() < 1e-12);

        let meta = load_meta(&meta_path(&output)).unwrap();
        assert_eq!(meta.num_docs, 3);
        assert_eq!(meta.num_terms, 2);
        assert_eq!(meta.version, META_VERSION);
        // RFC 3339 UTC, e.g. 2024-05-01T12:00:00.123Z
        assert!(meta.created_at.len() >= 20, "created_at {:?}", meta.created_at);
        assert_eq!(meta.created_at.as_bytes()[10], b'T');
        assert!(meta.created_at.ends_with('Z'));
    }

    #[test]
    fn empty_index_aborts_without_writing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("lista.csv");
        let output = dir.path().join("modelo.csv");
        fs::write(&input, "").unwrap();
        let err = build_model_file(&IndexerConfig { input, output: output.clone() }).unwrap_err();
        assert!(matches!(err.downcast_ref::<vsm_core::VsmError>(), Some(vsm_core::VsmError::Arithmetic(_))));
        assert!(!output.exists());
    }

    #[test]
    fn missing_config_key_is_reported() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("index.cfg");
        fs::write(&cfg_path, "LEIA=x.csv\n").unwrap();
        let err = load_config(&cfg_path, None, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<vsm_core::VsmError>(), Some(vsm_core::VsmError::Config { .. })));
    }

    #[test]
    fn output_override_applies_before_required_keys() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("lista.csv");
        fs::write(&input, "A;[1, 2]\nB;[2]\n").unwrap();
        let cfg_path = dir.path().join("index.cfg");
        fs::write(&cfg_path, format!("LEIA={}\n", input.display())).unwrap();

        let output = dir.path().join("modelo.csv");
        let cfg = load_config(&cfg_path, None, Some(output.as_path())).unwrap();
        assert_eq!(cfg.output, output);
        build_model_file(&cfg).unwrap();
        assert_eq!(read_model(&output).unwrap().num_docs(), 2);

        let absent = dir.path().join("absent.cfg");
        let cfg = load_config(&absent, Some(input.as_path()), Some(output.as_path())).unwrap();
        assert_eq!(cfg.input, input);
    }
}
