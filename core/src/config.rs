//! `KEY=value` run configuration.
//!
//! The indexing run reads `LEIA` (inverted index) and `ESCREVA` (model output);
//! the search run reads `MODELO`, `CONSULTAS` and `RESULTADOS`.

use crate::error::{Result, VsmError};
use crate::persist::open_file;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

pub const KEY_INDEX_INPUT: &str = "LEIA";
pub const KEY_MODEL_OUTPUT: &str = "ESCREVA";
pub const KEY_MODEL: &str = "MODELO";
pub const KEY_QUERIES: &str = "CONSULTAS";
pub const KEY_RESULTS: &str = "RESULTADOS";

#[derive(Debug, Default, Clone)]
pub struct KeyValueConfig {
    pub source: String,
    values: HashMap<String, String>,
}

impl KeyValueConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_file(path)?;
        Self::parse(reader, &path.display().to_string())
    }

    /// Load `path` and apply command-line `overrides` before any key is
    /// required. A missing file is tolerated when at least one override is
    /// given, so a fully overridden run needs no configuration file.
    pub fn load_with_overrides(path: &Path, overrides: &[(&str, Option<&Path>)]) -> Result<Self> {
        let mut cfg = match Self::load(path) {
            Ok(cfg) => cfg,
            Err(VsmError::NotFound { .. }) if overrides.iter().any(|(_, v)| v.is_some()) => {
                tracing::info!(path = %path.display(), "configuration file absent; using overrides only");
                Self { source: path.display().to_string(), values: HashMap::new() }
            }
            Err(e) => return Err(e),
        };
        for (key, value) in overrides {
            if let Some(value) = value {
                cfg.set(key, value.display().to_string());
            }
        }
        Ok(cfg)
    }

    pub fn set(&mut self, key: &str, value: String) {
        tracing::debug!(source = %self.source, key, value = %value, "configuration key overridden");
        self.values.insert(key.to_string(), value);
    }

    pub fn parse<R: BufRead>(reader: R, source: &str) -> Result<Self> {
        let mut values = HashMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|e| VsmError::Io { path: source.into(), source: e })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }
            let Some((key, value)) = line.split_once('=') else {
                return Err(config_error(source, format!("line {line_no}: expected KEY=value, got {line:?}")));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(config_error(source, format!("line {line_no}: empty key")));
            }
            if values.insert(key.to_string(), value.trim().to_string()).is_some() {
                tracing::warn!(source, key, line = line_no, "configuration key repeated; last value wins");
            }
        }
        Ok(Self { source: source.to_string(), values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Non-empty value for `key` as a path.
    pub fn require_path(&self, key: &str) -> Result<PathBuf> {
        match self.get(key) {
            Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
            Some(_) => Err(config_error(&self.source, format!("key {key} has an empty value"))),
            None => Err(config_error(&self.source, format!("missing key {key}"))),
        }
    }

    fn log_unknown(&self, known: &[&str]) {
        for key in self.values.keys().filter(|k| !known.contains(&k.as_str())) {
            tracing::debug!(source = %self.source, key = %key, "ignoring unknown configuration key");
        }
    }
}

fn config_error(source: &str, message: String) -> VsmError {
    VsmError::Config { file: source.to_string(), message }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl IndexerConfig {
    pub fn from_config(cfg: &KeyValueConfig) -> Result<Self> {
        cfg.log_unknown(&[KEY_INDEX_INPUT, KEY_MODEL_OUTPUT]);
        Ok(Self {
            input: cfg.require_path(KEY_INDEX_INPUT)?,
            output: cfg.require_path(KEY_MODEL_OUTPUT)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub model: PathBuf,
    pub queries: PathBuf,
    pub results: PathBuf,
}

impl SearchConfig {
    pub fn from_config(cfg: &KeyValueConfig) -> Result<Self> {
        cfg.log_unknown(&[KEY_MODEL, KEY_QUERIES, KEY_RESULTS]);
        Ok(Self {
            model: cfg.require_path(KEY_MODEL)?,
            queries: cfg.require_path(KEY_QUERIES)?,
            results: cfg.require_path(KEY_RESULTS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<KeyValueConfig> {
        KeyValueConfig::parse(Cursor::new(text), "test.cfg")
    }

    #[test]
    fn reads_indexer_keys() {
        let cfg = parse("# indexer\nLEIA=RESULT/lista.csv\n\nESCREVA = RESULT/modelo.csv\n").unwrap();
        let ix = IndexerConfig::from_config(&cfg).unwrap();
        assert_eq!(ix.input, PathBuf::from("RESULT/lista.csv"));
        assert_eq!(ix.output, PathBuf::from("RESULT/modelo.csv"));
    }

    #[test]
    fn value_may_contain_equals_and_last_key_wins() {
        let cfg = parse("MODELO=a\nMODELO=b=c\nCONSULTAS=q\nRESULTADOS=r\nEXTRA=1\n").unwrap();
        let sc = SearchConfig::from_config(&cfg).unwrap();
        assert_eq!(sc.model, PathBuf::from("b=c"));
        assert_eq!(cfg.get("EXTRA"), Some("1"));
    }

    #[test]
    fn missing_or_empty_keys_are_config_errors() {
        let cfg = parse("LEIA=x\n").unwrap();
        let err = IndexerConfig::from_config(&cfg).unwrap_err();
        assert!(matches!(&err, VsmError::Config { message, .. } if message.contains("ESCREVA")));

        let cfg = parse("LEIA=x\nESCREVA=\n").unwrap();
        assert!(matches!(IndexerConfig::from_config(&cfg), Err(VsmError::Config { .. })));
    }

    #[test]
    fn malformed_lines_are_config_errors() {
        assert!(matches!(parse("LEIA x\n"), Err(VsmError::Config { .. })));
        assert!(matches!(parse("=x\n"), Err(VsmError::Config { .. })));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = KeyValueConfig::load(Path::new("/no/such/index.cfg")).unwrap_err();
        assert!(matches!(err, VsmError::NotFound { .. }));
    }

    #[test]
    fn overrides_fill_keys_missing_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.cfg");
        std::fs::write(&path, "LEIA=lista.csv\nESCREVA=old.csv\n").unwrap();
        let cfg = KeyValueConfig::load_with_overrides(&path, &[(KEY_MODEL_OUTPUT, Some(Path::new("new.csv")))]).unwrap();
        let ix = IndexerConfig::from_config(&cfg).unwrap();
        assert_eq!(ix.input, PathBuf::from("lista.csv"));
        assert_eq!(ix.output, PathBuf::from("new.csv"));

        std::fs::write(&path, "LEIA=lista.csv\n").unwrap();
        let cfg = KeyValueConfig::load_with_overrides(&path, &[(KEY_MODEL_OUTPUT, Some(Path::new("m.csv")))]).unwrap();
        assert_eq!(IndexerConfig::from_config(&cfg).unwrap().output, PathBuf::from("m.csv"));
    }

    #[test]
    fn overrides_alone_stand_in_for_a_missing_file() {
        let missing = Path::new("/no/such/busca.cfg");
        let overrides = [
            (KEY_MODEL, Some(Path::new("m.csv"))),
            (KEY_QUERIES, Some(Path::new("q.csv"))),
            (KEY_RESULTS, Some(Path::new("r.csv"))),
        ];
        let cfg = KeyValueConfig::load_with_overrides(missing, &overrides).unwrap();
        let sc = SearchConfig::from_config(&cfg).unwrap();
        assert_eq!(sc.queries, PathBuf::from("q.csv"));

        let partial = KeyValueConfig::load_with_overrides(missing, &overrides[..1]).unwrap();
        assert!(matches!(SearchConfig::from_config(&partial), Err(VsmError::Config { .. })));

        let none = KeyValueConfig::load_with_overrides(missing, &[(KEY_MODEL, None)]).unwrap_err();
        assert!(matches!(none, VsmError::NotFound { .. }));
    }
}
