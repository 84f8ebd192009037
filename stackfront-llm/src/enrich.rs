//! Library-mode engine config enrichment.
//!
//! Before a library engine starts, its YAML config is rewritten with
//! values only known at deploy time:
//!
//! - `${env.NAME}` / `${env.NAME:=default}` placeholders are resolved
//! - every configured BYOK store is added as a `providers.vector_io` entry
//!   and registered under `vector_dbs`
//!
//! The result goes to a fixed file name so repeated loads reuse one file.
//! Enrichment is best-effort: any failure leaves the original path in use.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::{Mapping, Sequence, Value};
use stackfront_core::config::{ByokStore, RagConfig};
use thiserror::Error;
use tracing::{info, warn};

/// File name the enriched config is written to.
pub const ENRICHED_CONFIG_FILE: &str = "stackfront_enriched_config.yaml";

const PLACEHOLDER_OPEN: &str = "${env.";

#[derive(Debug, Error)]
enum EnrichError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unexpected config shape: {0}")]
    Shape(String),
}

#[derive(Serialize)]
struct VectorIoProvider<'a> {
    provider_id: String,
    provider_type: &'static str,
    config: FaissConfig<'a>,
}

#[derive(Serialize)]
struct FaissConfig<'a> {
    kvstore: KvStore<'a>,
}

#[derive(Serialize)]
struct KvStore<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    db_path: &'a Path,
}

#[derive(Serialize)]
struct VectorDbRegistration<'a> {
    vector_db_id: &'a str,
    embedding_model: &'a str,
    embedding_dimension: u32,
    provider_id: String,
}

/// Rewrites library engine configs.
#[derive(Debug, Clone)]
pub struct ConfigEnricher {
    rag: RagConfig,
    output_dir: PathBuf,
}

impl Default for ConfigEnricher {
    fn default() -> Self {
        Self::new(RagConfig::default())
    }
}

impl ConfigEnricher {
    /// Enricher injecting the stores of `rag`, writing to the system temp dir.
    #[must_use]
    pub fn new(rag: RagConfig) -> Self {
        Self {
            rag,
            output_dir: std::env::temp_dir(),
        }
    }

    /// Write enriched configs into `dir` instead of the temp dir.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Where the enriched config is written.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(ENRICHED_CONFIG_FILE)
    }

    /// Enrich the config at `input` and return the path the engine should
    /// load. Falls back to `input` itself if anything goes wrong.
    #[must_use]
    pub fn enrich(&self, input: &Path) -> PathBuf {
        match self.try_enrich(input) {
            Ok(output) => {
                info!(
                    "Enriched library config: {} -> {}",
                    input.display(),
                    output.display()
                );
                output
            }
            Err(e) => {
                warn!("Failed to enrich library config, using original: {}", e);
                input.to_path_buf()
            }
        }
    }

    fn try_enrich(&self, input: &Path) -> Result<PathBuf, EnrichError> {
        let raw = fs::read_to_string(input)?;
        let mut doc: Value = serde_yaml::from_str(&raw)?;
        substitute_in_value(&mut doc, &|name: &str| std::env::var(name).ok());

        let root = doc
            .as_mapping_mut()
            .ok_or_else(|| EnrichError::Shape("top level is not a mapping".to_string()))?;
        for store in &self.rag.byok {
            inject_byok_store(root, store)?;
        }

        let output = self.output_path();
        fs::write(&output, serde_yaml::to_string(&doc)?)?;
        Ok(output)
    }
}

/// Resolve `${env.NAME}` and `${env.NAME:=default}` placeholders in `text`.
///
/// A variable that is unset or empty takes its default. Placeholders with
/// neither a value nor a default are left as written.
pub fn substitute_env_placeholders(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + PLACEHOLDER_OPEN.len()..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let (name, default) = match expr.split_once(":=") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };
        let resolved = lookup(name)
            .filter(|value| !value.is_empty())
            .or_else(|| default.map(str::to_string));
        match resolved {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + PLACEHOLDER_OPEN.len() + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn substitute_in_value(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    match value {
        Value::String(s) if s.contains(PLACEHOLDER_OPEN) => {
            *s = substitute_env_placeholders(s, lookup);
        }
        Value::Sequence(items) => {
            for item in items {
                substitute_in_value(item, lookup);
            }
        }
        Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                substitute_in_value(item, lookup);
            }
        }
        Value::Tagged(tagged) => substitute_in_value(&mut tagged.value, lookup),
        _ => {}
    }
}

fn inject_byok_store(root: &mut Mapping, store: &ByokStore) -> Result<(), EnrichError> {
    let provider_id = store.provider_id();

    let providers = child_mapping(root, "providers")?;
    let vector_io = child_sequence(providers, "vector_io")?;
    if !contains_entry(vector_io, "provider_id", &provider_id) {
        vector_io.push(serde_yaml::to_value(VectorIoProvider {
            provider_id: provider_id.clone(),
            provider_type: "inline::faiss",
            config: FaissConfig {
                kvstore: KvStore {
                    kind: "sqlite",
                    db_path: &store.db_path,
                },
            },
        })?);
    }

    let vector_dbs = child_sequence(root, "vector_dbs")?;
    if !contains_entry(vector_dbs, "vector_db_id", &store.vector_db_id) {
        vector_dbs.push(serde_yaml::to_value(VectorDbRegistration {
            vector_db_id: &store.vector_db_id,
            embedding_model: &store.embedding_model,
            embedding_dimension: store.embedding_dimension,
            provider_id,
        })?);
    }
    Ok(())
}

fn contains_entry(entries: &Sequence, key: &str, id: &str) -> bool {
    entries
        .iter()
        .any(|entry| entry.get(key).and_then(Value::as_str) == Some(id))
}

fn child_mapping<'a>(parent: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping, EnrichError> {
    let slot = parent.entry(Value::from(key)).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
        .ok_or_else(|| EnrichError::Shape(format!("`{key}` is not a mapping")))
}

fn child_sequence<'a>(parent: &'a mut Mapping, key: &str) -> Result<&'a mut Sequence, EnrichError> {
    let slot = parent.entry(Value::from(key)).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Sequence(Sequence::new());
    }
    slot.as_sequence_mut()
        .ok_or_else(|| EnrichError::Shape(format!("`{key}` is not a list")))
}
