//! CLI command implementations.

pub mod replay;
pub mod spans;
pub mod stats;

use clap::Args;
use spanlog_core::feed::decode_lines;
use spanlog_core::{Config, CoreError, LogStore};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a feed or store configuration.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file did not parse.
    #[error("invalid config file {path}: {source}")]
    ConfigFile {
        /// File path.
        path: PathBuf,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A feed line did not decode.
    #[error("{path}: batch {batch}: {source}")]
    Feed {
        /// Feed path.
        path: PathBuf,
        /// 1-based index of the failing batch.
        batch: usize,
        /// Decode error.
        #[source]
        source: CoreError,
    },

    /// The store rejected its configuration.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Store settings shared by every replaying command.
#[derive(Debug, Clone, Default, Args)]
pub struct StoreOptions {
    /// JSON config file (camelCase keys: byteCeiling, evictionTargetRatio)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Byte ceiling, overriding the config file
    #[arg(long, value_name = "BYTES")]
    pub ceiling: Option<u64>,

    /// Eviction target ratio, overriding the config file
    #[arg(long, value_name = "R")]
    pub ratio: Option<f64>,
}

impl StoreOptions {
    /// Resolves the effective store configuration.
    pub fn resolve(&self) -> Result<Config, CliError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        if let Some(ceiling) = self.ceiling {
            config.byte_ceiling = ceiling;
        }
        if let Some(ratio) = self.ratio {
            config.eviction_target_ratio = ratio;
        }
        Ok(config)
    }
}

/// Reads a store configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<Config, CliError> {
    let file = File::open(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Replays a feed file into a fresh store, one commit per batch.
pub fn replay_feed(path: &Path, options: &StoreOptions) -> Result<LogStore, CliError> {
    let store = LogStore::with_config(options.resolve()?)?;
    let file = File::open(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut batches = 0usize;
    for (i, batch) in decode_lines(BufReader::new(file)).enumerate() {
        let batch = batch.map_err(|source| CliError::Feed {
            path: path.to_path_buf(),
            batch: i + 1,
            source,
        })?;
        store.ingest(batch.into_entries());
        batches += 1;
    }

    tracing::info!(
        batches,
        spans = store.span_count(),
        bytes = store.size_bytes(),
        "replayed {}",
        path.display()
    );
    Ok(store)
}

/// Formats a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanlog_testkit::{batch, write_feed_file};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn replay_ingests_every_batch() {
        let feed = write_feed_file(&[
            batch("build-1", Some("web"), &["Compiling\n"]),
            batch("build-2", Some("api"), &["Starting\n"]),
        ]);

        let store = replay_feed(feed.path(), &StoreOptions::default()).unwrap();
        assert_eq!(store.span_count(), 2);
        assert_eq!(store.stats().ingests_committed(), 2);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"byteCeiling": 100, "evictionTargetRatio": 0.25}}"#).unwrap();

        let options = StoreOptions {
            config: Some(file.path().to_path_buf()),
            ceiling: Some(400),
            ratio: None,
        };
        let config = options.resolve().unwrap();
        assert_eq!(config.byte_ceiling, 400);
        assert_eq!(config.eviction_target_ratio, 0.25);
    }

    #[test]
    fn unknown_config_key_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"byteCeiling": 100, "evictionTargetRatio": 0.5, "ttl": 3}}"#).unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, CliError::ConfigFile { .. }));
    }

    #[test]
    fn invalid_ratio_fails_replay() {
        let feed = write_feed_file(&[batch("s", None, &["x\n"])]);
        let options = StoreOptions {
            ratio: Some(1.5),
            ..Default::default()
        };

        let err = replay_feed(feed.path(), &options).unwrap_err();
        assert!(matches!(err, CliError::Core(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn bad_feed_line_reports_batch_number() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"spanId": "s", "segments": []}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = replay_feed(file.path(), &StoreOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::Feed { batch: 2, .. }));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
