//! Brain repository - bootstrap, checkpoint and reset of the engine state.
//!
//! Bootstrap policy:
//!
//! - Snapshot present and loadable: use it as is, the corpus is not scanned.
//! - Snapshot absent or unloadable: learn every corpus file in file-name
//!   order, then write a fresh snapshot.
//! - Either way, apply the full predicate set afterwards.
//!
//! The snapshot is never compared with the corpus. Reset is the only way to
//! force a relearn while a good snapshot exists.

use serde::Serialize;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{BrainConfig, IdentityConfig};
use crate::engine::MatchingEngine;
use crate::error::{FallbotError, Result};
use crate::identity::IdentitySource;
use crate::predicates::PredicateSet;

/// Filesystem primitives the repository needs
pub trait BrainStorage {
    /// Pattern files of the corpus, in a stable order
    fn list_corpus(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn snapshot_exists(&self, path: &Path) -> bool;

    fn remove_snapshot(&self, path: &Path) -> io::Result<()>;
}

/// Plain filesystem storage
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl BrainStorage for FsStorage {
    fn list_corpus(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if entry.file_type().is_file() && !hidden {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn snapshot_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn remove_snapshot(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// How often answered queries are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    pub every: NonZeroU32,
}

impl CheckpointPolicy {
    pub fn every_query() -> Self {
        Self {
            every: NonZeroU32::MIN,
        }
    }

    pub fn is_due(&self, queries_since_checkpoint: u32) -> bool {
        queries_since_checkpoint >= self.every.get()
    }
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self::every_query()
    }
}

/// Where a bootstrapped brain came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BrainSource {
    Snapshot,
    Corpus { files: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub source: BrainSource,
    /// A snapshot matching the brain is on disk
    pub persisted: bool,
    pub categories: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrainStatus {
    pub corpus_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub snapshot_present: bool,
    pub categories: usize,
    pub queries_since_checkpoint: u32,
    pub checkpoint_every: u32,
}

/// Owns the engine and the snapshot file lifecycle
pub struct BrainRepository<E, S = FsStorage> {
    engine: E,
    storage: S,
    identity: Box<dyn IdentitySource>,
    identity_config: IdentityConfig,
    corpus_dir: PathBuf,
    snapshot_path: PathBuf,
    policy: CheckpointPolicy,
    queries_since_checkpoint: u32,
}

impl<E: MatchingEngine, S: BrainStorage> BrainRepository<E, S> {
    pub fn new(
        engine: E,
        storage: S,
        brain: &BrainConfig,
        identity: Box<dyn IdentitySource>,
        identity_config: IdentityConfig,
    ) -> Self {
        Self {
            engine,
            storage,
            identity,
            identity_config,
            corpus_dir: brain.corpus_dir.clone(),
            snapshot_path: brain.snapshot_path.clone(),
            policy: CheckpointPolicy {
                every: brain.checkpoint_interval,
            },
            queries_since_checkpoint: 0,
        }
    }

    pub fn with_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Produce a ready brain from the snapshot or the corpus
    pub fn bootstrap(&mut self) -> Result<BootstrapReport> {
        let loaded = self.storage.snapshot_exists(&self.snapshot_path) && self.load_snapshot()?;

        let (source, persisted) = if loaded {
            (BrainSource::Snapshot, true)
        } else {
            let files = self.learn_corpus()?;
            (BrainSource::Corpus { files }, self.save_snapshot())
        };

        let device = self.identity.identity();
        PredicateSet::from_identity(&device, &self.identity_config).apply(&mut self.engine);
        self.queries_since_checkpoint = 0;

        let report = BootstrapReport {
            source,
            persisted,
            categories: self.engine.category_count(),
        };
        info!(
            "Brain ready: {:?}, {} categories, persisted={}",
            report.source, report.categories, report.persisted
        );
        Ok(report)
    }

    /// Wipe learned state and the snapshot, then rebuild from the corpus
    pub fn reset(&mut self) -> Result<BootstrapReport> {
        self.engine
            .reset_state()
            .map_err(|e| FallbotError::ResetFailed(format!("clearing engine state: {}", e)))?;

        match self.storage.remove_snapshot(&self.snapshot_path) {
            Ok(()) => info!("Removed snapshot {}", self.snapshot_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No snapshot to remove at {}", self.snapshot_path.display())
            }
            Err(e) => {
                return Err(FallbotError::ResetFailed(format!(
                    "removing {}: {}",
                    self.snapshot_path.display(),
                    e
                )))
            }
        }

        let report = self
            .bootstrap()
            .map_err(|e| FallbotError::ResetFailed(format!("rebuilding brain: {}", e)))?;
        if !report.persisted {
            return Err(FallbotError::ResetFailed(format!(
                "rebuilt brain could not be saved to {}",
                self.snapshot_path.display()
            )));
        }
        Ok(report)
    }

    /// Count a query attempt and persist when the policy says so
    ///
    /// Returns whether a snapshot was written. Failures are logged only.
    pub fn checkpoint(&mut self) -> bool {
        self.queries_since_checkpoint = self.queries_since_checkpoint.saturating_add(1);
        if !self.policy.is_due(self.queries_since_checkpoint) {
            return false;
        }
        let saved = self.save_snapshot();
        if saved {
            self.queries_since_checkpoint = 0;
        }
        saved
    }

    pub fn respond(&mut self, utterance: &str) -> String {
        self.engine.respond(utterance)
    }

    /// Drop in-memory state without touching the snapshot
    pub fn clear(&mut self) -> Result<()> {
        self.engine.reset_state()?;
        Ok(())
    }

    pub fn status(&self) -> BrainStatus {
        BrainStatus {
            corpus_dir: self.corpus_dir.clone(),
            snapshot_path: self.snapshot_path.clone(),
            snapshot_present: self.storage.snapshot_exists(&self.snapshot_path),
            categories: self.engine.category_count(),
            queries_since_checkpoint: self.queries_since_checkpoint,
            checkpoint_every: self.policy.every.get(),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// A snapshot that fails to load counts as absent
    fn load_snapshot(&mut self) -> Result<bool> {
        match self.engine.load_snapshot(&self.snapshot_path) {
            Ok(()) => {
                info!("Loaded brain snapshot {}", self.snapshot_path.display());
                Ok(true)
            }
            Err(e) => {
                warn!("Snapshot unusable, relearning from corpus: {}", e);
                self.engine.reset_state()?;
                Ok(false)
            }
        }
    }

    fn learn_corpus(&mut self) -> Result<usize> {
        let files = self
            .storage
            .list_corpus(&self.corpus_dir)
            .map_err(|e| FallbotError::CorpusUnavailable {
                path: self.corpus_dir.clone(),
                reason: e.to_string(),
            })?;

        if files.is_empty() {
            warn!("Pattern corpus {} is empty", self.corpus_dir.display());
        }
        for file in &files {
            self.engine.learn(file).map_err(|e| FallbotError::Learn {
                path: file.clone(),
                source: e,
            })?;
        }
        info!(
            "Learned {} pattern files from {}",
            files.len(),
            self.corpus_dir.display()
        );
        Ok(files.len())
    }

    fn save_snapshot(&mut self) -> bool {
        match self.engine.save_snapshot(&self.snapshot_path) {
            Ok(()) => {
                debug!("Saved brain snapshot {}", self.snapshot_path.display());
                true
            }
            Err(e) => {
                warn!("Brain snapshot not saved: {}", e);
                false
            }
        }
    }
}
