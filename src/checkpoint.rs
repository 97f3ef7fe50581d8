//! checkpoint and blueprint-export I/O. Every write is atomic: serialize to
//! a sibling `.tmp` file, fsync, then rename over the destination, so a
//! reader never observes a torn write. Bucket-fingerprint mismatch on load
//! is a fatal, run-stopping error — regrets trained under one abstraction
//! are meaningless under another.

use crate::bucket::BucketFingerprint;
use crate::error::{Result, SolverError};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub iteration: u64,
    pub elapsed_seconds: f64,
    pub epsilon: f64,
    pub regret_discount_alpha: f64,
    pub strategy_discount_beta: f64,
    pub bucket_fingerprint: BucketFingerprint,
    pub store: Store,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueprintExport {
    pub bucket_fingerprint: BucketFingerprint,
    pub store: Store,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumSidecar {
    pub sha256: String,
    pub bucket_fingerprint: BucketFingerprint,
    pub seed: u64,
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// writes `checkpoint` atomically, validating nothing about its own
/// contents — callers are responsible for the fingerprint they embed.
pub fn save_checkpoint(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let bytes = bincode::serialize(checkpoint)
        .map_err(|e| SolverError::Invariant { message: format!("checkpoint serialization failed: {e}") })?;
    write_atomic(path, &bytes)?;
    log::info!(target: "checkpoint", "wrote checkpoint at iteration {} ({} bytes)", checkpoint.iteration, bytes.len());
    Ok(())
}

/// loads a checkpoint, enforcing that its bucket fingerprint matches
/// `current`. A missing file is reported as `Ok(None)` rather than an
/// error — "no checkpoint" is the expected state of a fresh run.
pub fn load_checkpoint(path: &Path, current: BucketFingerprint) -> Result<Option<Checkpoint>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!(target: "checkpoint", "no checkpoint found at {}, starting fresh", path.display());
            return Ok(None);
        }
        Err(e) => {
            log::warn!(target: "checkpoint", "checkpoint read failed ({e}), starting fresh");
            return Ok(None);
        }
    };
    let checkpoint: Checkpoint = bincode::deserialize(&bytes)
        .map_err(|e| SolverError::Invariant { message: format!("checkpoint deserialization failed: {e}") })?;
    if checkpoint.bucket_fingerprint != current {
        return Err(SolverError::ConfigMismatch { checkpoint: checkpoint.bucket_fingerprint, current });
    }
    log::info!(target: "checkpoint", "resumed from iteration {}", checkpoint.iteration);
    Ok(Some(checkpoint))
}

pub fn save_blueprint(path: &Path, export: &BlueprintExport) -> Result<()> {
    let bytes = bincode::serialize(export)
        .map_err(|e| SolverError::Invariant { message: format!("blueprint serialization failed: {e}") })?;
    write_atomic(path, &bytes)?;
    Ok(())
}

pub fn load_blueprint(path: &Path) -> Result<BlueprintExport> {
    let bytes = std::fs::read(path)?;
    bincode::deserialize(&bytes)
        .map_err(|e| SolverError::Invariant { message: format!("blueprint deserialization failed: {e}") })
}

/// writes the sidecar checksum JSON for a published blueprint file.
pub fn write_checksum_sidecar(blueprint_path: &Path, fingerprint: BucketFingerprint, seed: u64) -> Result<()> {
    let bytes = std::fs::read(blueprint_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let sha256 = format!("{:x}", hasher.finalize());
    let sidecar = ChecksumSidecar { sha256, bucket_fingerprint: fingerprint, seed };
    let json = serde_json::to_vec_pretty(&sidecar)
        .map_err(|e| SolverError::Invariant { message: format!("checksum sidecar serialization failed: {e}") })?;
    let sidecar_path = blueprint_path.with_extension("sha256.json");
    write_atomic(&sidecar_path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_checkpoint() -> Checkpoint {
        Checkpoint {
            iteration: 42,
            elapsed_seconds: 1.5,
            epsilon: 0.2,
            regret_discount_alpha: 0.9,
            strategy_discount_beta: 0.8,
            bucket_fingerprint: BucketFingerprint::default(),
            store: Store::new(),
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("holdem-solver-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checkpoint.bin");
        let checkpoint = sample_checkpoint();
        save_checkpoint(&path, &checkpoint).unwrap();
        let loaded = load_checkpoint(&path, BucketFingerprint::default()).unwrap().unwrap();
        assert_eq!(loaded.iteration, checkpoint.iteration);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn fingerprint_mismatch_on_load_is_fatal() {
        let dir = std::env::temp_dir().join(format!("holdem-solver-test-mismatch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checkpoint.bin");
        save_checkpoint(&path, &sample_checkpoint()).unwrap();
        let other = BucketFingerprint { seed: 99, ..BucketFingerprint::default() };
        let result = load_checkpoint(&path, other);
        assert!(matches!(result, Err(SolverError::ConfigMismatch { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_checkpoint_is_not_an_error() {
        let path = std::env::temp_dir().join("holdem-solver-does-not-exist.bin");
        let result = load_checkpoint(&path, BucketFingerprint::default()).unwrap();
        assert!(result.is_none());
    }
}
