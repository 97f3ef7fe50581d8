/// the closed set of error kinds the core can produce. Recoverable
/// per-iteration/per-hand failures never surface here — they are consumed
/// locally by the sampler/engine as warnings. Only run-fatal conditions
/// reach the CLI boundary as a `SolverError`.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("invariant violation: {message}")]
    Invariant { message: String },

    #[error("bucket configuration mismatch: checkpoint was trained with {checkpoint:?}, current run configured with {current:?}")]
    ConfigMismatch {
        checkpoint: crate::bucket::BucketFingerprint,
        current: crate::bucket::BucketFingerprint,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker {worker_id} failed: {reason}")]
    WorkerFailure { worker_id: usize, reason: String },

    #[error("public-card sampling dead end: {reason}")]
    SamplingDeadEnd { reason: String },
}

pub type Result<T> = std::result::Result<T, SolverError>;
