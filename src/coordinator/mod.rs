//! the two outer loops around the driver that exist to manage long runs:
//! a chunked coordinator (process-exit-as-memory-management) and a
//! multi-instance coordinator (K independent solvers sharded by seed).

pub mod chunked;
pub mod multi_instance;
