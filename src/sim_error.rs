//! GridHaloError: unified error type for grid-halo public APIs.
//!
//! Every fallible operation in the crate reports through this enum (or through
//! [`PartitionError`](crate::partition::PartitionError), which converts into
//! it), so callers see one structured taxonomy: configuration errors at
//! construction time, fatal transport errors during stepping, and recoverable
//! observer failures.

use crate::comm::communicator::CommError;
use thiserror::Error;

/// Unified error type for grid-halo operations.
#[derive(Debug, Error)]
pub enum GridHaloError {
    /// The simulation area holds no cells.
    #[error("simulation area is empty")]
    EmptySimulationArea,
    /// Ghost zones must be at least one cell wide for the stepper to make progress.
    #[error("ghost zone width must be at least 1")]
    InvalidGhostZoneWidth,
    /// The configured ghost zone cannot satisfy the cell's stencil.
    #[error("ghost zone width {ghost_zone_width} is narrower than the cell stencil radius {stencil_radius}")]
    GhostZoneTooNarrow {
        ghost_zone_width: u32,
        stencil_radius: u32,
    },
    /// Errors from the partitioning subsystem.
    #[error(transparent)]
    Partition(#[from] crate::partition::PartitionError),
    /// A patch was requested for a nano step that has already passed.
    #[error("patch schedule for nano step {requested} lies in the past (current {current})")]
    ScheduleInPast { requested: u64, current: u64 },
    /// A patch buffer was asked for an entry it does not hold.
    #[error("patch buffer has no entry for nano step {requested}")]
    PatchBufferMiss { requested: u64 },
    /// The bounding-box all-gather failed.
    #[error("bounding box exchange with rank {peer} failed: {source}")]
    BoundingBoxExchange { peer: usize, source: CommError },
    /// Sending a patch over the transport failed. Fatal to the stepper.
    #[error("patch send to peer {peer} failed at nano step {nano_step}: {source}")]
    PatchSendFailed {
        peer: usize,
        nano_step: u64,
        source: CommError,
    },
    /// Receiving a patch over the transport failed. Fatal to the stepper.
    #[error("patch receive from peer {peer} failed at nano step {nano_step}")]
    PatchRecvFailed { peer: usize, nano_step: u64 },
    /// A received patch had the wrong byte length.
    #[error("patch from peer {peer} carries {got} bytes, expected {expected}")]
    PatchSizeMismatch {
        peer: usize,
        expected: usize,
        got: usize,
    },
    /// A received patch was stamped with an unexpected nano step.
    #[error("patch from peer {peer} is stamped for nano step {got}, expected {expected}")]
    PatchStepMismatch { peer: usize, expected: u64, got: u64 },
    /// A received patch does not describe the region this link is configured for.
    #[error("patch from peer {peer} has region fingerprint {got:#018x}, expected {expected:#018x}")]
    RegionFingerprintMismatch { peer: usize, expected: u64, got: u64 },
    /// The peer tore down its stepper after a fatal error.
    #[error("peer {peer} aborted at nano step {nano_step}")]
    PeerAborted { peer: usize, nano_step: u64 },
    /// Incompatible wire format.
    #[error("patch wire version {got} does not match {expected}")]
    WireVersionMismatch { expected: u16, got: u16 },
    /// An attached observer failed. Non-critical observers are detached
    /// instead of surfacing this.
    #[error("observer `{name}` failed: {source}")]
    ObserverFailed {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Internal region invariant broken (canonical form violated).
    #[error("region invariant violated: {0}")]
    RegionInvariant(&'static str),
    /// A persisted snapshot could not be decoded.
    #[error("checkpoint is malformed: {0}")]
    CheckpointCorrupt(String),
    /// A persisted snapshot was written with a different cell wire format.
    #[error("checkpoint cell wire size {got} does not match {expected}")]
    CheckpointCellFormat { expected: u32, got: u32 },
    /// I/O failure while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
