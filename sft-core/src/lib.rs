//! # sft-core
//!
//! Pure transfer logic for sealbox (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms behind blob
//! transfers without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about pipeline transitions
//!
//! The actual I/O (REST calls, block storage, disk) is performed by
//! `sft-client`, which interprets the actions produced by these state
//! machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod block;
pub mod progress;
pub mod state;

pub use backoff::{retry_delay, MAX_RETRY_DELAY};
pub use block::{
    block_list_xml, BlockId, BlockPlan, BlockSpan, PlanError, TransferBlock, BLOCK_SIZE,
    MAX_BLOCKS_PER_BLOB,
};
pub use progress::{Direction, Progress};
pub use state::{
    AbortReason, DownloadAction, DownloadEvent, DownloadState, UploadAction, UploadEvent,
    UploadState,
};
