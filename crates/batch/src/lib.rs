//! Proxygen Batch Orchestration
//!
//! Drives discovery and the per-file pipeline over a whole source tree:
//!
//! ```text
//! discover ─▶ plan names ─▶ ┬─ file 1: metadata ─▶ probe ─▶ window ─▶ card ─▶ render
//!                           ├─ file 2: ...
//!                           └─ file N: ...          (at most `jobs` at once)
//!                                      │
//!                                      ▼
//!                         results in discovery order ─▶ BatchSummary
//! ```
//!
//! Per-file failures never stop the batch; only a bad source directory, an
//! uncreatable output directory, or a missing codec do.

pub mod orchestrator;
pub mod pipeline;
pub mod progress;

pub use orchestrator::{BatchOptions, BatchOrchestrator, BatchReport};
pub use pipeline::{FilePipeline, FileStage};
pub use progress::{NullProgress, ProgressSink};
