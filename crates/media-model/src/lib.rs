//! Proxygen Media Model
//!
//! Defines the value types that flow through the proxy pipeline:
//! - **Video:** A discovered source file and the container allow-list
//! - **Clip:** The fixed-length window cut from each source
//! - **Metadata:** Best-effort capture date and location per file
//! - **Title card:** Overlay lines and their fixed visual style
//! - **Result:** Per-file outcomes and the batch summary
//!
//! Every value is created for one file and consumed once; nothing here is
//! shared or mutated across files.

pub mod clip;
pub mod metadata;
pub mod result;
pub mod title_card;
pub mod video;

pub use clip::*;
pub use metadata::*;
pub use result::*;
pub use title_card::*;
pub use video::*;
