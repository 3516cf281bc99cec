//! Proxygen Processing Core
//!
//! Plans each proxy before any media work happens:
//! - **Discovery:** Walk the source tree for allow-listed containers
//! - **Metadata:** Resolve capture date and location through a fallback chain
//! - **Clip Selection:** Pick a random fixed-length window inside the source
//! - **Title Cards:** Turn metadata into overlay lines
//! - **Naming:** Assign collision-free output file names
//!
//! Apart from discovery and the metadata stat call, everything here is pure
//! computation. Randomness and embedded-tag readers are injected.

pub mod clip_select;
pub mod discovery;
pub mod metadata;
pub mod naming;
pub mod title_card;

pub use clip_select::{ClipSelector, RandomSource, SeededRandom, ThreadRandom};
pub use discovery::discover;
pub use metadata::{EmbeddedMetadata, EmbeddedTags, MetadataResolver, NoEmbeddedMetadata};
pub use naming::{derive_output_name, plan_output_names};
pub use title_card::TitleCardComposer;
