//! Proxygen Render Engine
//!
//! Turns a planned clip into a proxy file by driving an external codec.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mov ──┐
//!              ├── Seek + Extract (clip window)
//!              │         │
//!              │         ├── Scale (target width, aspect preserved)
//!              │         │         │
//! title card ──┴─────────┴─────────├── drawtext overlay
//!                                  │
//!                                  ▼
//!                           Encode (H.264 / AAC)
//!                                  │
//!                                  ▼
//!                     .proxygen-*.partial.mp4 ──rename──▶ clip_proxy.mp4
//! ```

pub mod codec;
pub mod compositor;
pub mod ffmpeg;
pub mod renderer;

pub use codec::{CodecOptions, MediaCodec, MediaInfo, RenderRequest};
pub use ffmpeg::{FfmpegCodec, FfprobeTags};
pub use renderer::{ProxyRenderer, RenderTarget};
