//! Speaker tracking and crop stabilization.
//!
//! An analysis pass turns per-frame face observations into a raw horizontal
//! crop path, the stabilizer smooths and shot-locks that path, and the
//! render pass applies it in a single FFmpeg invocation.

pub mod fast;
pub mod models;
pub mod render;
pub mod source;
pub mod speaker;
pub mod stabilizer;

pub use models::{CropFrame, CropGeometry, FaceBox, FaceLandmarks, TrackerSettings, TrackingMode};
pub use source::{FaceBoxSource, LandmarkSource};
