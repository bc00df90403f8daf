//! Storyboard Core Library
//!
//! This library turns timeline markers into contiguous spans, plans the
//! still images rendered for each span and serializes the resulting cut as
//! an FCPXML timeline for non-linear editors.

pub mod asset;
pub mod fcpxml;
pub mod marker;
pub mod render_plan;
pub mod snapshot;
pub mod span;

pub use asset::AssetRef;
pub use fcpxml::{serialize, serialize_with, write_fcpxml, FcpxmlOptions, TimelineFormat};
pub use marker::{Marker, SceneMarkers};
pub use render_plan::{read_version_file, slugify, RenderJob, RenderPlan};
pub use snapshot::{plan_snapshots, Snapshot, SnapshotConfig};
pub use span::{build_spans, non_empty, Span};

/// Result type for storyboard-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storyboard-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid frame range: end {end} is before start {start}")]
    InvalidRange { start: i64, end: i64 },

    #[error("Span from frame {frame} to {next} is longer than the frame limit")]
    SpanOverflow { frame: i64, next: i64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}
