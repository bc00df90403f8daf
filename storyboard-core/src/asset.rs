//! Rendered asset references placed on the exported timeline

use crate::Span;

/// A rendered still image and the span it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetRef {
    /// Display name, usually the image file name
    pub name: String,
    /// Image path, relative to the export base directory
    pub path: String,
    /// First frame of the owning span
    pub frame: i64,
    /// Length of the owning span in frames
    pub length: i64,
}

impl AssetRef {
    /// Creates a new asset reference
    pub fn new(name: impl Into<String>, path: impl Into<String>, frame: i64, length: i64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            frame,
            length,
        }
    }

    /// Creates an asset reference covering the given span
    pub fn for_span(name: impl Into<String>, path: impl Into<String>, span: &Span) -> Self {
        Self::new(name, path, span.frame, span.length)
    }
}
