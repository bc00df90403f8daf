//! Timeline markers and the scene description they come from

use crate::fcpxml::TimelineFormat;

/// A named point on the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Frame the marker sits on
    pub frame: i64,
    /// Marker label
    pub name: String,
}

impl Marker {
    /// Creates a new marker
    pub fn new(frame: i64, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

/// Markers of a scene together with its working frame range and output format
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneMarkers {
    /// First frame of the working range
    pub frame_start: i64,
    /// Last frame of the working range (inclusive)
    pub frame_end: i64,
    /// Frame rate and resolution used for the exported timeline
    #[cfg_attr(feature = "serde", serde(default))]
    pub format: TimelineFormat,
    /// Markers in any order
    #[cfg_attr(feature = "serde", serde(default))]
    pub markers: Vec<Marker>,
}

#[cfg(feature = "serde")]
impl SceneMarkers {
    /// Parses a scene description from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a scene description from a JSON file
    pub fn read<R: std::io::Read>(reader: R) -> crate::Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
