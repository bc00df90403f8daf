//! Selection of viewport snapshots by marker name

use crate::Marker;

/// Which markers get a snapshot and how the images are named
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Markers whose name equals this pattern are exported
    pub marker_pattern: String,
    /// Prefix of every exported image name
    pub export_name: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            marker_pattern: "_storyboard".to_string(),
            export_name: "export name".to_string(),
        }
    }
}

/// A snapshot to take at a marker frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Frame to capture
    pub frame: i64,
    /// Output image name, without extension
    pub name: String,
}

/// Plans one snapshot per marker matching the configured pattern.
///
/// Markers keep their input order and snapshots are numbered from `000`.
pub fn plan_snapshots(markers: &[Marker], config: &SnapshotConfig) -> Vec<Snapshot> {
    markers
        .iter()
        .filter(|m| m.name == config.marker_pattern)
        .enumerate()
        .map(|(n, m)| Snapshot {
            frame: m.frame,
            name: format!("{}{:03}", config.export_name, n),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_snapshots() {
        let markers = vec![
            Marker::new(30, "_storyboard"),
            Marker::new(5, "intro"),
            Marker::new(10, "_storyboard"),
            Marker::new(12, "_storyboard_alt"),
        ];
        let config = SnapshotConfig {
            export_name: "board".to_string(),
            ..SnapshotConfig::default()
        };

        assert_eq!(
            plan_snapshots(&markers, &config),
            vec![
                Snapshot { frame: 30, name: "board000".to_string() },
                Snapshot { frame: 10, name: "board001".to_string() },
            ]
        );
    }

    #[test]
    fn test_no_matching_markers() {
        let markers = vec![Marker::new(1, "a")];
        assert!(plan_snapshots(&markers, &SnapshotConfig::default()).is_empty());
    }
}
