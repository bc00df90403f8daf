//! Naming of the still images rendered for each span

use crate::{AssetRef, Result, Span};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// File holding the project version, looked up next to the scene file
pub const VERSION_FILE: &str = "VERSION.txt";

/// Prefix marking a path as relative to the scene's directory
const RELATIVE_PREFIX: &str = "//";

static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\W_]+").unwrap());

/// Replaces every run of non-word characters or underscores with a single `-`
pub fn slugify(name: &str) -> String {
    SLUG_SEPARATORS.replace_all(name, "-").into_owned()
}

/// Resolves a possibly `//`-relative path against a base directory
pub fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    base_dir.join(path.strip_prefix(RELATIVE_PREFIX).unwrap_or(path))
}

/// Reads the trimmed project version from `VERSION.txt` in `dir`, if present
pub fn read_version_file(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(VERSION_FILE);
    if !path.is_file() {
        debug!("No version file at {}", path.display());
        return Ok(None);
    }

    let version = std::fs::read_to_string(&path)?.trim().to_string();
    Ok(Some(version).filter(|v| !v.is_empty()))
}

/// Where the image for each span is rendered
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// Output root, `//`-relative to the scene directory by default
    pub root: String,
    /// Current source-control branch, empty when unknown
    pub branch: String,
    /// Optional project version
    pub version: Option<String>,
    /// Image file extension
    pub extension: String,
}

impl Default for RenderPlan {
    fn default() -> Self {
        Self {
            root: "//marker-frames".to_string(),
            branch: String::new(),
            version: None,
            extension: "jpg".to_string(),
        }
    }
}

/// A single image to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// Span the image stands for
    pub span: Span,
    /// Planned output path
    pub path: String,
    /// Whether the image has to be (re)rendered
    pub render: bool,
}

impl RenderPlan {
    /// Creates a plan under the default root for the given branch and version
    pub fn new(branch: impl Into<String>, version: Option<String>) -> Self {
        Self {
            branch: branch.into(),
            version,
            ..Self::default()
        }
    }

    /// File name of the image rendered for the `index`-th span
    pub fn file_name(&self, index: usize, span: &Span) -> String {
        format!(
            "mark-{:03}-frame-{:06}-{}.{}",
            index,
            span.frame,
            slugify(&span.name),
            self.extension
        )
    }

    /// Output path of the image rendered for the `index`-th span
    pub fn output_path(&self, index: usize, span: &Span) -> String {
        let file_name = self.file_name(index, span);
        let mut parts = vec![self.root.trim_end_matches('/')];
        if !self.branch.is_empty() {
            parts.push(&self.branch);
        }
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            parts.push(version);
        }
        parts.push(&file_name);
        parts.join("/")
    }

    /// Asset references for the images of all spans, in span order
    pub fn assets(&self, spans: &[Span]) -> Vec<AssetRef> {
        spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                AssetRef::for_span(self.file_name(i, span), self.output_path(i, span), span)
            })
            .collect()
    }

    /// Lists the images to produce under `base_dir`.
    ///
    /// Images that already exist are only rendered again when `overwrite` is set.
    pub fn jobs(&self, spans: &[Span], base_dir: &Path, overwrite: bool) -> Vec<RenderJob> {
        spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                let path = self.output_path(i, span);
                let exists = resolve(base_dir, &path).exists();
                if exists && !overwrite {
                    debug!("{} already exists, skipping render", path);
                }
                RenderJob {
                    span: span.clone(),
                    path,
                    render: overwrite || !exists,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Shot 01: wide"), "Shot-01-wide");
        assert_eq!(slugify("close_up__B"), "close-up-B");
        assert_eq!(slugify("start"), "start");
        assert_eq!(slugify("día final"), "día-final");
    }

    #[test]
    fn test_output_path() {
        let span = Span::new(48, "Hero shot", 12);

        let plan = RenderPlan::new("main", None);
        assert_eq!(
            plan.output_path(3, &span),
            "//marker-frames/main/mark-003-frame-000048-Hero-shot.jpg"
        );

        let versioned = RenderPlan::new("main", Some("1.2".to_string()));
        assert_eq!(
            versioned.output_path(3, &span),
            "//marker-frames/main/1.2/mark-003-frame-000048-Hero-shot.jpg"
        );

        let no_branch = RenderPlan::default();
        assert_eq!(
            no_branch.output_path(0, &span),
            "//marker-frames/mark-000-frame-000048-Hero-shot.jpg"
        );
    }

    #[test]
    fn test_assets_follow_spans() {
        let spans = vec![Span::new(0, "start", 10), Span::new(10, "A", 15)];
        let assets = RenderPlan::new("dev", None).assets(&spans);

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[1].name, "mark-001-frame-000010-A.jpg");
        assert_eq!(assets[1].path, "//marker-frames/dev/mark-001-frame-000010-A.jpg");
        assert_eq!((assets[1].frame, assets[1].length), (10, 15));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve(Path::new("/proj"), "//marker-frames/a.jpg"),
            PathBuf::from("/proj/marker-frames/a.jpg")
        );
        assert_eq!(
            resolve(Path::new("/proj"), "/abs/a.jpg"),
            PathBuf::from("/abs/a.jpg")
        );
    }

    #[test]
    fn test_jobs_skip_existing_images() {
        let dir = tempfile::tempdir().unwrap();
        let spans = vec![Span::new(0, "a", 5), Span::new(5, "b", 5)];
        let plan = RenderPlan::default();

        let existing = resolve(dir.path(), &plan.output_path(0, &spans[0]));
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"jpg").unwrap();

        let jobs = plan.jobs(&spans, dir.path(), false);
        assert!(!jobs[0].render);
        assert!(jobs[1].render);

        let forced = plan.jobs(&spans, dir.path(), true);
        assert!(forced.iter().all(|j| j.render));
    }

    #[test]
    fn test_read_version_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_version_file(dir.path()).unwrap(), None);

        std::fs::write(dir.path().join(VERSION_FILE), "  2.0.1\n").unwrap();
        assert_eq!(read_version_file(dir.path()).unwrap(), Some("2.0.1".to_string()));

        std::fs::write(dir.path().join(VERSION_FILE), "\n").unwrap();
        assert_eq!(read_version_file(dir.path()).unwrap(), None);
    }
}
