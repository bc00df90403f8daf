//! FCPXML timeline serialization
//!
//! The exported document describes a single video track holding one still
//! image clip per asset, laid back to back at the offsets of their spans.
//! Time values are written as rationals over a time base of
//! `100 * fps_den / 100 * fps_num` seconds so editors never have to round.

use crate::render_plan::resolve;
use crate::{AssetRef, Error, Result};
use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

/// FCPXML dialect version written to the root element
pub const FCPXML_VERSION: &str = "1.6";

/// Fixed-point factor applied to both sides of every time rational
const TIME_SCALE: i64 = 100;

/// Format id of the sequence format carrying the frame duration
const SEQUENCE_FORMAT_ID: &str = "r1";

/// Format id referenced by every still image asset
const ASSET_FORMAT_ID: &str = "r2";

/// Asset ids start after the three format resources
const FIRST_ASSET_ID: usize = 4;

/// Frame rate and resolution of the exported timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimelineFormat {
    /// Frame rate numerator
    pub fps_num: u32,
    /// Frame rate denominator
    pub fps_den: u32,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Default for TimelineFormat {
    fn default() -> Self {
        Self {
            fps_num: 24,
            fps_den: 1,
            width: 1920,
            height: 1080,
        }
    }
}

impl TimelineFormat {
    /// Creates a new timeline format
    pub fn new(fps_num: u32, fps_den: u32, width: u32, height: u32) -> Self {
        Self {
            fps_num,
            fps_den,
            width,
            height,
        }
    }

    /// Checks that the frame rate and resolution are usable
    pub fn validate(&self) -> Result<()> {
        if self.fps_num == 0 || self.fps_den == 0 {
            return Err(Error::Serialization(format!(
                "frame rate must be positive, got {}/{}",
                self.fps_num, self.fps_den
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Serialization(format!(
                "resolution must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Renders a frame count as a rational time string, e.g. `"1200/2400s"`
    pub fn rational(&self, frames: i64) -> Result<String> {
        let numerator = (TIME_SCALE * i64::from(self.fps_den))
            .checked_mul(frames)
            .ok_or_else(|| {
                Error::Serialization(format!(
                    "frame count {} overflows the {}/{} time base",
                    frames, self.fps_num, self.fps_den
                ))
            })?;
        Ok(format!(
            "{}/{}s",
            numerator,
            TIME_SCALE * i64::from(self.fps_num)
        ))
    }

    /// Duration of a single frame as a rational time string
    pub fn frame_duration(&self) -> Result<String> {
        self.rational(1)
    }

    /// Calculates the frame rate as a float
    pub fn fps(&self) -> f64 {
        self.fps_num as f64 / self.fps_den as f64
    }
}

/// Names given to the containers of the exported cut
#[derive(Debug, Clone)]
pub struct FcpxmlOptions {
    /// Name of the library event
    pub event_name: String,
    /// Name of the project holding the sequence
    pub project_name: String,
}

impl Default for FcpxmlOptions {
    fn default() -> Self {
        Self {
            event_name: "Blender Storyboards".to_string(),
            project_name: "text".to_string(),
        }
    }
}

/// Serializes the assets into an FCPXML document using default container names
pub fn serialize(assets: &[AssetRef], format: &TimelineFormat, base_dir: &str) -> Result<String> {
    serialize_with(assets, format, base_dir, &FcpxmlOptions::default())
}

/// Serializes the assets into an FCPXML document.
///
/// Assets keep their input order, which is the playback order in the editor.
/// Inputs are validated up front so that either a complete document is
/// returned or nothing is.
pub fn serialize_with(
    assets: &[AssetRef],
    format: &TimelineFormat,
    base_dir: &str,
    options: &FcpxmlOptions,
) -> Result<String> {
    validate(assets, format)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::DocType(BytesText::from_escaped("fcpxml")))?;
    start(&mut writer, "fcpxml", &[("version", FCPXML_VERSION)])?;

    write_resources(&mut writer, assets, format, base_dir)?;
    write_library(&mut writer, assets, format, options)?;

    end(&mut writer, "fcpxml")?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    debug!("Serialized {} assets into {} bytes", assets.len(), bytes.len());

    String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Serializes the assets and writes the document to `path`.
///
/// The document goes to a temporary file next to `path` first and is only
/// moved into place once fully written.
pub fn write_fcpxml(
    path: &Path,
    assets: &[AssetRef],
    format: &TimelineFormat,
    base_dir: &str,
    options: &FcpxmlOptions,
) -> Result<()> {
    let document = serialize_with(assets, format, base_dir, options)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(document.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    info!("Wrote FCPXML with {} clips to {}", assets.len(), path.display());
    Ok(())
}

fn validate(assets: &[AssetRef], format: &TimelineFormat) -> Result<()> {
    format.validate()?;

    for (i, asset) in assets.iter().enumerate() {
        if asset.name.trim().is_empty() {
            return Err(Error::Serialization(format!("asset {} has an empty name", i)));
        }
        if asset.path.trim().is_empty() {
            return Err(Error::Serialization(format!(
                "asset {} ({}) has an empty path",
                i, asset.name
            )));
        }
        if asset.length < 0 {
            return Err(Error::Serialization(format!(
                "asset {} ({}) has negative length {}",
                i, asset.name, asset.length
            )));
        }
        format.rational(asset.frame)?;
        format.rational(asset.length)?;
    }

    Ok(())
}

fn write_resources<W: Write>(
    writer: &mut Writer<W>,
    assets: &[AssetRef],
    format: &TimelineFormat,
    base_dir: &str,
) -> Result<()> {
    let width = format.width.to_string();
    let height = format.height.to_string();
    let frame_duration = format.frame_duration()?;

    start(writer, "resources", &[])?;

    empty(
        writer,
        "format",
        &[
            ("id", SEQUENCE_FORMAT_ID),
            ("frameDuration", frame_duration.as_str()),
            ("width", width.as_str()),
            ("height", height.as_str()),
        ],
    )?;
    empty(
        writer,
        "format",
        &[
            ("id", ASSET_FORMAT_ID),
            ("name", "FFVideoFormatRateUndefined"),
            ("width", width.as_str()),
            ("height", height.as_str()),
        ],
    )?;
    empty(
        writer,
        "format",
        &[("id", "r3"), ("name", "FFVideoFormatRateUndefined")],
    )?;

    for (i, asset) in assets.iter().enumerate() {
        let id = asset_id(i);
        let src = asset_src(base_dir, &asset.path);
        empty(
            writer,
            "asset",
            &[
                ("id", id.as_str()),
                ("name", asset.name.as_str()),
                ("src", src.as_str()),
                ("start", "0s"),
                ("duration", "0s"),
                ("hasVideo", "1"),
                ("format", ASSET_FORMAT_ID),
            ],
        )?;
    }

    end(writer, "resources")
}

fn write_library<W: Write>(
    writer: &mut Writer<W>,
    assets: &[AssetRef],
    format: &TimelineFormat,
    options: &FcpxmlOptions,
) -> Result<()> {
    start(writer, "library", &[])?;
    start(writer, "event", &[("name", options.event_name.as_str())])?;
    start(writer, "project", &[("name", options.project_name.as_str())])?;
    start(
        writer,
        "sequence",
        &[("format", SEQUENCE_FORMAT_ID), ("renderColorSpace", "Rec. 709")],
    )?;
    start(writer, "spine", &[])?;

    for (i, asset) in assets.iter().enumerate() {
        let name = format!("{}A", i + 1);
        let offset = format.rational(asset.frame)?;
        let id = asset_id(i);
        let duration = format.rational(asset.length)?;
        start(
            writer,
            "video",
            &[
                ("name", name.as_str()),
                ("offset", offset.as_str()),
                ("ref", id.as_str()),
                ("duration", duration.as_str()),
                ("start", "0s"),
            ],
        )?;
        end(writer, "video")?;
    }

    end(writer, "spine")?;
    end(writer, "sequence")?;
    end(writer, "project")?;
    end(writer, "event")?;
    end(writer, "library")
}

fn asset_id(index: usize) -> String {
    format!("r{}", index + FIRST_ASSET_ID)
}

fn asset_src(base_dir: &str, path: &str) -> String {
    resolve(Path::new(base_dir), path)
        .to_string_lossy()
        .into_owned()
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn empty<W: Write>(writer: &mut Writer<W>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
