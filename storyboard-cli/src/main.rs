//! Storyboard CLI Tool
//!
//! Command-line interface for turning timeline markers into storyboard cuts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;
use storyboard_core::{
    build_spans, non_empty, plan_snapshots, read_version_file, write_fcpxml, FcpxmlOptions,
    RenderPlan, SceneMarkers, SnapshotConfig, Span,
};

/// Default name of the exported timeline, written to the base directory
const DEFAULT_FCPXML_NAME: &str = "Blender_Storyboards.fcpxml";

#[derive(Parser)]
#[command(name = "storyboard")]
#[command(about = "Storyboard - Cut timeline markers into spans and export them as FCPXML")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the spans built from a scene's markers
    Spans {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Print spans as JSON
        #[arg(long)]
        json: bool,

        /// Drop spans that cover no frames
        #[arg(long)]
        non_empty: bool,
    },

    /// Plan marker images and export the cut as FCPXML
    Export {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Directory the scene lives in (defaults to the scene file's directory)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Output FCPXML file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Branch folder for rendered images (detected from git when omitted)
        #[arg(long)]
        branch: Option<String>,

        /// Version folder for rendered images (read from VERSION.txt when omitted)
        #[arg(long = "render-version")]
        render_version: Option<String>,

        /// Plan existing images for rendering again
        #[arg(long)]
        overwrite: bool,

        /// Only plan the images, do not write FCPXML
        #[arg(long)]
        no_fcpxml: bool,

        /// Name of the FCPXML event
        #[arg(long, default_value = "Blender Storyboards")]
        event_name: String,

        /// Name of the FCPXML project
        #[arg(long, default_value = "text")]
        project_name: String,
    },

    /// List the snapshots to take at markers matching a name pattern
    Snapshots {
        /// Scene description (JSON)
        scene: PathBuf,

        /// Marker name to match
        #[arg(long, default_value = "_storyboard")]
        pattern: String,

        /// Prefix of the exported image names
        #[arg(long, default_value = "export name")]
        export_name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Spans {
            scene,
            json,
            non_empty,
        } => show_spans(scene, json, non_empty)?,

        Commands::Export {
            scene,
            base_dir,
            output,
            branch,
            render_version,
            overwrite,
            no_fcpxml,
            event_name,
            project_name,
        } => {
            let options = FcpxmlOptions {
                event_name,
                project_name,
            };
            export(
                scene,
                base_dir,
                output,
                branch,
                render_version,
                overwrite,
                !no_fcpxml,
                options,
            )?
        }

        Commands::Snapshots {
            scene,
            pattern,
            export_name,
        } => {
            let config = SnapshotConfig {
                marker_pattern: pattern,
                export_name,
            };
            show_snapshots(scene, &config)?
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> Result<SceneMarkers> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open scene file {}", path.display()))?;
    let scene = SceneMarkers::read(BufReader::new(file)).context("Failed to parse scene file")?;
    debug!(
        "Loaded {} markers, frames {}..={}",
        scene.markers.len(),
        scene.frame_start,
        scene.frame_end
    );
    Ok(scene)
}

fn scene_spans(scene: &SceneMarkers) -> Result<Vec<Span>> {
    build_spans(&scene.markers, scene.frame_start, scene.frame_end)
        .context("Failed to build spans from markers")
}

fn show_spans(scene_path: PathBuf, json: bool, drop_empty: bool) -> Result<()> {
    let scene = load_scene(&scene_path)?;
    let mut spans = scene_spans(&scene)?;
    if drop_empty {
        spans = non_empty(spans);
    }

    if json {
        let out = serde_json::to_string_pretty(&spans).context("Failed to encode spans")?;
        println!("{}", out);
        return Ok(());
    }

    println!("\n=== Scene ===");
    println!("Frames: {} to {}", scene.frame_start, scene.frame_end);
    println!(
        "Frame rate: {}/{} ({:.2} fps)",
        scene.format.fps_num,
        scene.format.fps_den,
        scene.format.fps()
    );
    println!("Resolution: {}x{}", scene.format.width, scene.format.height);
    println!("Markers: {}", scene.markers.len());

    println!("\n=== Spans ===");
    if spans.is_empty() {
        println!("  No markers within the frame range");
    }
    for (i, span) in spans.iter().enumerate() {
        println!(
            "  [{}] {} at frame {} for {} frames",
            i, span.name, span.frame, span.length
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn export(
    scene_path: PathBuf,
    base_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    branch: Option<String>,
    render_version: Option<String>,
    overwrite: bool,
    save_fcpxml: bool,
    options: FcpxmlOptions,
) -> Result<()> {
    println!("Exporting markers from: {}", scene_path.display());

    let scene = load_scene(&scene_path)?;
    let base_dir = base_dir.unwrap_or_else(|| scene_dir(&scene_path));

    let version = match render_version {
        Some(version) => Some(version),
        None => read_version_file(&base_dir).context("Failed to read version file")?,
    };
    let branch = branch.unwrap_or_else(|| current_branch(&base_dir));
    println!("Branch: {:?}, version: {:?}", branch, version);

    let spans = scene_spans(&scene)?;
    if spans.is_empty() {
        warn!("No markers between frames {} and {}", scene.frame_start, scene.frame_end);
    }

    let plan = RenderPlan::new(branch, version);
    let jobs = plan.jobs(&spans, &base_dir, overwrite);
    for job in &jobs {
        let status = if job.render { "render" } else { "skip (exists)" };
        println!("  frame {:>6} {:<14} {}", job.span.frame, status, job.path);
    }
    let pending = jobs.iter().filter(|j| j.render).count();
    println!("Planned {} marker images, {} to render", jobs.len(), pending);

    if !save_fcpxml {
        return Ok(());
    }

    let output = output.unwrap_or_else(|| base_dir.join(DEFAULT_FCPXML_NAME));
    let assets = plan.assets(&spans);
    write_fcpxml(
        &output,
        &assets,
        &scene.format,
        &base_dir.to_string_lossy(),
        &options,
    )
    .context("Failed to write FCPXML")?;

    println!(
        "Successfully exported {} clips to {}",
        assets.len(),
        output.display()
    );

    Ok(())
}

fn show_snapshots(scene_path: PathBuf, config: &SnapshotConfig) -> Result<()> {
    let scene = load_scene(&scene_path)?;
    let snapshots = plan_snapshots(&scene.markers, config);

    println!(
        "{} markers named {:?}",
        snapshots.len(),
        config.marker_pattern
    );
    for snapshot in &snapshots {
        println!("  frame {:>6} -> {}", snapshot.frame, snapshot.name);
    }

    Ok(())
}

fn scene_dir(scene_path: &Path) -> PathBuf {
    match scene_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Returns the checked-out git branch of `dir`, or an empty string
fn current_branch(dir: &Path) -> String {
    let output = Command::new("git")
        .args(["branch", "--show-current"])
        .current_dir(dir)
        .output();

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        Ok(out) => {
            debug!(
                "git branch failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
            String::new()
        }
        Err(e) => {
            debug!("Could not run git: {}", e);
            String::new()
        }
    }
}
