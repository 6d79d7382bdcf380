//! Publishing pipeline: source files in, numbered JPEGs out.
//!
//! ```text
//! collect_inputs   files + directories  →  ordered image paths
//! load_sources     paths                →  decoded sources (failures skipped)
//! prepare          sources + config     →  composites or pass-through buffers,
//!                                          each optimized when enabled
//! write_outputs    buffers              →  {prefix}-001.jpg, {prefix}-002.jpg, …
//! write_manifest   buffers + paths      →  manifest.json (origin + optimizer report)
//! ```
//!
//! Combination runs only when enabled and at least two sources decoded; a
//! lone photo is never wrapped in a composite. When combination is off each
//! original file's bytes pass through untouched to the optimizer (or straight
//! to disk when optimization is off too).
//!
//! Progress is reported as [`PipelineEvent`]s over an optional channel so
//! the CLI can print while work continues. Events are sent in output order.

use crate::config::{CatalogConfig, ConfigError};
use crate::imaging::rust_backend::has_supported_extension;
use crate::imaging::{
    CombinationSettings, ImageBackend, ImagingError, OptimizationResult, OptimizationSettings,
    RustBackend, SourceImage, combine_with_backend, optimize_with_backend,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Imaging error: {0}")]
    Imaging(#[from] ImagingError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No usable images among the inputs")]
    NoUsableImages,
}

/// Progress notifications, in output order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A source could not be read or decoded and was left out.
    SourceSkipped { path: PathBuf, reason: String },
    /// A composite was rendered from `sources` (file names).
    Combined {
        chunk: usize,
        sources: Vec<String>,
        width: u32,
        height: u32,
        bytes: usize,
    },
    /// Output `index` went through the byte-budget search.
    Optimized {
        index: usize,
        original_bytes: usize,
        optimized_bytes: usize,
        quality: u32,
        width: u32,
        height: u32,
        target_achieved: bool,
    },
}

/// A decoded source together with the bytes it was decoded from.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub image: SourceImage,
}

/// Where a prepared buffer came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Composite number `chunk` (0-based) covering these sources.
    Combined { chunk: usize, sources: Vec<PathBuf> },
    /// One source file, not combined.
    Single(PathBuf),
}

/// Optimizer outcome without the encoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub original_bytes: usize,
    pub optimized_bytes: usize,
    pub quality: u32,
    pub width: u32,
    pub height: u32,
    pub target_achieved: bool,
}

impl From<&OptimizationResult> for OptimizationReport {
    fn from(result: &OptimizationResult) -> Self {
        Self {
            original_bytes: result.original_bytes,
            optimized_bytes: result.optimized_bytes(),
            quality: result.quality.value(),
            width: result.width,
            height: result.height,
            target_achieved: result.target_achieved,
        }
    }
}

/// One output buffer, ready to be written.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub origin: Origin,
    /// Present when the optimizer ran on this buffer.
    pub optimization: Option<OptimizationReport>,
}

fn emit(events: Option<&Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Expand command-line inputs into an ordered list of image files.
///
/// Files are kept as given. Directories are walked recursively in file-name
/// order and contribute only files with a supported image extension.
pub fn collect_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if has_supported_extension(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable directory entry"),
            }
        }
    }
    paths
}

/// Read and decode every path, skipping failures.
pub fn load_sources(
    paths: &[PathBuf],
    events: Option<&Sender<PipelineEvent>>,
) -> Vec<LoadedSource> {
    load_sources_with_backend(&RustBackend::new(), paths, events)
}

/// Load using a specific backend (allows testing with mock).
pub fn load_sources_with_backend(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    events: Option<&Sender<PipelineEvent>>,
) -> Vec<LoadedSource> {
    let attempts: Vec<Result<LoadedSource, String>> = paths
        .par_iter()
        .map(|path| {
            let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
            let image = backend.decode(&bytes).map_err(|e| e.to_string())?;
            Ok(LoadedSource {
                path: path.clone(),
                bytes,
                image: SourceImage::new(image, file_label(path)),
            })
        })
        .collect();

    let mut loaded = Vec::with_capacity(attempts.len());
    for (path, attempt) in paths.iter().zip(attempts) {
        match attempt {
            Ok(source) => loaded.push(source),
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "skipping source");
                emit(
                    events,
                    PipelineEvent::SourceSkipped {
                        path: path.clone(),
                        reason,
                    },
                );
            }
        }
    }
    loaded
}

/// Load, combine and optimize according to `config`.
///
/// Fails with [`PipelineError::NoUsableImages`] when no input decodes.
pub fn prepare(
    paths: &[PathBuf],
    config: &CatalogConfig,
    events: Option<Sender<PipelineEvent>>,
) -> Result<Vec<PreparedImage>, PipelineError> {
    prepare_with_backend(&RustBackend::new(), paths, config, events)
}

/// Prepare using a specific backend (allows testing with mock).
pub fn prepare_with_backend(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    config: &CatalogConfig,
    events: Option<Sender<PipelineEvent>>,
) -> Result<Vec<PreparedImage>, PipelineError> {
    let events = events.as_ref();
    let sources = load_sources_with_backend(backend, paths, events);
    if sources.is_empty() {
        return Err(PipelineError::NoUsableImages);
    }
    let source_count = sources.len();

    let mut prepared = if config.combination.enabled && sources.len() >= 2 {
        combine_sources(backend, sources, &CombinationSettings::from(&config.combination), events)?
    } else {
        sources
            .into_iter()
            .map(|source| PreparedImage {
                data: source.bytes,
                origin: Origin::Single(source.path),
                optimization: None,
            })
            .collect()
    };

    if config.optimization.enabled {
        let settings = OptimizationSettings::from(&config.optimization);
        let results: Vec<OptimizationResult> = prepared
            .par_iter()
            .map(|image| optimize_with_backend(backend, &image.data, &settings))
            .collect::<Result<_, _>>()?;

        for (index, (image, result)) in prepared.iter_mut().zip(results).enumerate() {
            let report = OptimizationReport::from(&result);
            emit(
                events,
                PipelineEvent::Optimized {
                    index,
                    original_bytes: report.original_bytes,
                    optimized_bytes: report.optimized_bytes,
                    quality: report.quality,
                    width: report.width,
                    height: report.height,
                    target_achieved: report.target_achieved,
                },
            );
            image.data = result.data;
            image.optimization = Some(report);
        }
    }

    tracing::info!(
        sources = source_count,
        outputs = prepared.len(),
        combined = config.combination.enabled,
        optimized = config.optimization.enabled,
        "prepared images"
    );
    Ok(prepared)
}

fn combine_sources(
    backend: &impl ImageBackend,
    sources: Vec<LoadedSource>,
    settings: &CombinationSettings,
    events: Option<&Sender<PipelineEvent>>,
) -> Result<Vec<PreparedImage>, PipelineError> {
    let (paths, images): (Vec<PathBuf>, Vec<SourceImage>) =
        sources.into_iter().map(|s| (s.path, s.image)).unzip();

    let combined = combine_with_backend(backend, &images, settings)?;

    Ok(combined
        .into_iter()
        .enumerate()
        .map(|(chunk, composite)| {
            emit(
                events,
                PipelineEvent::Combined {
                    chunk,
                    sources: images[composite.sources.clone()]
                        .iter()
                        .map(|s| s.label.clone())
                        .collect(),
                    width: composite.plan.canvas_width,
                    height: composite.plan.canvas_height,
                    bytes: composite.data.len(),
                },
            );
            PreparedImage {
                data: composite.data,
                origin: Origin::Combined {
                    chunk,
                    sources: paths[composite.sources].to_vec(),
                },
                optimization: None,
            }
        })
        .collect())
}

/// File extension matching the buffer's actual format (JPEG when unknown).
fn extension_for(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("jpg")
}

/// Write buffers as `{prefix}-001.{ext}`, … into `dir`, creating it if needed.
///
/// Returns the written paths in order.
pub fn write_outputs(
    images: &[PreparedImage],
    dir: &Path,
    prefix: &str,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir)?;
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let path = dir.join(format!("{prefix}-{:03}.{}", i + 1, extension_for(&image.data)));
            std::fs::write(&path, &image.data)?;
            Ok(path)
        })
        .collect()
}

/// File name of the JSON summary written next to the outputs.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Serialize)]
struct ManifestEntry<'a> {
    file: String,
    origin: &'a Origin,
    optimization: Option<OptimizationReport>,
}

/// Write `manifest.json` into `dir`, one entry per written file.
///
/// `written` must be the paths [`write_outputs`] returned for `images`.
pub fn write_manifest(
    images: &[PreparedImage],
    written: &[PathBuf],
    dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let entries: Vec<ManifestEntry> = images
        .iter()
        .zip(written)
        .map(|(image, path)| ManifestEntry {
            file: file_label(path),
            origin: &image.origin,
            optimization: image.optimization,
        })
        .collect();
    let path = dir.join(MANIFEST_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
    Ok(path)
}
