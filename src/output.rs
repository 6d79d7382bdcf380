//! CLI output formatting for pipeline progress and results.
//!
//! # Display Contract
//!
//! Every output follows the same two-level pattern:
//!
//! 1. **Header line**: 1-based positional index + what was produced
//! 2. **Context lines**: indented `Source:` lines and warnings
//!
//! # Output Format
//!
//! ## Publish / Combine
//!
//! ```text
//! skipped broken.jpg: Decode failed: ...
//! 001 composite 1920x1080 (412.0 KB)
//!     Source: front.jpg
//!     Source: back.jpg
//! 001 optimized 1920x1080 q80: 412.0 KB → 388.5 KB
//! Wrote 1 file to out/
//!     out/product-001.jpg
//! ```
//!
//! ## Optimize
//!
//! ```text
//! hero.jpg → hero-small.jpg
//!     1600x1200 q45: 2.4 MB → 498.2 KB (20.3%)
//!     warning: 500.0 KB budget not reached, kept smallest attempt
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::OptimizationResult;
use crate::pipeline::PipelineEvent;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count (1024-based).
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Pipeline events
// ============================================================================

/// Format a single pipeline event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::SourceSkipped { path, reason } => {
            vec![format!("skipped {}: {}", file_name(path), reason)]
        }
        PipelineEvent::Combined {
            chunk,
            sources,
            width,
            height,
            bytes,
        } => {
            let mut lines = vec![format!(
                "{} composite {}x{} ({})",
                format_index(chunk + 1),
                width,
                height,
                format_size(*bytes)
            )];
            lines.extend(
                sources
                    .iter()
                    .map(|s| format!("{}Source: {}", indent(1), s)),
            );
            lines
        }
        PipelineEvent::Optimized {
            index,
            original_bytes,
            optimized_bytes,
            quality,
            width,
            height,
            target_achieved,
        } => {
            let mut lines = vec![format!(
                "{} optimized {}x{} q{}: {} → {}",
                format_index(index + 1),
                width,
                height,
                quality,
                format_size(*original_bytes),
                format_size(*optimized_bytes)
            )];
            if !target_achieved {
                lines.push(format!(
                    "{}warning: budget not reached, kept smallest attempt",
                    indent(1)
                ));
            }
            lines
        }
    }
}

// ============================================================================
// Optimize command
// ============================================================================

/// Format the report for a single-file optimization.
pub fn format_optimization(
    input: &Path,
    output: &Path,
    result: &OptimizationResult,
    budget_bytes: usize,
) -> Vec<String> {
    let mut lines = vec![
        format!("{} → {}", file_name(input), file_name(output)),
        format!(
            "{}{}x{} q{}: {} → {} ({:.1}%)",
            indent(1),
            result.width,
            result.height,
            result.quality.value(),
            format_size(result.original_bytes),
            format_size(result.optimized_bytes()),
            result.ratio() * 100.0
        ),
    ];
    if !result.target_achieved {
        lines.push(format!(
            "{}warning: {} budget not reached, kept smallest attempt",
            indent(1),
            format_size(budget_bytes)
        ));
    }
    lines
}

pub fn print_optimization(
    input: &Path,
    output: &Path,
    result: &OptimizationResult,
    budget_bytes: usize,
) {
    for line in format_optimization(input, output, result, budget_bytes) {
        println!("{}", line);
    }
}

// ============================================================================
// Written files
// ============================================================================

/// Summary of files written to `dir`.
pub fn format_written(dir: &Path, paths: &[PathBuf]) -> Vec<String> {
    let noun = if paths.len() == 1 { "file" } else { "files" };
    let mut lines = vec![format!(
        "Wrote {} {} to {}",
        paths.len(),
        noun,
        dir.display()
    )];
    lines.extend(
        paths
            .iter()
            .map(|p| format!("{}{}", indent(1), p.display())),
    );
    lines
}

pub fn print_written(dir: &Path, paths: &[PathBuf]) {
    for line in format_written(dir, paths) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
