//! # Catalog Imaging
//!
//! Prepares product photographs for a catalog or marketplace listing: several
//! shots of one product become composite images on a clean white canvas, and
//! every output is re-encoded as a JPEG that fits under a byte budget.
//!
//! # Architecture: Two Engines and a Caller
//!
//! ```text
//! sources ──▶ Layout Engine ──▶ Compositor ──▶ Optimizer ──▶ {prefix}-001.jpg …
//!             (pure geometry)   (pixels)       (size search)
//! ```
//!
//! The engines know nothing about files, configuration, or each other's
//! toggles. The [`pipeline`] is the caller: it decodes inputs, decides
//! whether to combine and whether to optimize, and writes the results.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Layout engine, compositor, optimizer, and the [`ImageBackend`](imaging::ImageBackend) seam |
//! | [`pipeline`] | Loads sources (skipping failures), applies the combine/optimize toggles, writes outputs |
//! | [`config`] | `config.toml` loading, validation, merging over stock defaults |
//! | [`output`] | CLI output formatting for pipeline events and reports |
//!
//! # Design Decisions
//!
//! ## Layout Is Pure Geometry
//!
//! [`imaging::compute_layout`] takes only dimensions and settings and returns
//! a plan of integer rectangles. Every placement invariant (containment, no
//! overlap, no upscaling of the primary image) is checkable without touching
//! a pixel, which is what the property tests do.
//!
//! ## Deterministic Size Search
//!
//! The optimizer walks a fixed ladder: quality first at full size, then
//! shrinking dimensions with a coarser quality ladder. Same bytes and settings
//! always produce the same output, and an unreachable budget is reported
//! (`target_achieved = false`) rather than treated as an error.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and JPEG encoding all come from the `image`
//! crate. There are no system libraries to install.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;
