//! # AccessGis Parallel
//!
//! Windowed processing strategies for raster construction stages.
//!
//! The speed and friction stages are embarrassingly parallel across disjoint
//! spatial windows: each window's computation depends only on the same
//! coordinates in all input rasters, never on neighboring windows. This
//! crate provides the window iteration and fan-out/merge machinery those
//! stages share: windows are computed concurrently (rayon worker pool when
//! the `parallel` feature is on) and merged by a single writer.
//!
//! The cost-distance engine deliberately does NOT use this crate — a
//! shortest path may cross the whole grid, so that computation cannot be
//! decomposed into independent windows.

pub mod maybe_rayon;
pub mod tiled;

pub use tiled::{process_windows, write_windows, Window, WindowIterator, DEFAULT_WINDOW_SIZE};
