//! Windowed processing for large rasters

use crate::maybe_rayon::*;
use accessgis_core::raster::{Raster, RasterElement};
use ndarray::Array2;

/// Default window edge length, matching the 256x256 block layout of the
/// pipeline's tiled GeoTIFF outputs.
pub const DEFAULT_WINDOW_SIZE: usize = 256;

/// A rectangular window into a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Row offset in the source raster
    pub row_off: usize,
    /// Column offset in the source raster
    pub col_off: usize,
    /// Number of rows in this window
    pub rows: usize,
    /// Number of columns in this window
    pub cols: usize,
}

impl Window {
    /// Create a new window
    pub fn new(row_off: usize, col_off: usize, rows: usize, cols: usize) -> Self {
        Self {
            row_off,
            col_off,
            rows,
            cols,
        }
    }

    /// Number of cells covered by this window
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the window covers no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert window-local coordinates to source raster coordinates
    pub fn to_source_coords(&self, local_row: usize, local_col: usize) -> (usize, usize) {
        (self.row_off + local_row, self.col_off + local_col)
    }
}

/// Iterator over fixed-size windows covering a raster.
///
/// Windows are yielded row-major; edge windows are clipped to the raster
/// bounds. Every cell belongs to exactly one window.
pub struct WindowIterator {
    total_rows: usize,
    total_cols: usize,
    window_size: usize,
    current_row: usize,
    current_col: usize,
}

impl WindowIterator {
    /// Create a new window iterator over a raster of the given shape
    pub fn new(total_rows: usize, total_cols: usize, window_size: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            window_size: window_size.max(1),
            current_row: 0,
            current_col: 0,
        }
    }
}

impl Iterator for WindowIterator {
    type Item = Window;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let rows = self.window_size.min(self.total_rows - self.current_row);
        let cols = self.window_size.min(self.total_cols - self.current_col);
        let window = Window::new(self.current_row, self.current_col, rows, cols);

        self.current_col += self.window_size;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.window_size;
        }

        Some(window)
    }
}

/// Compute a function over every window of a raster shape.
///
/// Windows are processed concurrently when the `parallel` feature is
/// enabled; each invocation owns its window exclusively, so `f` needs no
/// synchronization. Returns the per-window results for a single writer to
/// merge (see [`write_windows`]).
pub fn process_windows<U, F>(
    shape: (usize, usize),
    window_size: usize,
    f: F,
) -> Vec<(Window, Array2<U>)>
where
    U: Send,
    F: Fn(&Window) -> Array2<U> + Sync + Send,
{
    let (rows, cols) = shape;
    let windows: Vec<Window> = WindowIterator::new(rows, cols, window_size).collect();

    windows
        .into_par_iter()
        .map(|window| {
            let block = f(&window);
            debug_assert_eq!(block.dim(), (window.rows, window.cols));
            (window, block)
        })
        .collect()
}

/// Merge per-window results into an output raster.
///
/// This is the single-writer half of the fan-out: window blocks may have
/// been computed concurrently, but they are written one at a time.
pub fn write_windows<T: RasterElement>(dst: &mut Raster<T>, blocks: Vec<(Window, Array2<T>)>) {
    for (window, block) in blocks {
        for local_row in 0..window.rows {
            for local_col in 0..window.cols {
                let (row, col) = window.to_source_coords(local_row, local_col);
                unsafe {
                    dst.set_unchecked(row, col, *block.uget((local_row, local_col)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_iterator_clips_edges() {
        let windows: Vec<_> = WindowIterator::new(100, 70, 64).collect();
        assert_eq!(windows.len(), 4);

        assert_eq!(windows[0], Window::new(0, 0, 64, 64));
        assert_eq!(windows[1], Window::new(0, 64, 64, 6));
        assert_eq!(windows[2], Window::new(64, 0, 36, 64));
        assert_eq!(windows[3], Window::new(64, 64, 36, 6));
    }

    #[test]
    fn test_window_coverage_is_exact() {
        let rows = 130;
        let cols = 97;
        let mut covered = vec![vec![0u8; cols]; rows];

        for window in WindowIterator::new(rows, cols, 32) {
            for r in window.row_off..window.row_off + window.rows {
                for c in window.col_off..window.col_off + window.cols {
                    covered[r][c] += 1;
                }
            }
        }

        // Every cell covered exactly once
        for r in 0..rows {
            for c in 0..cols {
                assert_eq!(covered[r][c], 1, "Cell ({}, {}) covered {} times", r, c, covered[r][c]);
            }
        }
    }

    #[test]
    fn test_process_and_write_windows() {
        // Fill each cell with row + col through the windowed path
        let mut out: Raster<f32> = Raster::new(50, 40);
        let blocks = process_windows((50, 40), 16, |w| {
            Array2::from_shape_fn((w.rows, w.cols), |(r, c)| {
                let (row, col) = w.to_source_coords(r, c);
                (row + col) as f32
            })
        });
        write_windows(&mut out, blocks);

        for row in 0..50 {
            for col in 0..40 {
                assert_eq!(out.get(row, col).unwrap(), (row + col) as f32);
            }
        }
    }

    #[test]
    fn test_empty_raster_yields_no_windows() {
        assert_eq!(WindowIterator::new(0, 10, 16).count(), 0);
        assert_eq!(WindowIterator::new(10, 0, 16).count(), 0);
    }
}
