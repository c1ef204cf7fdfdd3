// src/grid.rs

/// Regular 2D lattice of magnetic domains.
///
/// `i` runs across the film width (x), `j` along the film length (y), which is
/// also the SAW propagation axis. Both directions share the same domain pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid2D {
    pub nx: usize,
    pub ny: usize,
    pub pitch: f64,
}

impl Grid2D {
    /// Create a new lattice with nx × ny domains spaced `pitch` apart.
    pub fn new(nx: usize, ny: usize, pitch: f64) -> Self {
        Self { nx, ny, pitch }
    }

    /// Lattice sized to fit a film of the given width and length.
    ///
    /// Partial domains at the edges are dropped (floor division).
    pub fn fit(width: f64, length: f64, pitch: f64) -> Self {
        if !(pitch > 0.0) {
            return Self::new(0, 0, pitch);
        }
        let nx = (width / pitch + 1e-9).floor().max(0.0) as usize;
        let ny = (length / pitch + 1e-9).floor().max(0.0) as usize;
        Self::new(nx, ny, pitch)
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Convert (i, j) indices to a flat index into a 1D array.
    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        j * self.nx + i
    }

    /// Centre of cell (i, j) in metres, origin at the film corner.
    #[inline]
    pub fn cell_center(&self, i: usize, j: usize) -> (f64, f64) {
        (
            (i as f64 + 0.5) * self.pitch,
            (j as f64 + 0.5) * self.pitch,
        )
    }

    pub fn lx(&self) -> f64 {
        self.nx as f64 * self.pitch
    }

    pub fn ly(&self) -> f64 {
        self.ny as f64 * self.pitch
    }
}
