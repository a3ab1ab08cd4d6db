//! Seeded mana field over a discretised 2-D dungeon.
//!
//! The field is a smooth trigonometric landscape overlaid with Gaussian hills
//! whose placement is drawn from a `ChaCha12Rng`. Values are computed once at
//! construction and stored as fixed-point integers, so every later read of a
//! cell returns the same value regardless of which thread performs it.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::{error::Error, fmt};

/// Grid cells per unit of domain length.
pub const RESOLUTION: usize = 5;

/// Fixed-point mana: real field value scaled by [`MANA_SCALE`] and truncated.
pub type Mana = i32;

const MANA_SCALE: f64 = 1000.0;

/// Domain area that earns one seeded hill.
const HILL_AREA: f64 = 40.0;
const MAX_HILLS: usize = 64;
/// Hills contribute nothing beyond this many widths from their centre.
const HILL_CUTOFF_WIDTHS: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn square(half_extent: f64) -> Self {
        Self {
            xmin: -half_extent,
            xmax: half_extent,
            ymin: -half_extent,
            ymax: half_extent,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    InvalidBounds(Bounds),
    EmptyGrid { rows: usize, columns: usize },
    TooManyCells { max: usize, actual: usize },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidBounds(b) => write!(
                f,
                "bounds x: [{}, {}], y: [{}, {}] must be finite with min < max",
                b.xmin, b.xmax, b.ymin, b.ymax
            ),
            FieldError::EmptyGrid { rows, columns } => {
                write!(f, "bounds discretise to an empty {rows}x{columns} grid")
            }
            FieldError::TooManyCells { max, actual } => {
                write!(f, "grid cell count ({actual}) exceeds supported maximum ({max})")
            }
        }
    }
}

impl Error for FieldError {}

#[derive(Clone, Copy, Debug)]
struct Hill {
    x: f64,
    y: f64,
    amplitude: f64,
    width: f64,
}

impl Hill {
    fn height_at(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        let d_sq = dx * dx + dy * dy;
        let cutoff = HILL_CUTOFF_WIDTHS * self.width;
        if d_sq > cutoff * cutoff {
            return 0.0;
        }
        self.amplitude * (-d_sq / (2.0 * self.width * self.width)).exp()
    }
}

fn scatter_hills(bounds: &Bounds, seed: u64) -> Vec<Hill> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    let count = ((bounds.width() * bounds.height() / HILL_AREA) as usize).clamp(1, MAX_HILLS);
    (0..count)
        .map(|_| Hill {
            x: rng.random_range(bounds.xmin..bounds.xmax),
            y: rng.random_range(bounds.ymin..bounds.ymax),
            amplitude: rng.random_range(0.5..3.0),
            width: rng.random_range(0.5..4.0),
        })
        .collect()
}

/// Seed-independent background relief.
fn landscape(x: f64, y: f64) -> f64 {
    let ripple = (0.7 * x + (0.2 * y).sin()).sin() * (0.5 * y - (0.3 * x).cos()).cos();
    let swell = 0.6 * (0.25 * x + 0.15 * y).sin();
    let texture = 0.2 * (1.3 * x - 0.9 * y).sin() + 0.1 * (x * y / 6.0).sin();
    ripple + swell + texture
}

pub struct FieldGrid {
    bounds: Bounds,
    rows: usize,
    columns: usize,
    seed: u64,
    mana: Vec<Mana>,
    evaluated: Vec<AtomicBool>,
    evaluated_count: AtomicUsize,
}

impl FieldGrid {
    pub const MAX_CELLS: usize = 1 << 25;

    pub fn new(bounds: Bounds, seed: u64) -> Result<Self, FieldError> {
        let finite = [bounds.xmin, bounds.xmax, bounds.ymin, bounds.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite || bounds.xmin >= bounds.xmax || bounds.ymin >= bounds.ymax {
            return Err(FieldError::InvalidBounds(bounds));
        }
        let rows = (bounds.width() * RESOLUTION as f64) as usize;
        let columns = (bounds.height() * RESOLUTION as f64) as usize;
        if rows == 0 || columns == 0 {
            return Err(FieldError::EmptyGrid { rows, columns });
        }
        let cells = rows
            .checked_mul(columns)
            .filter(|&n| n <= Self::MAX_CELLS)
            .ok_or(FieldError::TooManyCells {
                max: Self::MAX_CELLS,
                actual: rows.saturating_mul(columns),
            })?;

        let hills = scatter_hills(&bounds, seed);
        let mut grid = Self {
            bounds,
            rows,
            columns,
            seed,
            mana: vec![0; cells],
            evaluated: (0..cells).map(|_| AtomicBool::new(false)).collect(),
            evaluated_count: AtomicUsize::new(0),
        };
        let (x_step, y_step) = (grid.x_step(), grid.y_step());
        grid.mana
            .par_chunks_mut(columns)
            .enumerate()
            .for_each(|(row, cells)| {
                let x = bounds.xmin + row as f64 * x_step;
                for (col, cell) in cells.iter_mut().enumerate() {
                    let y = bounds.ymin + col as f64 * y_step;
                    let value = landscape(x, y) + hills.iter().map(|h| h.height_at(x, y)).sum::<f64>();
                    *cell = (value * MANA_SCALE) as Mana;
                }
            });
        Ok(grid)
    }

    fn x_step(&self) -> f64 {
        self.bounds.width() / self.rows as f64
    }

    fn y_step(&self) -> f64 {
        self.bounds.height() / self.columns as f64
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.columns,
            "cell ({row}, {col}) outside {}x{} grid",
            self.rows,
            self.columns
        );
        row * self.columns + col
    }

    /// Mana at a cell, recording the cell as evaluated.
    ///
    /// Panics if the cell lies outside the grid.
    pub fn value_at(&self, row: usize, col: usize) -> Mana {
        let idx = self.index(row, col);
        let flag = &self.evaluated[idx];
        if !flag.load(Ordering::Relaxed) && !flag.swap(true, Ordering::Relaxed) {
            self.evaluated_count.fetch_add(1, Ordering::Relaxed);
        }
        self.mana[idx]
    }

    /// Mana at a cell without touching the evaluation statistics.
    pub fn peek(&self, row: usize, col: usize) -> Mana {
        self.mana[self.index(row, col)]
    }

    /// Row-major mana values.
    pub fn values(&self) -> &[Mana] {
        &self.mana
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell_count(&self) -> usize {
        self.mana.len()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn x_coord(&self, row: usize) -> f64 {
        self.bounds.xmin + row as f64 * self.x_step()
    }

    pub fn y_coord(&self, col: usize) -> f64 {
        self.bounds.ymin + col as f64 * self.y_step()
    }

    /// Distinct cells read through [`FieldGrid::value_at`] so far.
    pub fn evaluated_count(&self) -> usize {
        self.evaluated_count.load(Ordering::Relaxed)
    }

    pub fn coverage_percent(&self) -> f64 {
        self.evaluated_count() as f64 / self.cell_count() as f64 * 100.0
    }
}

impl fmt::Debug for FieldGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldGrid")
            .field("bounds", &self.bounds)
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .field("seed", &self.seed)
            .field("evaluated_count", &self.evaluated_count())
            .finish()
    }
}
