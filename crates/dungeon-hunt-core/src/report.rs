use crate::field::{Bounds, Mana};
use std::fmt;
use std::time::Duration;

/// Winning mana and where it was found, in domain coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Finding {
    pub mana: Mana,
    pub x: f64,
    pub y: f64,
}

/// Human-readable run report. The finding line is compared verbatim between
/// serial and parallel runs, so its layout must not change.
#[derive(Clone, Debug)]
pub struct Report {
    pub grid_half_extent: i64,
    pub rows: usize,
    pub columns: usize,
    pub bounds: Bounds,
    pub searches: usize,
    pub elapsed: Duration,
    pub evaluated: usize,
    pub coverage_percent: f64,
    pub finding: Option<Finding>,
}

impl Report {
    pub fn finding_line(&self) -> String {
        match self.finding {
            Some(Finding { mana, x, y }) => {
                format!("Dungeon Master (mana {mana}) found at:  x={x:.1} y={y:.1}")
            }
            None => "Dungeon Master not found".to_string(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bounds;
        writeln!(f, "\t dungeon size: {},", self.grid_half_extent)?;
        writeln!(f, "\t rows: {}, columns: {}", self.rows, self.columns)?;
        writeln!(
            f,
            "\t x: [{:.6}, {:.6}], y: [{:.6}, {:.6}]",
            b.xmin, b.xmax, b.ymin, b.ymax
        )?;
        writeln!(f, "\t Number searches: {}", self.searches)?;
        writeln!(f)?;
        writeln!(f, "\t time: {} ms", self.elapsed.as_millis())?;
        writeln!(
            f,
            "\tnumber dungeon grid points evaluated: {}  ({:2.0}%)",
            self.evaluated, self.coverage_percent
        )?;
        writeln!(f, "{}", self.finding_line())
    }
}
