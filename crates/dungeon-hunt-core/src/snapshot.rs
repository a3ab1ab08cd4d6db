use crate::config::HuntConfig;
use crate::field::{Bounds, Mana};
use crate::hunt::Cell;
use serde::Serialize;
use std::io::Write;

/// Field values and the winning path, for an external renderer.
#[derive(Clone, Debug, Serialize)]
pub struct RenderSnapshot {
    pub config: HuntConfig,
    /// Resolved seed, even when the config asked for an entropy seed.
    pub seed: u64,
    pub bounds: Bounds,
    pub rows: usize,
    pub columns: usize,
    /// Row-major, `rows * columns` entries.
    pub values: Vec<Mana>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<WinnerSnapshot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WinnerSnapshot {
    pub id: u32,
    pub mana: Mana,
    pub x: f64,
    pub y: f64,
    /// (row, col) cells from start to peak.
    pub path: Vec<Cell>,
}

impl RenderSnapshot {
    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, self)
    }
}
