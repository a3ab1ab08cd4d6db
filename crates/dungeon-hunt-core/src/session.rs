use crate::config::{ConfigError, HuntConfig};
use crate::coordinator::{run_serial, Coordinator, CoordinatorError, HuntOutcome};
use crate::field::{FieldError, FieldGrid};
use crate::hunt::{place_hunts, Hunt};
use crate::report::{Finding, Report};
use crate::snapshot::{RenderSnapshot, WinnerSnapshot};
use std::{error::Error, fmt};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Every hunt in order on the calling thread.
    Serial,
    Parallel { workers: usize },
}

impl RunMode {
    pub fn from_config(config: &HuntConfig, serial: bool) -> Self {
        if serial {
            RunMode::Serial
        } else {
            RunMode::Parallel {
                workers: config.worker_count(),
            }
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Field(FieldError),
    Coordinator(CoordinatorError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(e) => write!(f, "{e}"),
            SessionError::Field(e) => write!(f, "{e}"),
            SessionError::Coordinator(e) => write!(f, "{e}"),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl From<FieldError> for SessionError {
    fn from(err: FieldError) -> Self {
        SessionError::Field(err)
    }
}

impl From<CoordinatorError> for SessionError {
    fn from(err: CoordinatorError) -> Self {
        SessionError::Coordinator(err)
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::Config(e) => Some(e),
            SessionError::Field(e) => Some(e),
            SessionError::Coordinator(e) => Some(e),
        }
    }
}

/// A field and its placed hunts, ready to run.
pub struct HuntSession {
    config: HuntConfig,
    seed: u64,
    field: FieldGrid,
    hunts: Vec<Hunt>,
}

impl HuntSession {
    /// Validates `config`, resolves its seed and builds the field and hunts.
    pub fn prepare(config: HuntConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let seed = config.resolve_seed();
        if config.seed == 0 {
            debug!(seed, "no seed given, drew one from entropy");
        }
        Self::build(config, seed)
    }

    /// Like [`HuntSession::prepare`] but with an already-resolved seed.
    /// The field uses `seed`; hunt placement uses `seed + 1`.
    pub fn with_seed(config: HuntConfig, seed: u64) -> Result<Self, SessionError> {
        config.validate()?;
        Self::build(config, seed)
    }

    /// Builds the field and hunts from a config that has already been validated.
    fn build(config: HuntConfig, seed: u64) -> Result<Self, SessionError> {
        let field = FieldGrid::new(config.bounds(), seed)?;
        let hunts = place_hunts(&field, config.num_searches(), seed.wrapping_add(1));
        info!(
            rows = field.rows(),
            columns = field.columns(),
            hunts = hunts.len(),
            seed,
            "session prepared"
        );
        Ok(Self {
            config,
            seed,
            field,
            hunts,
        })
    }

    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field(&self) -> &FieldGrid {
        &self.field
    }

    pub fn hunts(&self) -> &[Hunt] {
        &self.hunts
    }

    pub fn run(mut self, mode: RunMode) -> Result<CompletedHunt, SessionError> {
        let outcome = match mode {
            RunMode::Serial => run_serial(&mut self.hunts, &self.field),
            RunMode::Parallel { workers } => {
                Coordinator::new(workers).run(&mut self.hunts, &self.field)?
            }
        };
        Ok(CompletedHunt {
            config: self.config,
            seed: self.seed,
            field: self.field,
            hunts: self.hunts,
            outcome,
        })
    }
}

/// Everything a run produced: the field (with its coverage statistics), the
/// finished hunts and the reduced outcome.
pub struct CompletedHunt {
    config: HuntConfig,
    seed: u64,
    field: FieldGrid,
    hunts: Vec<Hunt>,
    outcome: HuntOutcome,
}

impl CompletedHunt {
    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn field(&self) -> &FieldGrid {
        &self.field
    }

    pub fn hunts(&self) -> &[Hunt] {
        &self.hunts
    }

    pub fn outcome(&self) -> &HuntOutcome {
        &self.outcome
    }

    pub fn winner(&self) -> Option<&Hunt> {
        self.outcome.best.map(|best| &self.hunts[best.index])
    }

    pub fn report(&self) -> Report {
        let finding = self.outcome.best.map(|best| {
            let (row, col) = self.hunts[best.index].position();
            Finding {
                mana: best.mana,
                x: self.field.x_coord(row),
                y: self.field.y_coord(col),
            }
        });
        Report {
            grid_half_extent: self.config.grid_half_extent,
            rows: self.field.rows(),
            columns: self.field.columns(),
            bounds: self.field.bounds(),
            searches: self.hunts.len(),
            elapsed: self.outcome.stats.elapsed,
            evaluated: self.field.evaluated_count(),
            coverage_percent: self.field.coverage_percent(),
            finding,
        }
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let winner = self.outcome.best.map(|best| {
            let hunt = &self.hunts[best.index];
            let (row, col) = hunt.position();
            WinnerSnapshot {
                id: hunt.id(),
                mana: best.mana,
                x: self.field.x_coord(row),
                y: self.field.y_coord(col),
                path: hunt.trace_path(&self.field),
            }
        });
        RenderSnapshot {
            config: self.config.clone(),
            seed: self.seed,
            bounds: self.field.bounds(),
            rows: self.field.rows(),
            columns: self.field.columns(),
            values: self.field.values().to_vec(),
            winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(grid_half_extent: i64, density: f64, seed: i64) -> HuntConfig {
        HuntConfig {
            grid_half_extent,
            density,
            seed,
            workers: None,
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_building() {
        let err = HuntSession::prepare(config(10, 0.0001, 42)).err().unwrap();
        assert!(matches!(
            err,
            SessionError::Config(ConfigError::TooFewSearches(0))
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn serial_and_parallel_sessions_print_the_same_finding() {
        let serial = HuntSession::prepare(config(10, 1.0, 42))
            .unwrap()
            .run(RunMode::Serial)
            .unwrap();
        let parallel = HuntSession::prepare(config(10, 1.0, 42))
            .unwrap()
            .run(RunMode::Parallel { workers: 8 })
            .unwrap();
        assert_eq!(serial.report().finding_line(), parallel.report().finding_line());
        assert_eq!(serial.hunts().len(), 2_000);
        assert!(serial.report().finding_line().starts_with("Dungeon Master (mana "));
    }

    #[test]
    fn winner_is_the_best_hunt() {
        let done = HuntSession::prepare(config(6, 0.5, 9))
            .unwrap()
            .run(RunMode::Parallel { workers: 3 })
            .unwrap();
        let winner = done.winner().unwrap();
        let top = done.hunts().iter().filter_map(Hunt::peak).max().unwrap();
        assert_eq!(winner.peak(), Some(top));
        let first_with_top = done
            .hunts()
            .iter()
            .position(|h| h.peak() == Some(top))
            .unwrap();
        assert_eq!(done.outcome().best.map(|b| b.index), Some(first_with_top));
    }

    #[test]
    fn explicit_seed_matches_prepared_seed() {
        let prepared = HuntSession::prepare(config(5, 0.5, 23)).unwrap();
        let seeded = HuntSession::with_seed(config(5, 0.5, 23), 23).unwrap();
        assert_eq!(prepared.seed(), seeded.seed());
        assert_eq!(
            prepared.hunts().iter().map(Hunt::start).collect::<Vec<_>>(),
            seeded.hunts().iter().map(Hunt::start).collect::<Vec<_>>()
        );
        assert!(matches!(
            HuntSession::with_seed(config(5, 0.5, -2), 7),
            Err(SessionError::Config(ConfigError::NegativeSeed(-2)))
        ));
    }

    #[test]
    fn zero_seed_still_runs() {
        let done = HuntSession::prepare(config(3, 1.0, 0))
            .unwrap()
            .run(RunMode::Serial)
            .unwrap();
        assert!(done.winner().is_some());
    }
}
