use crate::field::{Bounds, RESOLUTION};
use serde::Serialize;
use std::{error::Error, fmt};

/// Parameters for one dungeon hunt run.
///
/// Fields hold the raw (signed) values the caller supplied so that every range
/// violation is reported by [`HuntConfig::validate`] rather than lost in a
/// conversion.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HuntConfig {
    /// The dungeon spans `[-grid_half_extent, grid_half_extent]` on both axes.
    pub grid_half_extent: i64,
    /// Searches per unit of area, before scaling by [`RESOLUTION`].
    pub density: f64,
    /// `0` asks for a fresh entropy-derived seed.
    pub seed: i64,
    /// Worker count override; `None` uses available hardware concurrency.
    pub workers: Option<usize>,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            grid_half_extent: 10,
            density: 1.0,
            seed: 0,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveExtent(i64),
    ExtentTooLarge { max: i64, actual: i64 },
    TooFewSearches(i64),
    TooManySearches { max: usize, actual: i64 },
    NegativeSeed(i64),
    ZeroWorkers,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveExtent(_) => write!(f, "Grid size must be greater than 0."),
            ConfigError::ExtentTooLarge { max, actual } => {
                write!(f, "Grid size ({actual}) exceeds supported maximum ({max}).")
            }
            ConfigError::TooFewSearches(n) => write!(
                f,
                "Number of searches calculated to {n}. The density value must be high enough to generate at least 1 search."
            ),
            ConfigError::TooManySearches { max, actual } => write!(
                f,
                "Number of searches calculated to {actual}, above the supported maximum ({max})."
            ),
            ConfigError::NegativeSeed(_) => write!(f, "Random seed must be non-negative."),
            ConfigError::ZeroWorkers => write!(f, "Worker count must be greater than 0."),
        }
    }
}

impl Error for ConfigError {}

impl HuntConfig {
    pub const MAX_HALF_EXTENT: i64 = 512;
    pub const MAX_SEARCHES: usize = 50_000_000;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_half_extent <= 0 {
            return Err(ConfigError::NonPositiveExtent(self.grid_half_extent));
        }
        if self.grid_half_extent > Self::MAX_HALF_EXTENT {
            return Err(ConfigError::ExtentTooLarge {
                max: Self::MAX_HALF_EXTENT,
                actual: self.grid_half_extent,
            });
        }
        let searches = self.raw_search_count();
        if searches < 1 {
            return Err(ConfigError::TooFewSearches(searches));
        }
        if searches > Self::MAX_SEARCHES as i64 {
            return Err(ConfigError::TooManySearches {
                max: Self::MAX_SEARCHES,
                actual: searches,
            });
        }
        if self.seed < 0 {
            return Err(ConfigError::NegativeSeed(self.seed));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// `density * side² * RESOLUTION`, rounded. NaN density maps to zero and
    /// infinite density saturates, so both fall out of `validate`.
    fn raw_search_count(&self) -> i64 {
        let side = self.grid_half_extent.saturating_mul(2) as f64;
        (self.density * side * side * RESOLUTION as f64).round() as i64
    }

    /// Number of hunts to launch. Only meaningful after `validate` succeeds.
    pub fn num_searches(&self) -> usize {
        self.raw_search_count().max(0) as usize
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::square(self.grid_half_extent as f64)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(available_workers).max(1)
    }

    /// Seed actually used for the run. A configured seed of `0` draws a fresh
    /// value from the thread RNG on every call, so callers resolve it once.
    pub fn resolve_seed(&self) -> u64 {
        if self.seed > 0 {
            self.seed as u64
        } else {
            rand::random::<u64>()
        }
    }
}

pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
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
    fn search_count_scales_with_area_and_resolution() {
        let c = config(10, 1.0, 42);
        assert!(c.validate().is_ok());
        assert_eq!(c.num_searches(), 20 * 20 * RESOLUTION);
        assert_eq!(config(10, 0.5, 42).num_searches(), 1000);
    }

    #[test]
    fn density_yielding_zero_searches_is_rejected() {
        let c = config(10, 0.0001, 42);
        assert_eq!(c.validate(), Err(ConfigError::TooFewSearches(0)));
        assert!(c
            .validate()
            .unwrap_err()
            .to_string()
            .contains("at least 1 search"));
    }

    #[test]
    fn nan_and_negative_density_are_rejected() {
        assert!(matches!(
            config(10, f64::NAN, 1).validate(),
            Err(ConfigError::TooFewSearches(0))
        ));
        assert!(matches!(
            config(10, -1.0, 1).validate(),
            Err(ConfigError::TooFewSearches(_))
        ));
        assert!(matches!(
            config(10, f64::INFINITY, 1).validate(),
            Err(ConfigError::TooManySearches { .. })
        ));
    }

    #[test]
    fn extent_and_seed_ranges_are_checked() {
        assert_eq!(
            config(0, 1.0, 1).validate(),
            Err(ConfigError::NonPositiveExtent(0))
        );
        assert_eq!(
            config(-3, 1.0, 1).validate(),
            Err(ConfigError::NonPositiveExtent(-3))
        );
        assert!(matches!(
            config(HuntConfig::MAX_HALF_EXTENT + 1, 1.0, 1).validate(),
            Err(ConfigError::ExtentTooLarge { .. })
        ));
        assert_eq!(
            config(10, 1.0, -1).validate(),
            Err(ConfigError::NegativeSeed(-1))
        );
        assert!(config(10, 1.0, 0).validate().is_ok());
    }

    #[test]
    fn huge_extent_saturates_instead_of_overflowing() {
        let c = config(i64::MAX, 1.0, 1);
        assert_eq!(c.num_searches(), i64::MAX as usize);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ExtentTooLarge { actual: i64::MAX, .. })
        ));
        assert_eq!(config(i64::MIN, 1.0, 1).num_searches(), i64::MAX as usize);
    }

    #[test]
    fn zero_workers_is_rejected_and_default_is_positive() {
        let mut c = config(10, 1.0, 1);
        c.workers = Some(0);
        assert_eq!(c.validate(), Err(ConfigError::ZeroWorkers));
        c.workers = None;
        assert!(c.worker_count() >= 1);
        c.workers = Some(3);
        assert_eq!(c.worker_count(), 3);
    }

    #[test]
    fn positive_seed_resolves_to_itself() {
        assert_eq!(config(10, 1.0, 42).resolve_seed(), 42);
    }
}
