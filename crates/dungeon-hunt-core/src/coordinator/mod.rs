//! Static partition / fork-join / reduce over a batch of hunts.
//!
//! Each worker owns a contiguous slice of the hunt sequence and reports a
//! private local best. The global best is folded single-threaded after every
//! worker has joined, so no shared state is written during the parallel phase.

pub mod partition;

pub use partition::partition;

use crate::field::{FieldGrid, Mana};
use crate::hunt::Hunt;
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use serde::Serialize;
use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use std::{error::Error, fmt};
use tracing::{debug, error, info};

/// Best mana seen and the index (into the hunt sequence) of the hunt that
/// found it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Best {
    pub mana: Mana,
    pub index: usize,
}

impl Best {
    /// Folding step shared by workers and the final reduction. The incumbent
    /// survives ties, so folding in index order keeps the lowest index.
    fn fold(acc: Option<Best>, candidate: Best) -> Option<Best> {
        match acc {
            Some(best) if best.mana >= candidate.mana => Some(best),
            _ => Some(candidate),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub range: Range<usize>,
    /// `None` when the worker's range was empty.
    pub best: Option<Best>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerError {
    pub worker: usize,
    pub range: Range<usize>,
    pub message: String,
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {} (hunts {}..{}) failed: {}",
            self.worker, self.range.start, self.range.end, self.message
        )
    }
}

impl Error for WorkerError {}

pub type WorkerOutcome = Result<WorkerReport, WorkerError>;

#[derive(Debug)]
pub enum CoordinatorError {
    Pool(ThreadPoolBuildError),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::Pool(e) => write!(f, "failed to build worker pool: {e}"),
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CoordinatorError::Pool(e) => Some(e),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunStats {
    pub workers: usize,
    pub failed_workers: usize,
    /// Wall time from dispatch to the end of the join.
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct HuntOutcome {
    /// `None` when no worker produced a candidate.
    pub best: Option<Best>,
    /// One entry per worker, in worker order.
    pub workers: Vec<WorkerOutcome>,
    pub stats: RunStats,
}

impl HuntOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &WorkerError> {
        self.workers.iter().filter_map(|o| o.as_ref().err())
    }
}

#[derive(Clone, Debug)]
pub struct Coordinator {
    workers: usize,
}

impl Coordinator {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every hunt once across a dedicated pool of `workers` threads and
    /// returns the global best.
    pub fn run(&self, hunts: &mut [Hunt], field: &FieldGrid) -> Result<HuntOutcome, CoordinatorError> {
        let ranges = partition(hunts.len(), self.workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("hunt-worker-{i}"))
            .build()
            .map_err(CoordinatorError::Pool)?;

        let started = Instant::now();
        let jobs = split_by_ranges(hunts, &ranges);
        let outcomes: Vec<WorkerOutcome> = pool.install(|| {
            jobs.into_par_iter()
                .with_max_len(1)
                .map(|(worker, range, slice)| run_worker(worker, range, slice, field))
                .collect()
        });
        Ok(reduce(outcomes, started.elapsed()))
    }
}

/// Sequential baseline: every hunt in order on the calling thread.
pub fn run_serial(hunts: &mut [Hunt], field: &FieldGrid) -> HuntOutcome {
    let started = Instant::now();
    let range = 0..hunts.len();
    let outcome = run_worker(0, range, hunts, field);
    reduce(vec![outcome], started.elapsed())
}

fn split_by_ranges<'a>(
    mut hunts: &'a mut [Hunt],
    ranges: &[Range<usize>],
) -> Vec<(usize, Range<usize>, &'a mut [Hunt])> {
    let mut jobs = Vec::with_capacity(ranges.len());
    for (worker, range) in ranges.iter().enumerate() {
        let (head, tail) = std::mem::take(&mut hunts).split_at_mut(range.len());
        jobs.push((worker, range.clone(), head));
        hunts = tail;
    }
    jobs
}

fn run_worker(
    worker: usize,
    range: Range<usize>,
    hunts: &mut [Hunt],
    field: &FieldGrid,
) -> WorkerOutcome {
    let offset = range.start;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        hunts
            .iter_mut()
            .enumerate()
            .fold(None, |acc, (i, hunt)| {
                let mana = hunt.find_peak(field);
                Best::fold(
                    acc,
                    Best {
                        mana,
                        index: offset + i,
                    },
                )
            })
    }));
    match result {
        Ok(best) => {
            debug!(worker, start = range.start, end = range.end, ?best, "worker finished");
            Ok(WorkerReport { worker, range, best })
        }
        Err(payload) => {
            let err = WorkerError {
                worker,
                range,
                message: panic_message(payload.as_ref()),
            };
            error!("{err}");
            Err(err)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Folds joined worker outcomes, in worker order, into the global best.
/// Failed workers contribute no candidates.
pub fn reduce(workers: Vec<WorkerOutcome>, elapsed: Duration) -> HuntOutcome {
    let best = workers
        .iter()
        .filter_map(|o| o.as_ref().ok())
        .filter_map(|report| report.best)
        .fold(None, Best::fold);
    let failed_workers = workers.iter().filter(|o| o.is_err()).count();
    let stats = RunStats {
        workers: workers.len(),
        failed_workers,
        elapsed,
    };
    info!(
        workers = stats.workers,
        failed = failed_workers,
        elapsed_ms = elapsed.as_millis() as u64,
        ?best,
        "hunt batch reduced"
    );
    HuntOutcome {
        best,
        workers,
        stats,
    }
}
