use crate::field::{FieldGrid, Mana};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::debug;

/// 8-connected neighbourhood as (row, col) deltas. Order is the tie-break:
/// among equally good neighbours the earliest listed wins.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, -1),
    (1, 1),
    (1, -1),
];

pub type Cell = (usize, usize);

/// One bounded steepest-ascent search.
///
/// Only the terminal cell and step count are kept; the full path is rebuilt
/// on demand with [`Hunt::trace_path`].
#[derive(Clone, Debug)]
pub struct Hunt {
    id: u32,
    start: Cell,
    position: Cell,
    steps: usize,
    peak: Option<Mana>,
}

impl Hunt {
    pub fn new(id: u32, row: usize, col: usize) -> Self {
        Self {
            id,
            start: (row, col),
            position: (row, col),
            steps: 0,
            peak: None,
        }
    }

    /// Climbs from the start cell until no neighbour improves on the current
    /// cell or the step budget runs out, and returns the mana where it stopped.
    ///
    /// Panics if called twice or if the start cell is outside the field.
    pub fn find_peak(&mut self, field: &FieldGrid) -> Mana {
        assert!(self.peak.is_none(), "hunt {} already searched", self.id);
        let (end, steps) = climb(field, self.start, |r, c| field.value_at(r, c), |_| {});
        let current = field.peek(end.0, end.1);

        self.position = end;
        self.steps = steps;
        self.peak = Some(current);
        debug!(
            hunt = self.id,
            mana = current,
            steps = self.steps,
            "hunt finished"
        );
        current
    }

    /// Cells this hunt visits, start first, terminal cell last. Replays the
    /// climb without touching the field's evaluation statistics.
    ///
    /// Panics if the start cell is outside the field.
    pub fn trace_path(&self, field: &FieldGrid) -> Vec<Cell> {
        let mut path = vec![self.start];
        climb(field, self.start, |r, c| field.peek(r, c), |cell| path.push(cell));
        path
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    /// Current cell; the terminal cell once the search has run.
    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// `None` until [`Hunt::find_peak`] has run.
    pub fn peak(&self) -> Option<Mana> {
        self.peak
    }
}

/// Steepest ascent from `start`, reading cells through `read` and reporting
/// each move to `on_move`. Returns the terminal cell and the number of moves.
fn climb(
    field: &FieldGrid,
    start: Cell,
    read: impl Fn(usize, usize) -> Mana,
    mut on_move: impl FnMut(Cell),
) -> (Cell, usize) {
    let budget = step_budget(field);
    let (mut row, mut col) = start;
    let mut current = read(row, col);
    let mut steps = 0;

    while steps < budget {
        let mut best: Option<(Cell, Mana)> = None;
        for (dr, dc) in NEIGHBOURS {
            let Some(r) = row.checked_add_signed(dr).filter(|&r| r < field.rows()) else {
                continue;
            };
            let Some(c) = col.checked_add_signed(dc).filter(|&c| c < field.columns()) else {
                continue;
            };
            let value = read(r, c);
            if value > best.map_or(current, |(_, v)| v) {
                best = Some(((r, c), value));
            }
        }
        let Some(((r, c), value)) = best else {
            break;
        };
        row = r;
        col = c;
        current = value;
        steps += 1;
        on_move((row, col));
    }
    ((row, col), steps)
}

/// Upper bound on moves for any hunt on this field: the grid's Manhattan
/// diameter.
pub fn step_budget(field: &FieldGrid) -> usize {
    field.rows() + field.columns()
}

/// Places `count` hunts uniformly over the field. Ids are 1-based in
/// placement order, and the row is drawn before the column for each hunt.
pub fn place_hunts(field: &FieldGrid, count: usize, seed: u64) -> Vec<Hunt> {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let row = rng.random_range(0..field.rows());
            let col = rng.random_range(0..field.columns());
            Hunt::new(i as u32 + 1, row, col)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Bounds;
    use proptest::prelude::*;

    fn field(half_extent: f64, seed: u64) -> FieldGrid {
        FieldGrid::new(Bounds::square(half_extent), seed).unwrap()
    }

    fn is_local_max(field: &FieldGrid, (row, col): Cell) -> bool {
        let here = field.peek(row, col);
        NEIGHBOURS.iter().all(|&(dr, dc)| {
            match (row.checked_add_signed(dr), col.checked_add_signed(dc)) {
                (Some(r), Some(c)) if r < field.rows() && c < field.columns() => {
                    field.peek(r, c) <= here
                }
                _ => true,
            }
        })
    }

    #[test]
    fn placement_is_deterministic_and_in_bounds() {
        let f = field(5.0, 11);
        let a = place_hunts(&f, 200, 12);
        let b = place_hunts(&f, 200, 12);
        assert_eq!(
            a.iter().map(Hunt::start).collect::<Vec<_>>(),
            b.iter().map(Hunt::start).collect::<Vec<_>>()
        );
        assert!(a
            .iter()
            .all(|h| h.start().0 < f.rows() && h.start().1 < f.columns()));
        assert_eq!(a.first().map(Hunt::id), Some(1));
        assert_eq!(a.last().map(Hunt::id), Some(200));
    }

    #[test]
    fn hunt_from_local_max_takes_no_steps() {
        let f = field(4.0, 5);
        let (idx, &summit) = f
            .values()
            .iter()
            .enumerate()
            .max_by_key(|&(_, v)| *v)
            .unwrap();
        let top = (idx / f.columns(), idx % f.columns());

        let mut idle = Hunt::new(1, top.0, top.1);
        assert_eq!(idle.find_peak(&f), summit);
        assert_eq!(idle.steps(), 0);
        assert_eq!(idle.trace_path(&f), vec![top]);
    }

    #[test]
    fn peak_matches_terminal_cell() {
        let f = field(5.0, 21);
        for mut hunt in place_hunts(&f, 50, 22) {
            let peak = hunt.find_peak(&f);
            let (row, col) = hunt.position();
            assert_eq!(hunt.peak(), Some(peak));
            assert_eq!(f.peek(row, col), peak);
            let path = hunt.trace_path(&f);
            assert_eq!(path.first(), Some(&hunt.start()));
            assert_eq!(path.last(), Some(&(row, col)));
            assert_eq!(path.len(), hunt.steps() + 1);
        }
    }

    #[test]
    fn tracing_a_path_leaves_coverage_untouched() {
        let f = field(5.0, 31);
        let mut hunt = Hunt::new(1, 7, 40);
        hunt.find_peak(&f);
        let evaluated = f.evaluated_count();

        let first = hunt.trace_path(&f);
        let second = hunt.trace_path(&f);
        assert_eq!(first, second);
        assert_eq!(f.evaluated_count(), evaluated);
    }

    #[test]
    fn hunt_stays_fixed_size() {
        // A batch can hold tens of millions of hunts; no per-step storage.
        assert!(std::mem::size_of::<Hunt>() <= 64);
    }

    #[test]
    #[should_panic(expected = "already searched")]
    fn second_search_panics() {
        let f = field(2.0, 1);
        let mut hunt = Hunt::new(1, 3, 3);
        hunt.find_peak(&f);
        hunt.find_peak(&f);
    }

    proptest! {
        #[test]
        fn climb_is_monotone_and_bounded(
            seed in 1u64..10_000,
            row in 0usize..40,
            col in 0usize..40,
        ) {
            let f = field(4.0, seed);
            let mut hunt = Hunt::new(1, row % f.rows(), col % f.columns());
            let start_value = f.peek(hunt.start().0, hunt.start().1);
            let peak = hunt.find_peak(&f);

            prop_assert!(peak >= start_value);
            prop_assert!(hunt.steps() <= step_budget(&f));
            let values: Vec<Mana> = hunt.trace_path(&f).iter().map(|&(r, c)| f.peek(r, c)).collect();
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]));
            if hunt.steps() < step_budget(&f) {
                prop_assert!(is_local_max(&f, hunt.position()));
            }
        }

        #[test]
        fn evaluated_count_never_exceeds_cells(seed in 1u64..1_000, count in 1usize..300) {
            let f = field(3.0, seed);
            let mut last = 0;
            for mut hunt in place_hunts(&f, count, seed) {
                hunt.find_peak(&f);
                let now = f.evaluated_count();
                prop_assert!(now >= last);
                prop_assert!(now <= f.cell_count());
                last = now;
            }
        }
    }
}
