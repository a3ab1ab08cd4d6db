use dungeon_hunt_core::config::available_workers;
use dungeon_hunt_core::{HuntConfig, HuntSession, RunMode};
use std::time::Instant;

fn main() {
    let config = HuntConfig {
        grid_half_extent: 100,
        density: 0.5,
        seed: 42,
        workers: None,
    };
    println!(
        "Benchmarking {} hunts on a {}x{} dungeon",
        config.num_searches(),
        config.grid_half_extent * 2,
        config.grid_half_extent * 2
    );

    let start = Instant::now();
    let baseline = HuntSession::prepare(config.clone())
        .expect("benchmark config is valid")
        .run(RunMode::Serial)
        .expect("serial run cannot fail to start");
    let serial_time = start.elapsed();
    let expected = baseline.report().finding_line();
    println!("Serial: {:?} ({:?} hunting)", serial_time, baseline.outcome().stats.elapsed);
    println!("  {}", expected);

    let mut counts = vec![1, 2, 4, 8, available_workers()];
    counts.sort_unstable();
    counts.dedup();

    for workers in counts {
        let start = Instant::now();
        let done = HuntSession::prepare(config.clone())
            .expect("benchmark config is valid")
            .run(RunMode::Parallel { workers })
            .expect("worker pool should build");
        let total = start.elapsed();
        let hunting = done.outcome().stats.elapsed;
        let finding = done.report().finding_line();
        let verdict = if finding == expected { "match" } else { "MISMATCH" };
        println!(
            "Workers {:>3}: {:?} total, {:?} hunting, speedup {:.2}x [{}]",
            workers,
            total,
            hunting,
            baseline.outcome().stats.elapsed.as_secs_f64() / hunting.as_secs_f64().max(1e-9),
            verdict
        );
    }
}
