use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use slide_solver::solve::{Outcome, Solver, DEFAULT_THREADS};
use slide_solver::{Board, Puzzle};

/// Find a shortest solution of a sliding ball puzzle.
///
/// Map legend: `x` wall, `b` ball, `g` goal, `s` stone, `o` box, `d` box on a
/// goal, `*` ball on a goal, `1`/`!`, `2`/`"`, `3`/`#` door/button pairs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The map file.
    map: PathBuf,
    /// Worker threads, 0 for one per core.
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    threads: usize,
    /// Give up after this many seconds. Only checked between rounds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Print only the moves, not the board after each step.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let map_data = std::fs::read_to_string(&args.map)
        .with_context(|| format!("Failed to read the map {}", args.map.display()))?;
    let puzzle = map_data
        .parse::<Puzzle>()
        .context("Failed to parse the map")?;
    let board = Board::new(&puzzle);
    let solver = Solver::new(args.threads)?;
    info!(
        "Solving a {}x{} board on {} threads",
        board.width(),
        board.height(),
        solver.threads()
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let deadline = args.timeout.map(|secs| start + Duration::from_secs(secs));
    let outcome = solver.solve(board.clone(), |stats| {
        pb.set_message(format!(
            "Trying {} moves ({} tracked boards, {} visited)",
            stats.round, stats.frontier, stats.visited
        ));
        match deadline {
            Some(deadline) if Instant::now() >= deadline => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    });
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    match outcome {
        Outcome::Solved(solution) => present(&board, &solution, args.quiet, elapsed),
        Outcome::Exhausted => bail!("All combinations exhausted; no solution found"),
        Outcome::Aborted => bail!("Search aborted after {} ms", elapsed.as_millis()),
    }
}

fn present(initial: &Board, solution: &Board, quiet: bool, elapsed: Duration) -> Result<()> {
    let mut board = initial.clone();
    for (step, i) in solution.steps().into_iter().zip(1..) {
        for mov in step.moves() {
            println!("{} {mov}", style(format!("#{i}")).bold());
        }
        board = board
            .play(step)
            .with_context(|| format!("Step {i} does not replay"))?;
        if !quiet {
            println!("{board}\n");
        }
    }
    println!(
        "{}",
        style(format!(
            "Solution with {} moves found in {} ms",
            solution.move_count(),
            elapsed.as_millis()
        ))
        .green()
    );
    Ok(())
}
