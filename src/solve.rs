use std::ops::ControlFlow;

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{Board, VisitedSet};

/// Worker count used when nothing else is configured.
pub const DEFAULT_THREADS: usize = 8;

#[derive(Debug, Clone)]
pub enum Outcome {
    /// A winning board; its history is a shortest solution.
    Solved(Board),
    /// Every reachable placement was explored without a win.
    Exhausted,
    /// The round callback asked to stop.
    Aborted,
}

impl Outcome {
    pub fn solution(self) -> Option<Board> {
        match self {
            Outcome::Solved(board) => Some(board),
            Outcome::Exhausted | Outcome::Aborted => None,
        }
    }
}

/// Reported before each round is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundStats {
    /// One-based; also the length of the solutions this round may find.
    pub round: usize,
    pub frontier: usize,
    pub visited: usize,
}

/// Breadth-first search on a dedicated worker pool.
#[derive(Debug)]
pub struct Solver {
    pool: ThreadPool,
}

impl Solver {
    /// `threads == 0` lets rayon pick one worker per core.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("solver-{i}"))
            .build()
            .context("Failed to build the worker pool")?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// `on_round` runs on the calling thread between rounds; breaking out of it
    /// aborts the search.
    pub fn solve(
        &self,
        board: Board,
        on_round: impl FnMut(&RoundStats) -> ControlFlow<()>,
    ) -> Outcome {
        search(board, on_round, |frontier, visited| {
            self.pool.install(|| expand(frontier, visited))
        })
    }
}

/// Search on the global rayon pool until solved or exhausted.
pub fn bfs(board: Board) -> Outcome {
    search(board, |_| ControlFlow::Continue(()), expand)
}

struct Round {
    boards: Vec<Board>,
    winner: Option<usize>,
}

fn expand(frontier: &[Board], visited: &VisitedSet) -> Round {
    let boards = frontier
        .par_iter()
        .flat_map_iter(|board| {
            #[cfg(feature = "coz")]
            coz::progress!("Board");

            board.step(visited)
        })
        .collect::<Vec<_>>();
    // Any winner will do, they all have the same length.
    let winner = boards.par_iter().position_any(Board::has_won);
    Round { boards, winner }
}

fn search(
    board: Board,
    mut on_round: impl FnMut(&RoundStats) -> ControlFlow<()>,
    expand: impl Fn(&[Board], &VisitedSet) -> Round,
) -> Outcome {
    if board.has_won() {
        info!("Initial board is already solved");
        return Outcome::Solved(board);
    }

    let visited = VisitedSet::new();
    visited.insert(board.placement().clone());
    let mut frontier = vec![board];
    let mut round = 0;
    loop {
        #[cfg(feature = "coz")]
        coz::scope!("Round");

        round += 1;
        let stats = RoundStats {
            round,
            frontier: frontier.len(),
            visited: visited.len(),
        };
        if on_round(&stats).is_break() {
            info!("Search aborted before round {round}");
            return Outcome::Aborted;
        }
        debug!(
            "Round {round}: expanding {} boards, {} placements visited",
            stats.frontier, stats.visited
        );

        let Round { mut boards, winner } = expand(&frontier, &visited);
        if let Some(idx) = winner {
            info!("Solved in {round} moves, {} placements visited", visited.len());
            return Outcome::Solved(boards.swap_remove(idx));
        }
        if boards.is_empty() {
            info!("Exhausted after {round} rounds, {} placements visited", visited.len());
            return Outcome::Exhausted;
        }
        frontier = boards;
    }
}
