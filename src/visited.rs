use std::hash::BuildHasher;
use std::sync::{Mutex, PoisonError};

use fxhash::{FxBuildHasher, FxHashSet};

use crate::Placement;

const SHARDS: usize = 64;

/// Placements seen so far in a search, shared by all workers.
///
/// Split into independently locked shards so that workers inserting unrelated
/// placements rarely wait on each other.
#[derive(Debug)]
pub struct VisitedSet {
    shards: Box<[Mutex<FxHashSet<Placement>>]>,
    hasher: FxBuildHasher,
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitedSet {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::default()).collect(),
            hasher: FxBuildHasher::default(),
        }
    }

    /// Insert `placement`, returning whether it was absent.
    ///
    /// Check and insertion happen under the same lock, so out of several
    /// concurrent inserts of one placement exactly one returns `true`.
    pub fn insert(&self, placement: Placement) -> bool {
        // The low and top bits drive the inner table, shard on the middle ones.
        let hash = self.hasher.hash_one(&placement);
        let shard = (hash >> 32) as usize % SHARDS;
        self.shards[shard]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(placement)
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use rayon::prelude::*;

    use super::*;
    use crate::{Board, Puzzle};

    fn placements(map: &str) -> Vec<Placement> {
        let board = Board::new(&map.parse::<Puzzle>().unwrap());
        board
            .successors()
            .iter()
            .map(|b| b.placement().clone())
            .collect()
    }

    #[test]
    fn insert_reports_novelty() {
        let visited = VisitedSet::new();
        assert!(visited.is_empty());
        let [a, b] = <[_; 2]>::try_from(placements("b.s")).unwrap();
        assert!(visited.insert(a.clone()));
        assert!(!visited.insert(a));
        assert!(visited.insert(b));
        assert_eq!(visited.len(), 2);
    }

    #[test]
    fn concurrent_inserts_accept_once() {
        let visited = VisitedSet::new();
        let all = placements("xxxxxxx\nx.b...x\nx..s..x\nxo....x\nxxxxxxx");
        let accepted = (0..16)
            .into_par_iter()
            .flat_map_iter(|_| all.iter().cloned())
            .filter(|p| visited.insert(p.clone()))
            .count();
        assert_eq!(accepted, all.len());
        assert_eq!(visited.len(), all.len());
    }
}
