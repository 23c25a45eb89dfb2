use rustc_hash::{FxHashMap, FxHashSet};

use crate::chess::board::Square;
use crate::problem::{DeductionError, ResourceLimits};

/// A joint state of two-piece co-play: each piece's square and played-move
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointPosition {
    pub squares: [Square; 2],
    pub moves: [i32; 2],
}

impl JointPosition {
    pub fn new(square_a: Square, moves_a: i32, square_b: Square, moves_b: i32) -> JointPosition {
        JointPosition {
            squares: [square_a, square_b],
            moves: [moves_a, moves_b],
        }
    }

    // 6 bits per square, 8 bits per move count.
    fn key(self) -> u32 {
        debug_assert!(self.moves[0] < 256 && self.moves[1] < 256);
        self.squares[0].index() as u32
            | (self.moves[0] as u32) << 6
            | (self.squares[1].index() as u32) << 14
            | (self.moves[1] as u32) << 20
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    required_moves: i32,
    shortcut: bool,
}

/// Memoisation for two-piece co-play, keyed on the joint state.
///
/// Fast mode records bare visitation; full mode records the best
/// required-moves total found from a state, with a `shortcut` flag marking
/// results computed while skipping moves that undercut a distance lower
/// bound (such entries are re-validated by recomputation).
///
/// The cache lives for one `mutual_interactions` call and is bounded by
/// `ResourceLimits::max_cache_entries`.
pub struct TwoPieceCache {
    visited: FxHashSet<u32>,
    results: FxHashMap<u32, CacheEntry>,
    max_entries: usize,
}

impl TwoPieceCache {
    pub fn new(limits: &ResourceLimits) -> TwoPieceCache {
        TwoPieceCache {
            visited: FxHashSet::default(),
            results: FxHashMap::default(),
            max_entries: limits.max_cache_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.visited.len() + self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty() && self.results.is_empty()
    }

    /// Fast mode: mark a joint position as enqueued.
    pub fn add(&mut self, position: JointPosition) -> Result<(), DeductionError> {
        if self.len() >= self.max_entries {
            return Err(out_of_memory());
        }
        self.visited
            .try_reserve(1)
            .map_err(|_| out_of_memory())?;
        self.visited.insert(position.key());
        Ok(())
    }

    /// Fast mode: has this joint position been enqueued before?
    pub fn hit(&self, position: JointPosition) -> bool {
        self.visited.contains(&position.key())
    }

    /// Full mode: record the best required-moves total found from a state.
    pub fn record(
        &mut self,
        position: JointPosition,
        required_moves: i32,
        shortcut: bool,
    ) -> Result<(), DeductionError> {
        let key = position.key();
        match self.results.get_mut(&key) {
            Some(entry) => {
                if required_moves < entry.required_moves || (entry.shortcut && !shortcut) {
                    entry.required_moves = required_moves.min(entry.required_moves);
                    entry.shortcut = shortcut;
                }
            }
            None => {
                if self.len() >= self.max_entries {
                    return Err(out_of_memory());
                }
                self.results
                    .try_reserve(1)
                    .map_err(|_| out_of_memory())?;
                self.results.insert(
                    key,
                    CacheEntry {
                        required_moves,
                        shortcut,
                    },
                );
            }
        }
        Ok(())
    }

    /// Full mode: the memoised result for a state, unless it is
    /// shortcut-flagged (those are recomputed rather than trusted).
    pub fn lookup(&self, position: JointPosition) -> Option<i32> {
        self.results
            .get(&position.key())
            .filter(|entry| !entry.shortcut)
            .map(|entry| entry.required_moves)
    }
}

fn out_of_memory() -> DeductionError {
    DeductionError::OutOfMemory {
        stage: "mutual_interactions",
        structure: "two_piece_cache",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn keys_distinguish_square_and_move_components() {
        let a = JointPosition::new(sq("a1"), 0, sq("h8"), 3);
        let b = JointPosition::new(sq("a1"), 3, sq("h8"), 0);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn fast_mode_remembers_positions() {
        let limits = ResourceLimits::default();
        let mut cache = TwoPieceCache::new(&limits);

        let position = JointPosition::new(sq("e1"), 1, sq("e8"), 2);
        assert!(!cache.hit(position));
        cache.add(position).unwrap();
        assert!(cache.hit(position));
    }

    #[test]
    fn full_mode_keeps_best_result_and_distrusts_shortcuts() {
        let limits = ResourceLimits::default();
        let mut cache = TwoPieceCache::new(&limits);
        let position = JointPosition::new(sq("a1"), 1, sq("a2"), 1);

        cache.record(position, 7, false).unwrap();
        assert_eq!(cache.lookup(position), Some(7));

        // Better results replace worse ones.
        cache.record(position, 5, false).unwrap();
        assert_eq!(cache.lookup(position), Some(5));

        // Shortcut-flagged states are not trusted on lookup.
        let flagged = JointPosition::new(sq("b1"), 2, sq("b2"), 2);
        cache.record(flagged, 4, true).unwrap();
        assert_eq!(cache.lookup(flagged), None);
    }

    #[test]
    fn the_entry_limit_surfaces_as_out_of_memory() {
        let limits = ResourceLimits {
            max_cache_entries: 1,
            ..ResourceLimits::default()
        };
        let mut cache = TwoPieceCache::new(&limits);

        cache.add(JointPosition::new(sq("a1"), 0, sq("b1"), 0)).unwrap();
        let overflow = cache.add(JointPosition::new(sq("c1"), 0, sq("d1"), 0));
        assert!(matches!(
            overflow,
            Err(DeductionError::OutOfMemory { .. })
        ));
    }
}
