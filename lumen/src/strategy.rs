//! Flat indexing of bidirectional sampling strategies.
//!
//! A strategy `(s, t)` joins a light subpath with `s` vertices to a camera
//! subpath with `t` vertices. Its depth is `k = s + t - 2`. Strategies of one
//! depth occupy a contiguous block of indices starting at `k(5+k)/2`; block `k`
//! holds the `k + 3` splits `s = 0 ..= k + 2`, so the blocks start at
//! 0, 3, 7, 12, 18, ...
//!
//! Exported per-strategy image names and the transport order of the
//! strategy images both follow this index.

/// One sampling strategy: `s` light vertices, `t` camera vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strategy {
    pub s: usize,
    pub t: usize,
}

impl Strategy {
    pub const fn new(s: usize, t: usize) -> Self {
        Self { s, t }
    }

    /// Path depth `k = s + t - 2`.
    pub const fn depth(self) -> usize {
        assert!(self.s + self.t >= 2, "a strategy needs at least two vertices");
        self.s + self.t - 2
    }

    pub const fn index(self) -> usize {
        strategy_index(self.s, self.t)
    }
}

/// First index of the depth-`k` block.
#[inline]
pub const fn depth_offset(k: usize) -> usize {
    k * (5 + k) / 2
}

/// Flat slot of strategy `(s, t)`: `s + k(5+k)/2` with `k = s + t - 2`.
#[inline]
pub const fn strategy_index(s: usize, t: usize) -> usize {
    assert!(s + t >= 2, "a strategy needs at least two vertices");
    let k = s + t - 2;
    s + depth_offset(k)
}

/// Number of strategies with depth `0 ..= max_depth`.
#[inline]
pub const fn strategy_count(max_depth: usize) -> usize {
    depth_offset(max_depth + 1)
}

/// Inverse of [`strategy_index`].
pub fn strategy_at(index: usize) -> Strategy {
    // Largest k with depth_offset(k) <= index, from the quadratic k² + 5k - 2·index = 0.
    let mut k = ((((25 + 8 * index) as f64).sqrt() - 5.0) / 2.0).floor() as usize;
    // Guard against rounding at block boundaries.
    while depth_offset(k) > index {
        k -= 1;
    }
    while depth_offset(k + 1) <= index {
        k += 1;
    }
    let s = index - depth_offset(k);
    Strategy::new(s, k + 2 - s)
}

/// All strategies up to `max_depth`, in index order.
pub fn strategies(max_depth: usize) -> impl Iterator<Item = Strategy> {
    (0..=max_depth).flat_map(strategies_of_depth)
}

/// Strategies of depth `k`, in index order (`s` ascending).
pub fn strategies_of_depth(k: usize) -> impl Iterator<Item = Strategy> {
    (0..=k + 2).map(move |s| Strategy::new(s, k + 2 - s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_indices() {
        assert_eq!(strategy_index(0, 2), 0);
        assert_eq!(strategy_index(1, 1), 1);
        assert_eq!(strategy_index(2, 0), 2);
        assert_eq!(strategy_index(0, 3), 3);
        assert_eq!(strategy_index(3, 0), 6);
        assert_eq!(strategy_index(0, 4), 7);
    }

    #[test]
    fn test_counts() {
        assert_eq!(strategy_count(0), 3);
        assert_eq!(strategy_count(1), 7);
        assert_eq!(strategy_count(2), 12);
        assert_eq!(strategy_count(5), 33);
    }

    #[test]
    fn test_index_is_bijection_onto_range() {
        for max_depth in 0..12 {
            let d = strategy_count(max_depth);
            let mut seen = HashSet::new();
            for k in 0..=max_depth {
                for s in 0..=k + 2 {
                    let t = k + 2 - s;
                    let idx = strategy_index(s, t);
                    assert!(idx < d, "({}, {}) -> {} out of [0, {})", s, t, idx, d);
                    assert!(seen.insert(idx), "duplicate index {}", idx);
                }
            }
            assert_eq!(seen.len(), d);
        }
    }

    #[test]
    fn test_depth_blocks_are_contiguous() {
        for k in 0..10 {
            let indices: Vec<usize> = strategies_of_depth(k).map(Strategy::index).collect();
            let start = depth_offset(k);
            let expected: Vec<usize> = (start..start + k + 3).collect();
            assert_eq!(indices, expected, "depth {}", k);
        }
    }

    #[test]
    fn test_strategy_at_inverts_index() {
        for index in 0..strategy_count(20) {
            let strategy = strategy_at(index);
            assert_eq!(strategy.index(), index);
        }
        assert_eq!(strategy_at(3), Strategy::new(0, 3));
        assert_eq!(strategy_at(6), Strategy::new(3, 0));
    }

    #[test]
    fn test_strategies_iterate_in_index_order() {
        let indices: Vec<usize> = strategies(4).map(Strategy::index).collect();
        let expected: Vec<usize> = (0..strategy_count(4)).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Strategy::new(1, 1).depth(), 0);
        assert_eq!(Strategy::new(2, 3).depth(), 3);
    }

    #[test]
    #[should_panic(expected = "at least two vertices")]
    fn test_rejects_single_vertex() {
        strategy_index(1, 0);
    }
}
