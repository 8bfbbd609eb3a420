//! Distances between block vectors and centroids.
//!
//! Blocks hold integer samples and centroids hold real-valued means, so every
//! function here is asymmetric: the first argument is a block (`&[u8]`), the
//! second a centroid (`&[f64]`).
//!
//! ## Important nuance
//!
//! Nearest-centroid decisions only need an ordering, so the hot paths use
//! [`l2_distance_squared`] and skip the square root. [`l2_distance`] is the
//! true Euclidean distance and orders candidates identically.

/// Euclidean (L2) distance between a block and a centroid.
///
/// If dimensions mismatch, this returns `f64::INFINITY` (so it is never
/// selected as a nearest centroid).
#[inline]
#[must_use]
pub fn l2_distance(block: &[u8], centroid: &[f64]) -> f64 {
    l2_distance_squared(block, centroid).sqrt()
}

/// Squared L2 distance (cheaper when only comparing distances).
#[inline]
#[must_use]
pub fn l2_distance_squared(block: &[u8], centroid: &[f64]) -> f64 {
    if block.len() != centroid.len() {
        return f64::INFINITY;
    }
    block
        .iter()
        .zip(centroid)
        .map(|(&s, &c)| {
            let d = f64::from(s) - c;
            d * d
        })
        .sum()
}

/// Position of the centroid nearest to `block`, with its squared distance.
///
/// Ties go to the lowest position. Returns `None` for an empty slice.
#[inline]
pub fn nearest<C: AsRef<[f64]>>(block: &[u8], centroids: &[C]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in centroids.iter().enumerate() {
        let dist = l2_distance_squared(block, c.as_ref());
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((i, dist)),
        }
    }
    best
}

/// Component-wise mean of a non-empty set of blocks.
///
/// Returns an empty vector when `blocks` is empty.
pub fn mean<B: AsRef<[u8]>>(blocks: &[B]) -> Vec<f64> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    let mut sums = vec![0.0f64; first.as_ref().len()];
    for block in blocks {
        for (acc, &s) in sums.iter_mut().zip(block.as_ref()) {
            *acc += f64::from(s);
        }
    }
    let n = blocks.len() as f64;
    sums.iter_mut().for_each(|s| *s /= n);
    sums
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_distance_matches_hand_computation() {
        let d = l2_distance(&[0, 3], &[4.0, 0.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_infinitely_far() {
        assert_eq!(l2_distance_squared(&[1, 2, 3], &[1.0, 2.0]), f64::INFINITY);
    }

    #[test]
    fn nearest_prefers_lowest_position_on_ties() {
        let centroids = vec![vec![2.0, 2.0], vec![0.0, 0.0], vec![0.0, 0.0]];
        assert_eq!(nearest(&[0, 0], &centroids), Some((1, 0.0)));
        // Equidistant from 0.0 and 2.0
        assert_eq!(nearest(&[1, 1], &centroids).map(|(i, _)| i), Some(0));
        assert_eq!(nearest::<Vec<f64>>(&[1, 1], &[]), None);
    }

    #[test]
    fn mean_is_componentwise() {
        let m = mean(&[vec![0u8, 10], vec![4, 20]]);
        assert_eq!(m, vec![2.0, 15.0]);
        assert!(mean::<Vec<u8>>(&[]).is_empty());
    }
}
