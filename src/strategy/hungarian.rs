//! Minimum-cost bipartite matching (Kuhn–Munkres with potentials).
//!
//! Runs in O(n²·m) for an `n × m` matrix with `n ≤ m`; taller matrices are
//! transposed first, so every row or every column is matched.

/// Cost substituted for missing or non-finite entries.
pub const UNREACHABLE: f64 = 1e12;

/// Returns `(row, col)` pairs minimising the total cost.
///
/// Exactly `min(rows, cols)` pairs are returned. `cost` is read as a
/// rectangular matrix with as many columns as its first row; missing or
/// non-finite entries cost [`UNREACHABLE`].
pub fn min_cost_assignment(cost: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let n = cost.len();
    let m = cost.first().map_or(0, Vec::len);
    if n == 0 || m == 0 {
        return Vec::new();
    }
    let at = |i: usize, j: usize| -> f64 {
        cost.get(i)
            .and_then(|row| row.get(j))
            .copied()
            .filter(|c| c.is_finite())
            .unwrap_or(UNREACHABLE)
    };
    if n > m {
        let transposed: Vec<Vec<f64>> = (0..m).map(|j| (0..n).map(|i| at(i, j)).collect()).collect();
        return min_cost_assignment(&transposed)
            .into_iter()
            .map(|(j, i)| (i, j))
            .collect();
    }

    // 1-based potentials; p[j] is the row matched to column j, 0 for none.
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = at(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        // Augment along the alternating path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    (1..=m)
        .filter(|&j| p[j] != 0)
        .map(|j| (p[j] - 1, j - 1))
        .collect()
}
