use rand::Rng;
use special::Gamma;

/// In-place prefix sum: `xs[i] ← Σ_{j≤i} xs[j]`
///
/// # Example
///
/// ```rust
/// # use ldagibbs::misc::prefix_sum;
/// let mut xs = vec![1.0, 1.0, 2.0, 1.0];
/// prefix_sum(&mut xs);
/// assert_eq!(xs, vec![1.0, 2.0, 4.0, 5.0]);
/// ```
pub fn prefix_sum(xs: &mut [f64]) {
    for i in 1..xs.len() {
        xs[i] += xs[i - 1];
    }
}

#[inline]
fn lower_bound_bisection(cws: &[f64], r: f64) -> usize {
    let mut left: usize = 0;
    let mut right: usize = cws.len();
    while left < right {
        let mid = (left + right) / 2;
        if cws[mid] <= r {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

#[inline]
fn lower_bound_standard(cws: &[f64], r: f64) -> usize {
    cws.iter().position(|&w| w > r).unwrap_or(cws.len())
}

/// Smallest index `i` with `cws[i] > r` on a non-decreasing array
#[inline]
pub fn lower_bound(cws: &[f64], r: f64) -> usize {
    // linear scan beats bisection on the short arrays typical for K
    if cws.len() > 9 {
        lower_bound_bisection(cws, r)
    } else {
        lower_bound_standard(cws, r)
    }
}

/// Draw an index from an unnormalised cumulative weight array
///
/// Returns `None` when the total mass is zero, negative or non-finite.
pub fn draw_from_cumulative<R: Rng>(cws: &[f64], rng: &mut R) -> Option<usize> {
    let total = *cws.last()?;
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let r = rng.gen::<f64>() * total;
    let ix = lower_bound(cws, r);
    if ix < cws.len() {
        Some(ix)
    } else {
        None
    }
}

/// `Σ_i [ψ(xs(i) + offset) − ψ(offset)]` over `len` items
///
/// The shared `ψ(offset)` term is hoisted out of the loop.
pub fn digamma_sum<F>(xs: F, len: usize, offset: f64) -> f64
where
    F: Fn(usize) -> f64,
{
    let d_offset = offset.digamma();
    (0..len).fold(0.0, |acc, i| acc + (xs(i) + offset).digamma() - d_offset)
}
