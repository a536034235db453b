//! Dense vector helpers used by the embedding side.
//! Computations are carried out in `f64` whatever the storage type.

use num::Float;

/// Dot product.
///
/// # Arguments
/// * `a`, `b` - vectors of the same length
///
/// # Returns
/// * `f64` - dot product (extra components of the longer vector are ignored)
#[inline]
pub fn dot<N: Float>(a: &[N], b: &[N]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be of the same length to compute dot product.");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.to_f64().unwrap_or(0.0) * y.to_f64().unwrap_or(0.0))
        .sum()
}

#[inline]
pub fn norm_sq<N: Float>(a: &[N]) -> f64 {
    a.iter()
        .map(|x| {
            let v = x.to_f64().unwrap_or(0.0);
            v * v
        })
        .sum()
}

/// Cosine similarity.
///
/// # Returns
/// * `None` - lengths differ or one of the vectors has no magnitude
#[inline]
pub fn cosine<N: Float>(a: &[N], b: &[N]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let denom = (norm_sq(a) * norm_sq(b)).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let sim = dot(a, b) / denom;
    sim.is_finite().then_some(sim)
}

/// `acc += v * scale`
#[inline]
pub fn add_scaled<N: Float>(acc: &mut [N], v: &[N], scale: N) {
    debug_assert_eq!(acc.len(), v.len());
    for (a, x) in acc.iter_mut().zip(v.iter()) {
        *a = *a + *x * scale;
    }
}

/// Scale to unit length. A zero vector is left untouched.
#[inline]
pub fn normalize<N: Float>(a: &mut [N]) {
    let norm = norm_sq(a).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return;
    }
    let inv = N::from(1.0 / norm).unwrap_or_else(N::one);
    for x in a.iter_mut() {
        *x = *x * inv;
    }
}

/// Dimension-wise geometric-mean-like aggregation.
///
/// For each dimension `d`: `pow(|Π non-zero components|, 1 / count)` where
/// `count` is the number of non-zero components seen in that dimension.
/// A dimension without non-zero component stays `0.0`.
/// Evaluated in log space so long products do not underflow.
///
/// # Returns
/// * `Vec<f64>` - length of the longest input
pub fn geometric_aggregate<N: Float>(vectors: &[&[N]]) -> Vec<f64> {
    let dim = vectors.iter().map(|v| v.len()).max().unwrap_or(0);
    let mut log_sum = vec![0.0f64; dim];
    let mut count = vec![0u32; dim];
    for v in vectors {
        for (d, x) in v.iter().enumerate() {
            let x = x.to_f64().unwrap_or(0.0);
            if x != 0.0 && x.is_finite() {
                log_sum[d] += x.abs().ln();
                count[d] += 1;
            }
        }
    }
    log_sum
        .into_iter()
        .zip(count)
        .map(|(ls, c)| if c == 0 { 0.0 } else { (ls / c as f64).exp() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [2.0f32, 4.0, 6.0];
        let c = [3.0f32, 0.0, -1.0];
        assert!((cosine(&a, &b).unwrap() - 1.0).abs() < 1e-6);
        assert!(cosine(&a, &c).unwrap().abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_degenerate_input() {
        assert_eq!(cosine::<f64>(&[], &[]), None);
        assert_eq!(cosine(&[0.0f64, 0.0], &[1.0, 1.0]), None);
        assert_eq!(cosine(&[1.0f64], &[1.0, 1.0]), None);
    }

    #[test]
    fn normalize_gives_unit_length() {
        let mut v = vec![3.0f64, 4.0];
        normalize(&mut v);
        assert!((norm_sq(&v) - 1.0).abs() < 1e-12);

        let mut zero = vec![0.0f32; 4];
        normalize(&mut zero);
        assert!(zero.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn geometric_aggregate_skips_zero_components() {
        let a = [2.0f64, 0.0, -1.0];
        let b = [8.0f64, 0.0, 4.0];
        let c = [0.0f64, 0.0, 0.0];
        let agg = geometric_aggregate(&[&a[..], &b[..], &c[..]]);
        assert!((agg[0] - 4.0).abs() < 1e-9); // sqrt(2 * 8)
        assert_eq!(agg[1], 0.0);
        assert!((agg[2] - 2.0).abs() < 1e-9); // sqrt(|-1 * 4|)
    }

    #[test]
    fn add_scaled_accumulates() {
        let mut acc = vec![1.0f32, 1.0];
        add_scaled(&mut acc, &[2.0, -1.0], 0.5);
        assert_eq!(acc, vec![2.0, 0.5]);
    }
}
