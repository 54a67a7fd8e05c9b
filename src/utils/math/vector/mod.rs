//! Dense vector arithmetic over `num::Float`.
//!
//! Every vector handled by the engine has one coordinate per vocabulary term,
//! so the operations here assume equal lengths and only check it in debug builds.

use num::Float;

/// ドット積
///
/// # Arguments
/// * `a` - ベクトル
/// * `b` - 同じ長さのベクトル
#[inline]
pub fn dot<N: Float>(a: &[N], b: &[N]) -> N {
    debug_assert_eq!(a.len(), b.len(), "Vectors must be of the same length to compute dot product.");
    a.iter().zip(b).fold(N::zero(), |acc, (&x, &y)| acc + x * y)
}

#[inline]
pub fn norm_sq<N: Float>(a: &[N]) -> N {
    a.iter().fold(N::zero(), |acc, &x| acc + x * x)
}

/// ユークリッドノルム
#[inline]
pub fn norm<N: Float>(a: &[N]) -> N {
    norm_sq(a).sqrt()
}

/// Cosine similarity `a・b / (|a||b|)`.
/// A zero-norm side yields 0, never NaN.
#[inline]
pub fn cosine<N: Float>(a: &[N], b: &[N]) -> N {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == N::zero() || norm_b == N::zero() {
        return N::zero();
    }
    let score = dot(a, b) / (norm_a * norm_b);
    if score.is_nan() {
        N::zero()
    } else {
        score
    }
}

/// `acc += scale * x`
#[inline]
pub fn add_scaled<N: Float>(acc: &mut [N], scale: N, x: &[N]) {
    debug_assert_eq!(acc.len(), x.len(), "Vectors must be of the same length to accumulate.");
    for (a, &v) in acc.iter_mut().zip(x) {
        *a = *a + scale * v;
    }
}

#[inline]
pub fn is_zero<N: Float>(a: &[N]) -> bool {
    a.iter().all(|v| v.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_and_norm() {
        let a = [1.0_f64, 2.0, 2.0];
        let b = [2.0_f64, 0.0, 1.0];
        assert_eq!(dot(&a, &b), 4.0);
        assert_eq!(norm(&a), 3.0);
        assert_eq!(norm_sq(&b), 5.0);
    }

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        let a = [1.0_f64, 1.0, 0.0];
        assert!((cosine(&a, &[2.0, 2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert_eq!(cosine(&a, &[0.0, 0.0, 3.0]), 0.0);
    }

    #[test]
    fn cosine_zero_norm_returns_zero_not_nan() {
        let zero = [0.0_f64, 0.0];
        let nonzero = [1.0_f64, 2.0];
        assert_eq!(cosine(&zero, &nonzero), 0.0);
        assert_eq!(cosine(&nonzero, &zero), 0.0);
        assert_eq!(cosine(&zero, &zero), 0.0);
    }

    #[test]
    fn add_scaled_accumulates_and_allows_negative() {
        let mut acc = vec![1.0_f64, 0.0];
        add_scaled(&mut acc, -0.5, &[1.0, 4.0]);
        assert_eq!(acc, vec![0.5, -2.0]);
        assert!(!is_zero(&acc));
        assert!(is_zero(&[0.0_f32, 0.0]));
    }
}
