//! The scale function that shapes cluster budgets along the distribution.
//!
//! This is the one place in the crate where floating-point policy is
//! pinned exactly: the clamp boundary and the arithmetic order below are
//! part of the persisted-digest contract, because they decide how every
//! digest compacts. Treat the function as pure math; do not "optimize" it.

/// Clamp boundary for the cumulative fraction `q`.
pub(crate) const Q_EPS: f64 = 1e-15;

#[inline]
pub(crate) fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Maximum weight a cluster centered at cumulative fraction `q` may hold.
///
/// Logistic (k₂) scale in weight-limit form: the Δk ≤ 1 rule for
/// `k(q) = (δ/4)·ln(q/(1−q))` is exactly `Δq ≤ 4·q·(1−q)/δ`. Budgets
/// vanish toward q→0/1 (tails compact into near-singletons, keeping
/// relative error tight there) and peak at the median.
#[inline]
pub(crate) fn cluster_capacity(q: f64, total_weight: f64, compression: f64) -> f64 {
    let qq = clamp(q, Q_EPS, 1.0 - Q_EPS);
    4.0 * total_weight * qq * (1.0 - qq) / compression
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_peaks_at_the_median() {
        let mid = cluster_capacity(0.5, 1000.0, 100.0);
        for &q in &[0.01, 0.1, 0.25, 0.75, 0.9, 0.99] {
            assert!(cluster_capacity(q, 1000.0, 100.0) < mid);
        }
        assert_eq!(mid, 10.0); // 4·1000·0.25/100, exact in f64
    }

    #[test]
    fn capacity_is_symmetric_around_the_median() {
        // Dyadic ranks keep 1−q exact, so the mirrored products are
        // bit-identical by commutativity.
        for &q in &[0.0625, 0.125, 0.25, 0.375] {
            let lo = cluster_capacity(q, 5000.0, 50.0);
            let hi = cluster_capacity(1.0 - q, 5000.0, 50.0);
            assert_eq!(lo.to_bits(), hi.to_bits());
        }
    }

    #[test]
    fn extreme_q_clamps_instead_of_going_negative() {
        assert!(cluster_capacity(-3.0, 1000.0, 100.0) > 0.0);
        assert!(cluster_capacity(7.0, 1000.0, 100.0) > 0.0);
        // At the clamp boundary the budget is tiny but positive.
        assert!(cluster_capacity(0.0, 1000.0, 100.0) < 1e-10);
    }

    #[test]
    fn capacity_is_bit_reproducible() {
        let a = cluster_capacity(0.137, 123456.0, 100.0);
        let b = cluster_capacity(0.137, 123456.0, 100.0);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
