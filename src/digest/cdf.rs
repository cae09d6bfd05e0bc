//! CDF (cumulative distribution) evaluation for [`Digest`].
//!
//! The inverse of the quantile walk: accumulate the weight of centroids
//! whose mean lies below the probe, interpolate linearly inside the
//! straddling pair using half-weights, and divide by the total. Midpoint
//! semantics pair with the quantile side (`cdf(mean[i])` is
//! `(prefix_i + w_i/2) / N`), so `cdf(quantile(q))` returns `q` exactly
//! wherever the interior interpolation is in play.

use crate::digest::Digest;
use crate::error::{Error, Result};

impl Digest {
    /// Estimate the fraction of absorbed weight at or below `x`, in
    /// `[0, 1]`. Flushes pending points first; NaN probes are refused.
    pub fn cdf(&mut self, x: f64) -> Result<f64> {
        if x.is_nan() {
            return Err(Error::InvalidValue {
                context: "cdf probe",
            });
        }
        self.flush();
        let cents = self.centroids();
        if cents.is_empty() {
            return Err(Error::EmptyDigest);
        }
        let total = self.total_weight();
        let n = cents.len();

        if n == 1 {
            let m = cents[0].mean();
            return Ok(if x < m {
                0.0
            } else if x > m {
                1.0
            } else {
                0.5
            });
        }
        if x < cents[0].mean() {
            return Ok(0.0);
        }
        if x > cents[n - 1].mean() {
            return Ok(1.0);
        }

        let mut cum = 0.0;
        for i in 0..n {
            let m_i = cents[i].mean();
            let w_i = cents[i].weight();
            if x == m_i {
                // Exact hit: midpoint mass.
                return Ok(((cum + w_i / 2.0) / total).clamp(0.0, 1.0));
            }
            if x < m_i {
                // Straddling pair (i-1, i); x > mean[i-1] is guaranteed by
                // the walk order and the edge checks above.
                let m_l = cents[i - 1].mean();
                let w_l = cents[i - 1].weight();
                let frac = (x - m_l) / (m_i - m_l);
                let below = (cum - w_l) + w_l / 2.0 + frac * (w_l + w_i) / 2.0;
                return Ok((below / total).clamp(0.0, 1.0));
            }
            cum += w_i;
        }
        Ok(1.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::digest::test_helpers::assert_monotone_chain;
    use crate::digest::Digest;
    use crate::error::Error;

    fn ramp_digest(n: usize, compression: f64) -> Digest {
        let mut d = Digest::new(compression);
        for i in 0..n {
            d.add(i as f64, 1.0).unwrap();
        }
        d
    }

    #[test]
    fn empty_digest_is_an_error() {
        let mut d = Digest::new(100.0);
        assert_eq!(d.cdf(0.0), Err(Error::EmptyDigest));
    }

    #[test]
    fn nan_probe_is_refused() {
        let mut d = ramp_digest(10, 100.0);
        assert!(matches!(d.cdf(f64::NAN), Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn single_centroid_is_a_step() {
        let mut d = Digest::new(100.0);
        d.add(5.0, 4.0).unwrap();
        assert_eq!(d.cdf(4.9).unwrap(), 0.0);
        assert_eq!(d.cdf(5.0).unwrap(), 0.5);
        assert_eq!(d.cdf(5.1).unwrap(), 1.0);
    }

    #[test]
    fn outside_support_clamps_to_zero_and_one() {
        let mut d = ramp_digest(100, 20.0);
        assert_eq!(d.cdf(-1e9).unwrap(), 0.0);
        assert_eq!(d.cdf(1e9).unwrap(), 1.0);
        // Infinite probes are legal (only NaN is malformed).
        assert_eq!(d.cdf(f64::NEG_INFINITY).unwrap(), 0.0);
        assert_eq!(d.cdf(f64::INFINITY).unwrap(), 1.0);
    }

    #[test]
    fn cdf_is_monotone_and_bounded() {
        let mut d = ramp_digest(5000, 50.0);
        let grid: Vec<f64> = (-10..=60)
            .map(|i| d.cdf(i as f64 * 100.0).unwrap())
            .collect();
        for &p in &grid {
            assert!((0.0..=1.0).contains(&p));
        }
        assert_monotone_chain("cdf grid", &grid);
    }

    #[test]
    fn uniform_ramp_cdf_tracks_rank() {
        let mut d = ramp_digest(10_000, 100.0);
        for &(x, expect) in &[(999.5, 0.1), (4999.5, 0.5), (8999.5, 0.9)] {
            let p = d.cdf(x).unwrap();
            assert!(
                (p - expect).abs() < 0.01,
                "cdf({x}) = {p}, expected ≈ {expect}"
            );
        }
    }

    #[test]
    fn inverts_quantile_in_the_interior() {
        let mut d = ramp_digest(2000, 100.0);
        for i in 1..20 {
            let q = i as f64 / 20.0;
            let x = d.quantile(q).unwrap();
            let p = d.cdf(x).unwrap();
            assert!((p - q).abs() < 0.01, "cdf(quantile({q})) = {p}");
        }
    }
}
