//! Quantile evaluation for [`Digest`].
//!
//! Index mapping: `q ∈ [0,1]` becomes a target cumulative weight
//! `t = q·N` where `N = Σw`. Each centroid's mass is centered at half its
//! weight past its left boundary; between adjacent centroids the value is
//! interpolated linearly in weight between the two centers. Outside the
//! first/last center there is no second centroid to interpolate against,
//! so the boundary centroid's mean is returned as-is.
//!
//! The result is monotone in `q` by construction: centers are strictly
//! increasing in cumulative weight and means are strictly increasing.

use crate::digest::Digest;
use crate::error::{Error, Result};

impl Digest {
    /// Estimate the value at quantile `q`. Flushes pending points first;
    /// `q` outside `[0, 1]` is clamped (the command layer rejects it
    /// before it gets here), NaN is refused.
    pub fn quantile(&mut self, q: f64) -> Result<f64> {
        if q.is_nan() {
            return Err(Error::InvalidValue {
                context: "quantile rank",
            });
        }
        self.flush();
        let cents = self.centroids();
        if cents.is_empty() {
            return Err(Error::EmptyDigest);
        }
        if cents.len() == 1 {
            return Ok(cents[0].mean());
        }

        let q = q.clamp(0.0, 1.0);
        let total = self.total_weight();
        let target = q * total;

        // Below the first center: only the boundary centroid speaks.
        let mut left_center = cents[0].weight() / 2.0;
        if target <= left_center {
            return Ok(cents[0].mean());
        }

        for i in 0..cents.len() - 1 {
            let span = (cents[i].weight() + cents[i + 1].weight()) / 2.0;
            let right_center = left_center + span;
            if target <= right_center {
                let frac = (target - left_center) / span;
                let m_l = cents[i].mean();
                let m_r = cents[i + 1].mean();
                return Ok(m_l + frac * (m_r - m_l));
            }
            left_center = right_center;
        }

        // Above the last center.
        Ok(cents[cents.len() - 1].mean())
    }
}

#[cfg(test)]
mod tests {
    use crate::digest::test_helpers::{assert_monotone_chain, assert_rel_close};
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
        assert_eq!(d.quantile(0.5), Err(Error::EmptyDigest));
    }

    #[test]
    fn nan_rank_is_refused() {
        let mut d = ramp_digest(10, 100.0);
        assert!(matches!(
            d.quantile(f64::NAN),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn single_observation_answers_every_rank() {
        let mut d = Digest::new(100.0);
        d.add(42.0, 3.0).unwrap();
        for &q in &[0.0, 0.25, 0.5, 1.0] {
            assert_eq!(d.quantile(q).unwrap(), 42.0);
        }
    }

    #[test]
    fn median_of_uniform_ramp_lands_near_the_middle() {
        let mut d = ramp_digest(1000, 100.0);
        let med = d.quantile(0.5).unwrap();
        assert_rel_close("median", 499.5, med, 0.01);
    }

    #[test]
    fn quantiles_are_monotone_in_q() {
        let mut d = ramp_digest(5000, 50.0);
        let grid: Vec<f64> = (0..=100)
            .map(|i| d.quantile(i as f64 / 100.0).unwrap())
            .collect();
        assert_monotone_chain("quantile grid", &grid);
    }

    #[test]
    fn rank_extremes_return_boundary_centroid_means() {
        let mut d = ramp_digest(200, 20.0);
        d.flush();
        let first = d.centroids().first().unwrap().mean();
        let last = d.centroids().last().unwrap().mean();
        assert_eq!(d.quantile(0.0).unwrap(), first);
        assert_eq!(d.quantile(1.0).unwrap(), last);
    }

    #[test]
    fn out_of_range_ranks_clamp() {
        let mut d = ramp_digest(100, 100.0);
        assert_eq!(d.quantile(-0.5).unwrap(), d.quantile(0.0).unwrap());
        assert_eq!(d.quantile(1.5).unwrap(), d.quantile(1.0).unwrap());
    }

    #[test]
    fn weight_pulls_quantiles_toward_the_heavy_point() {
        let mut d = Digest::new(100.0);
        d.add(0.0, 9.0).unwrap();
        d.add(10.0, 1.0).unwrap();
        // 90% of the mass sits at 0: low ranks pin there, the median
        // barely leaves it, the tail reaches the light point.
        assert_eq!(d.quantile(0.3).unwrap(), 0.0);
        assert!(d.quantile(0.5).unwrap() < 2.0);
        assert!(d.quantile(0.99).unwrap() > 5.0);
    }
}
