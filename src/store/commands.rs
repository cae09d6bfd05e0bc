//! The digest command surface. The host engine maps its wire protocol
//! onto these methods; argument parsing and reply encoding stay on its
//! side of the boundary.
//!
//! Every command validates all of its arguments before touching the
//! keyspace state, so a failed call leaves nothing half-applied.

use serde::Serialize;
use tracing::debug;

use super::{Keyspace, Value};
use crate::digest::{
    ensure_finite_value, ensure_valid_weight, wire, Centroid, Digest, DEFAULT_COMPRESSION,
    MIN_COMPRESSION,
};
use crate::error::{Error, Result};

/// Diagnostics reply for INFO.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DigestInfo {
    pub compression: f64,
    pub centroid_count: usize,
    pub encoded_size: usize,
}

impl Keyspace {
    /// CREATE key [compression]: an empty digest under a fresh key.
    pub fn create(&mut self, key: &str, compression: Option<f64>) -> Result<()> {
        let compression = compression.unwrap_or(DEFAULT_COMPRESSION);
        if !compression.is_finite() || compression < MIN_COMPRESSION {
            return Err(Error::InvalidValue {
                context: "compression",
            });
        }
        match self.slot(key) {
            Some(Value::Digest(_)) => Err(Error::AlreadyExists {
                key: key.to_string(),
            }),
            Some(_) => Err(Error::WrongType {
                key: key.to_string(),
            }),
            None => {
                self.insert_digest(key, Digest::new(compression));
                debug!(key, compression, "digest created");
                Ok(())
            }
        }
    }

    /// ADD key value weight [value weight ...]: batched observations.
    /// The whole batch is validated first; either every pair lands or
    /// none does.
    pub fn add(&mut self, key: &str, points: &[(f64, f64)]) -> Result<()> {
        let digest = self.digest_mut(key)?;
        for &(value, weight) in points {
            ensure_finite_value(value, "observation value")?;
            ensure_valid_weight(weight, "observation weight")?;
        }
        for &(value, weight) in points {
            digest.add(value, weight)?;
        }
        debug!(key, points = points.len(), "observations added");
        Ok(())
    }

    /// MERGE dest source [source ...]: fold the sources' distributions
    /// into dest, creating dest with the default compression when absent.
    /// Sources are flushed (their externally visible state anyway), their
    /// centroids copied into dest's buffer; dest keeps its own
    /// compression and therefore its own error bound.
    pub fn merge(&mut self, dest: &str, sources: &[&str]) -> Result<()> {
        // All key checks up front; a missing or mistyped source must not
        // leave dest created or partially merged.
        if let Some(Value::Bytes(_)) = self.slot(dest) {
            return Err(Error::WrongType {
                key: dest.to_string(),
            });
        }
        for source in sources {
            match self.slot(source) {
                None => {
                    return Err(Error::NoSuchKey {
                        key: source.to_string(),
                    })
                }
                Some(Value::Bytes(_)) => {
                    return Err(Error::WrongType {
                        key: source.to_string(),
                    })
                }
                Some(Value::Digest(_)) => {}
            }
        }

        let mut batches: Vec<Vec<Centroid>> = Vec::with_capacity(sources.len());
        for source in sources {
            let digest = self.digest_mut(source)?;
            digest.flush();
            batches.push(digest.centroids().to_vec());
        }

        if !self.contains(dest) {
            self.insert_digest(dest, Digest::with_default_compression());
        }
        let digest = self.digest_mut(dest)?;
        for batch in &batches {
            digest.absorb(batch);
        }
        debug!(dest, sources = sources.len(), "digests merged");
        Ok(())
    }

    /// QUANTILE key q [q ...]: batched value-at-rank queries.
    pub fn quantile(&mut self, key: &str, ranks: &[f64]) -> Result<Vec<f64>> {
        let digest = self.digest_mut(key)?;
        for &q in ranks {
            if !q.is_finite() || !(0.0..=1.0).contains(&q) {
                return Err(Error::InvalidValue {
                    context: "quantile rank",
                });
            }
        }
        ranks.iter().map(|&q| digest.quantile(q)).collect()
    }

    /// CDF key x [x ...]: batched rank-at-value queries.
    pub fn cdf(&mut self, key: &str, probes: &[f64]) -> Result<Vec<f64>> {
        let digest = self.digest_mut(key)?;
        for &x in probes {
            if x.is_nan() {
                return Err(Error::InvalidValue {
                    context: "cdf probe",
                });
            }
        }
        probes.iter().map(|&x| digest.cdf(x)).collect()
    }

    /// INFO key: compression, compacted centroid count, and the exact
    /// encoded byte size.
    pub fn info(&mut self, key: &str) -> Result<DigestInfo> {
        let digest = self.digest_mut(key)?;
        digest.flush();
        let centroid_count = digest.centroids().len();
        Ok(DigestInfo {
            compression: digest.compression(),
            centroid_count,
            encoded_size: wire::encoded_len(centroid_count),
        })
    }
}
