// src/digest/digest.rs
use tracing::trace;

use crate::digest::centroid::Centroid;
use crate::digest::compressor::compress;
use crate::error::{Error, Result};

/// Compression used when the caller does not pick one.
pub const DEFAULT_COMPRESSION: f64 = 100.0;

/// Smallest accepted compression. Below this the sketch degenerates to a
/// single cluster and the error bound stops meaning anything.
pub const MIN_COMPRESSION: f64 = 1.0;

/// Pending points beyond `BUFFER_FACTOR × compression` trigger an
/// automatic fold into the centroid store; `BUFFER_FLOOR` keeps tiny
/// compressions from flushing on every few adds.
const BUFFER_FACTOR: f64 = 5.0;
const BUFFER_FLOOR: usize = 32;

/// A bounded-memory sketch of a multiset of weighted observations.
///
/// New points land in an ingestion buffer and accrue to
/// `unmerged_weight`; the compressor folds the buffer into the ordered
/// centroid store when the buffer fills or before any externally
/// observable read (query, merge-as-source, encode). At all times
/// `total_weight + unmerged_weight` equals the weight ever absorbed:
/// compaction re-clusters, it never discards.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    compression: f64,
    centroids: Vec<Centroid>,
    total_weight: f64,
    buffer: Vec<(f64, f64)>,
    unmerged_weight: f64,
}

#[inline]
pub(crate) fn ensure_finite_value(value: f64, context: &'static str) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidValue { context });
    }
    Ok(())
}

#[inline]
pub(crate) fn ensure_valid_weight(weight: f64, context: &'static str) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(Error::InvalidWeight { context });
    }
    Ok(())
}

impl Digest {
    /// Create an empty digest. `compression` must already be validated
    /// (finite, ≥ [`MIN_COMPRESSION`]) by the caller-facing layer.
    pub fn new(compression: f64) -> Digest {
        debug_assert!(compression.is_finite() && compression >= MIN_COMPRESSION);
        Digest {
            compression,
            centroids: Vec::new(),
            total_weight: 0.0,
            buffer: Vec::new(),
            unmerged_weight: 0.0,
        }
    }

    pub fn with_default_compression() -> Digest {
        Digest::new(DEFAULT_COMPRESSION)
    }

    /// Rebuild from decoded parts. Used by the codec; the centroids must
    /// already be validated and sorted.
    pub(crate) fn from_parts(
        compression: f64,
        centroids: Vec<Centroid>,
        total_weight: f64,
    ) -> Digest {
        Digest {
            compression,
            centroids,
            total_weight,
            buffer: Vec::new(),
            unmerged_weight: 0.0,
        }
    }

    #[inline]
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Total absorbed weight, including points still in the buffer.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight + self.unmerged_weight
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_weight() == 0.0
    }

    /// The compacted centroid store. Call [`Digest::flush`] first when the
    /// view must include pending points.
    #[inline]
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    #[inline]
    fn buffer_limit(&self) -> usize {
        BUFFER_FLOOR.max((BUFFER_FACTOR * self.compression) as usize)
    }

    /// Record one weighted observation.
    pub fn add(&mut self, value: f64, weight: f64) -> Result<()> {
        ensure_finite_value(value, "observation value")?;
        ensure_valid_weight(weight, "observation weight")?;
        self.buffer.push((value, weight));
        self.unmerged_weight += weight;
        if self.buffer.len() >= self.buffer_limit() {
            self.flush();
        }
        Ok(())
    }

    /// Feed another digest's centroids in as synthetic weighted points.
    /// The source slice is copied; compaction stays lazy.
    pub fn absorb(&mut self, centroids: &[Centroid]) {
        for c in centroids {
            self.buffer.push((c.mean(), c.weight()));
            self.unmerged_weight += c.weight();
        }
        if self.buffer.len() >= self.buffer_limit() {
            self.flush();
        }
    }

    /// Fold pending points into the centroid store. Idempotent; the new
    /// store is fully built before it replaces the old one, so no reader
    /// ever observes a partial compaction.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let mut candidates = Vec::with_capacity(self.centroids.len() + self.buffer.len());
        candidates.extend_from_slice(&self.centroids);
        candidates.extend(self.buffer.iter().map(|&(v, w)| Centroid::new(v, w)));

        let (centroids, total_weight) = compress(candidates, self.compression);
        trace!(
            pending = self.buffer.len(),
            centroids = centroids.len(),
            "digest flushed"
        );
        self.centroids = centroids;
        self.total_weight = total_weight;
        self.buffer.clear();
        self.unmerged_weight = 0.0;
    }
}
