use tracing::trace;

use crate::digest::centroid::{is_sorted_strict_by_mean, Centroid};
use crate::digest::scale::cluster_capacity;

/// Fold a candidate set (existing centroids as synthetic points plus
/// buffered raw points) into a fresh, bounded centroid store.
///
/// Returns the new store and the total weight it carries. The walk:
///
/// 1. Stable sort by mean; ties keep insertion order, so identical input
///    sequences compact to bit-identical output.
/// 2. Left to right, grow the current cluster while the proposed weight
///    stays within the scale budget evaluated at the cluster's would-be
///    cumulative midpoint.
/// 3. On refusal, emit the cluster and start a new one with the candidate.
///
/// The result is sorted strictly increasing by mean (adjacent equal-mean
/// clusters are coalesced on emit) and conserves the candidates' weight.
pub(crate) fn compress(mut candidates: Vec<Centroid>, compression: f64) -> (Vec<Centroid>, f64) {
    if candidates.is_empty() {
        return (candidates, 0.0);
    }
    // Vec::sort_by is stable; total_cmp gives a total order over finite means.
    candidates.sort_by(|a, b| a.mean().total_cmp(&b.mean()));

    let total: f64 = candidates.iter().map(|c| c.weight()).sum();

    let mut out: Vec<Centroid> = Vec::new();
    let mut closed = 0.0_f64; // weight of already-emitted clusters
    let mut sigma_w = 0.0_f64; // current cluster: Σw
    let mut sigma_mw = 0.0_f64; // current cluster: Σ w·mean

    for c in &candidates {
        let w = c.weight();
        if sigma_w == 0.0 {
            sigma_w = w;
            sigma_mw = w * c.mean();
            continue;
        }
        let proposed = sigma_w + w;
        let q_mid = (closed + proposed / 2.0) / total;
        if proposed <= cluster_capacity(q_mid, total, compression) {
            sigma_w = proposed;
            sigma_mw += w * c.mean();
        } else {
            emit(&mut out, sigma_mw / sigma_w, sigma_w);
            closed += sigma_w;
            sigma_w = w;
            sigma_mw = w * c.mean();
        }
    }
    emit(&mut out, sigma_mw / sigma_w, sigma_w);

    debug_assert!(is_sorted_strict_by_mean(&out));

    // Re-derive the total from the emitted store, in store order. This is
    // the same sum a decoder computes from the encoded centroids, which
    // keeps query outputs bit-identical across an encode/decode cycle.
    let w_out: f64 = out.iter().map(|c| c.weight()).sum();
    debug_assert!(
        (total - w_out).abs() <= 1e-9 * total.max(1.0),
        "total weight changed during compaction"
    );

    trace!(
        candidates = candidates.len(),
        centroids = out.len(),
        total_weight = w_out,
        "compacted"
    );
    (out, w_out)
}

/// Emit a finished cluster, folding it into the previous one when the
/// means coincide (runs of identical values can otherwise split into
/// adjacent clusters with the same mean).
#[inline]
fn emit(out: &mut Vec<Centroid>, mean: f64, weight: f64) {
    if let Some(last) = out.last_mut() {
        if last.mean() == mean {
            *last = Centroid::new(mean, last.weight() + weight);
            return;
        }
    }
    out.push(Centroid::new(mean, weight));
}
