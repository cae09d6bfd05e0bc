pub mod centroid;
pub mod test_helpers;
pub mod wire;

// Internal building blocks
mod cdf;
mod compressor;
mod digest;
mod quantile;
mod scale;

// Public surface
pub use centroid::Centroid;
pub use digest::{Digest, DEFAULT_COMPRESSION, MIN_COMPRESSION};

// Input validation shared with the command layer.
pub(crate) use digest::{ensure_finite_value, ensure_valid_weight};
