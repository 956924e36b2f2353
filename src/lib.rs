//! VecQuant - Scalar vector quantization for nearest-neighbor search.
//!
//! This library trains compact, lossy encodings of high-dimensional float
//! vectors, applies them at scale, and reconstructs approximate vectors for
//! re-scoring. It shrinks the memory and disk footprint of large vector
//! collections while keeping enough geometric fidelity for ranking.
//!
//! # Components
//!
//! - **Sampling**: single-pass reservoir sampling picks a bounded, unbiased
//!   training subset from a population reachable only through a forward
//!   cursor.
//! - **Quantizers**: one-bit (mean thresholds) and multi-bit (2/4 bits per
//!   coordinate, mean/stddev thresholds) scalar quantizers behind a common
//!   [`Quantizer`](quantizer::Quantizer) trait.
//! - **State**: immutable trained parameters with versioned, bit-exact
//!   binary serialization, cached per field.
//! - **Reconstruction**: FP16 and signed 8-bit decoders for query-time
//!   rescoring of quantized payloads.
//!
//! All operations are synchronous, CPU-bound, and in-memory; persistence
//! streams and vector cursors are supplied by the host.
//!
//! # Examples
//!
//! ```rust
//! use vecquant::prelude::*;
//!
//! let service = QuantizationService::new();
//! let vectors = vec![
//!     vec![1.0, 2.0, 3.0],
//!     vec![4.0, 5.0, 6.0],
//!     vec![7.0, 8.0, 9.0],
//! ];
//!
//! let params = ScalarQuantizationParams::new(ScalarQuantizationType::OneBit);
//! let state = service
//!     .train(params, || vectors.clone().into_iter(), vectors.len())
//!     .unwrap();
//!
//! let mut output = service.create_output(&params);
//! service.quantize(&state, &[7.0, 8.0, 9.0], &mut output).unwrap();
//! assert_eq!(output.quantized_vector(), &[0b1110_0000]);
//! ```

pub mod cache;
pub mod error;
pub mod output;
pub mod packer;
pub mod quantizer;
pub mod reconstruct;
pub mod registry;
pub mod sampler;
pub mod service;
pub mod state;
pub mod training;

pub use error::{QuantizationError, QuantizationResult};

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::cache::QuantizationStateCache;
    pub use crate::error::{QuantizationError, QuantizationResult};
    pub use crate::output::QuantizationOutput;
    pub use crate::quantizer::{
        Metric, MultiBitScalarQuantizer, OneBitScalarQuantizer, Quantizer,
    };
    pub use crate::reconstruct::{create_reconstructor, Reconstructor, ReconstructorKind};
    pub use crate::registry::{QuantizationKind, QuantizerRegistry};
    pub use crate::sampler::{create_sampler, ReservoirSampler, Sampler, SamplerKind};
    pub use crate::service::QuantizationService;
    pub use crate::state::{
        QuantizationState, ScalarQuantizationParams, ScalarQuantizationType,
    };
    pub use crate::training::{TrainingRequest, VectorSource};
}
