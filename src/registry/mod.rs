//! Quantizer registry.
//!
//! Maps a quantization-parameter identity to a quantizer constructor. The
//! registry is an explicitly constructed service owned by the host's
//! composition root and passed by handle; it is not process-global state.
//! The entry set is fixed at startup; re-registering a key replaces it
//! (idempotent for the fixed startup set), and there is no removal path.

use crate::error::{QuantizationError, QuantizationResult};
use crate::quantizer::{MultiBitScalarQuantizer, OneBitScalarQuantizer, Quantizer};
use crate::state::{ScalarQuantizationParams, ScalarQuantizationType};
use std::collections::HashMap;

/// Top-level family of quantization schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizationKind {
    Scalar,
}

impl QuantizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantizationKind::Scalar => "scalar",
        }
    }
}

/// Constructor closure producing a quantizer for matching parameters.
pub type QuantizerConstructor =
    Box<dyn Fn(&ScalarQuantizationParams) -> QuantizationResult<Box<dyn Quantizer>> + Send + Sync>;

/// Registry from `(kind, type identifier)` to quantizer constructors.
pub struct QuantizerRegistry {
    entries: HashMap<(QuantizationKind, String), QuantizerConstructor>,
}

impl QuantizerRegistry {
    /// An empty registry, for hosts that wire their own quantizers.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry pre-populated with the scalar quantizer family.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            QuantizationKind::Scalar,
            ScalarQuantizationType::OneBit.type_identifier(),
            Box::new(|_| Ok(Box::new(OneBitScalarQuantizer::new()) as Box<dyn Quantizer>)),
        );
        for sq_type in [ScalarQuantizationType::TwoBit, ScalarQuantizationType::FourBit] {
            registry.register(
                QuantizationKind::Scalar,
                sq_type.type_identifier(),
                Box::new(move |_| {
                    Ok(Box::new(MultiBitScalarQuantizer::new(sq_type)?) as Box<dyn Quantizer>)
                }),
            );
        }
        registry
    }

    /// Register a constructor; an existing entry for the same key is
    /// replaced.
    pub fn register(
        &mut self,
        kind: QuantizationKind,
        type_identifier: &str,
        constructor: QuantizerConstructor,
    ) {
        self.entries
            .insert((kind, type_identifier.to_string()), constructor);
    }

    /// Construct the quantizer registered for the given parameters.
    pub fn quantizer_for(
        &self,
        params: &ScalarQuantizationParams,
    ) -> QuantizationResult<Box<dyn Quantizer>> {
        let key = (QuantizationKind::Scalar, params.type_identifier().to_string());
        match self.entries.get(&key) {
            Some(constructor) => constructor(params),
            None => Err(QuantizationError::UnsupportedScheme {
                kind: key.0.as_str().to_string(),
                type_identifier: key.1,
            }),
        }
    }
}

impl Default for QuantizerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
