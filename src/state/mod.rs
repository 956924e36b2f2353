//! Trained quantization state: parameters, thresholds, correction statistics,
//! and their versioned binary serialization.
//!
//! States are produced once per training run and immutable afterwards.
//! Serialization is little-endian with a magic number and version word;
//! every optional field is guarded by a presence flag so older payloads
//! missing newer fields still deserialize. Round-trips are bit-exact.

mod io;

use crate::error::{QuantizationError, QuantizationResult};
use self::io::*;
use std::io::{Read, Write};

/// Magic number for serialized quantization state ("VQST").
pub const STATE_MAGIC: u32 = 0x5651_5354;

/// Current state serialization version.
///
/// Version 1 predates the random-rotation and ADC flags; they default to
/// `false` when reading a version-1 payload.
pub const STATE_VERSION: u32 = 2;

/// Scalar quantization sub-type: bits encoded per vector coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScalarQuantizationType {
    OneBit = 1,
    TwoBit = 2,
    FourBit = 4,
}

impl ScalarQuantizationType {
    /// Bits stored per coordinate.
    pub fn bits_per_coordinate(&self) -> usize {
        *self as usize
    }

    /// Encoded byte length for one vector of `dimension` coordinates.
    pub fn bytes_per_vector(&self, dimension: usize) -> usize {
        (self.bits_per_coordinate() * dimension + 7) / 8
    }

    /// Stable string identifier used as the registry key.
    pub fn type_identifier(&self) -> &'static str {
        match self {
            ScalarQuantizationType::OneBit => "1bit",
            ScalarQuantizationType::TwoBit => "2bit",
            ScalarQuantizationType::FourBit => "4bit",
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ScalarQuantizationType::OneBit),
            2 => Some(ScalarQuantizationType::TwoBit),
            4 => Some(ScalarQuantizationType::FourBit),
            _ => None,
        }
    }
}

/// Identity of a scalar quantization scheme.
///
/// Used as the registry and cache discriminator; immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarQuantizationParams {
    pub sq_type: ScalarQuantizationType,
    /// Apply a random Gaussian rotation before thresholding to de-correlate
    /// axes.
    pub enable_random_rotation: bool,
    /// Retain below/above-threshold means for asymmetric distance
    /// correction at query time.
    pub enable_adc: bool,
}

impl ScalarQuantizationParams {
    pub fn new(sq_type: ScalarQuantizationType) -> Self {
        Self {
            sq_type,
            enable_random_rotation: false,
            enable_adc: false,
        }
    }

    pub fn with_random_rotation(mut self, enabled: bool) -> Self {
        self.enable_random_rotation = enabled;
        self
    }

    pub fn with_adc(mut self, enabled: bool) -> Self {
        self.enable_adc = enabled;
        self
    }

    /// Stable identifier for registry lookup.
    pub fn type_identifier(&self) -> &'static str {
        self.sq_type.type_identifier()
    }
}

/// Trained state for one-bit scalar quantization.
///
/// One threshold per dimension (the per-dimension mean over the training
/// sample); the optional statistics support asymmetric distance correction.
#[derive(Debug, Clone, PartialEq)]
pub struct OneBitScalarQuantizationState {
    pub params: ScalarQuantizationParams,
    /// Per-dimension mean thresholds.
    pub mean_thresholds: Vec<f32>,
    /// Per-dimension mean of training values strictly below the threshold.
    pub below_threshold_means: Option<Vec<f32>>,
    /// Per-dimension mean of training values at or above the threshold.
    pub above_threshold_means: Option<Vec<f32>>,
    /// Average L2/L1 norm ratio over the training sample; rescales
    /// Hamming-style distances back toward Euclidean.
    pub average_l2_l1_ratio: Option<f64>,
    /// Rotation applied to vectors before thresholding, `dim x dim`.
    pub rotation_matrix: Option<Vec<Vec<f32>>>,
}

/// Trained state for multi-bit scalar quantization.
///
/// `bits_per_coordinate` threshold rows per dimension; row 0 is the most
/// significant bit plane.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiBitScalarQuantizationState {
    pub params: ScalarQuantizationParams,
    /// Threshold matrix, `bits x dimension`.
    pub thresholds: Vec<Vec<f32>>,
    pub below_threshold_means: Option<Vec<f32>>,
    pub above_threshold_means: Option<Vec<f32>>,
    pub average_l2_l1_ratio: Option<f64>,
    pub rotation_matrix: Option<Vec<Vec<f32>>>,
}

/// Immutable trained parameters for a quantization scheme.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizationState {
    OneBit(OneBitScalarQuantizationState),
    MultiBit(MultiBitScalarQuantizationState),
}

impl QuantizationState {
    pub fn params(&self) -> &ScalarQuantizationParams {
        match self {
            QuantizationState::OneBit(state) => &state.params,
            QuantizationState::MultiBit(state) => &state.params,
        }
    }

    /// Vector dimension this state was trained for.
    pub fn dimension(&self) -> usize {
        match self {
            QuantizationState::OneBit(state) => state.mean_thresholds.len(),
            QuantizationState::MultiBit(state) => {
                state.thresholds.first().map_or(0, |row| row.len())
            }
        }
    }

    /// Encoded byte length of one vector under this state.
    pub fn bytes_per_vector(&self) -> usize {
        self.params().sq_type.bytes_per_vector(self.dimension())
    }

    /// Threshold matrix view: one row for one-bit, `bits` rows otherwise.
    pub fn thresholds(&self) -> ThresholdRows<'_> {
        match self {
            QuantizationState::OneBit(state) => ThresholdRows::One(&state.mean_thresholds),
            QuantizationState::MultiBit(state) => ThresholdRows::Many(&state.thresholds),
        }
    }

    pub fn rotation_matrix(&self) -> Option<&[Vec<f32>]> {
        match self {
            QuantizationState::OneBit(state) => state.rotation_matrix.as_deref(),
            QuantizationState::MultiBit(state) => state.rotation_matrix.as_deref(),
        }
    }

    /// Write the state to a byte sink.
    pub fn save<W: Write>(&self, writer: &mut W) -> QuantizationResult<()> {
        write_u32(writer, STATE_MAGIC)?;
        write_u32(writer, STATE_VERSION)?;
        let params = self.params();
        write_u8(writer, params.sq_type as u8)?;

        match self {
            QuantizationState::OneBit(state) => {
                write_usize(writer, state.mean_thresholds.len())?;
                write_f32_all(writer, &state.mean_thresholds)?;
                write_optional_f32_vec(writer, state.below_threshold_means.as_deref())?;
                write_optional_f32_vec(writer, state.above_threshold_means.as_deref())?;
                write_optional_f64(writer, state.average_l2_l1_ratio)?;
                write_optional_matrix(writer, state.rotation_matrix.as_deref())?;
            }
            QuantizationState::MultiBit(state) => {
                let dimension = state.thresholds.first().map_or(0, |row| row.len());
                write_usize(writer, dimension)?;
                write_u32(writer, state.thresholds.len() as u32)?;
                for row in &state.thresholds {
                    write_f32_all(writer, row)?;
                }
                write_optional_f32_vec(writer, state.below_threshold_means.as_deref())?;
                write_optional_f32_vec(writer, state.above_threshold_means.as_deref())?;
                write_optional_f64(writer, state.average_l2_l1_ratio)?;
                write_optional_matrix(writer, state.rotation_matrix.as_deref())?;
            }
        }

        // Fields introduced in version 2.
        write_bool(writer, params.enable_random_rotation)?;
        write_bool(writer, params.enable_adc)?;
        Ok(())
    }

    /// Read a state back from a byte source.
    pub fn load<R: Read>(reader: &mut R) -> QuantizationResult<Self> {
        let magic = read_u32(reader)?;
        if magic != STATE_MAGIC {
            return Err(QuantizationError::InvalidMagicNumber {
                expected: STATE_MAGIC,
                got: magic,
            });
        }
        let version = read_u32(reader)?;
        if version == 0 || version > STATE_VERSION {
            return Err(QuantizationError::UnsupportedVersion(version));
        }

        let sq_type = ScalarQuantizationType::from_u8(read_u8(reader)?).ok_or_else(|| {
            QuantizationError::InvalidData("invalid scalar quantization type".to_string())
        })?;
        let dimension = read_usize(reader)?;

        let mut state = match sq_type {
            ScalarQuantizationType::OneBit => {
                let mean_thresholds = read_f32_exact(reader, dimension)?;
                QuantizationState::OneBit(OneBitScalarQuantizationState {
                    params: ScalarQuantizationParams::new(sq_type),
                    mean_thresholds,
                    below_threshold_means: read_optional_f32_vec(reader)?,
                    above_threshold_means: read_optional_f32_vec(reader)?,
                    average_l2_l1_ratio: read_optional_f64(reader)?,
                    rotation_matrix: read_optional_matrix(reader)?,
                })
            }
            ScalarQuantizationType::TwoBit | ScalarQuantizationType::FourBit => {
                let rows = read_u32(reader)? as usize;
                if rows != sq_type.bits_per_coordinate() {
                    return Err(QuantizationError::InvalidData(format!(
                        "threshold row count {} does not match {} bits per coordinate",
                        rows,
                        sq_type.bits_per_coordinate()
                    )));
                }
                let mut thresholds = Vec::with_capacity(rows);
                for _ in 0..rows {
                    thresholds.push(read_f32_exact(reader, dimension)?);
                }
                QuantizationState::MultiBit(MultiBitScalarQuantizationState {
                    params: ScalarQuantizationParams::new(sq_type),
                    thresholds,
                    below_threshold_means: read_optional_f32_vec(reader)?,
                    above_threshold_means: read_optional_f32_vec(reader)?,
                    average_l2_l1_ratio: read_optional_f64(reader)?,
                    rotation_matrix: read_optional_matrix(reader)?,
                })
            }
        };

        // Version 1 payloads predate these flags; default them off.
        let (enable_random_rotation, enable_adc) = if version >= 2 {
            (read_bool(reader)?, read_bool(reader)?)
        } else {
            (false, false)
        };
        let params = match &mut state {
            QuantizationState::OneBit(s) => &mut s.params,
            QuantizationState::MultiBit(s) => &mut s.params,
        };
        params.enable_random_rotation = enable_random_rotation;
        params.enable_adc = enable_adc;

        Ok(state)
    }

    /// Serialize to an owned byte buffer.
    pub fn to_bytes(&self) -> QuantizationResult<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save(&mut buffer)?;
        Ok(buffer)
    }

    /// Deserialize from a byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> QuantizationResult<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::load(&mut cursor)
    }
}

/// Borrowed view over a state's threshold rows.
pub enum ThresholdRows<'a> {
    One(&'a [f32]),
    Many(&'a [Vec<f32>]),
}

impl ThresholdRows<'_> {
    pub fn row_count(&self) -> usize {
        match self {
            ThresholdRows::One(_) => 1,
            ThresholdRows::Many(rows) => rows.len(),
        }
    }
}
