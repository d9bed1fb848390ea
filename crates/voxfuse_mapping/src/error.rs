//! # Mapping Error Types
//!
//! Every error here is raised before the map is touched, except
//! [`MappingError::ResourceExhausted`], which may interrupt a call after some
//! blocks were already updated.

use thiserror::Error;
use voxfuse_core::StorageError;
use voxfuse_shared::IntrinsicsDefect;

/// Invalid configuration or mismatched inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// An image does not match the resolution of its camera or of the frame
    /// it is aligned to.
    #[error("{image} image is {actual_cols}x{actual_rows}, expected {expected_cols}x{expected_rows}")]
    ResolutionMismatch {
        /// Which image was rejected.
        image: &'static str,
        /// Expected column count.
        expected_cols: usize,
        /// Expected row count.
        expected_rows: usize,
        /// Actual column count.
        actual_cols: usize,
        /// Actual row count.
        actual_rows: usize,
    },

    /// Voxel size must be positive and finite.
    #[error("invalid voxel size: {0}")]
    InvalidVoxelSize(f32),

    /// A numeric parameter is out of range.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// The requested modality was disabled in the mapper config.
    #[error("{0} layer is disabled")]
    ModalityDisabled(&'static str),

    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),

    /// Config file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Inputs that cannot be integrated.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InputValidityError {
    /// A pose or transform contains NaN or infinity.
    #[error("{0} transform is not finite")]
    NonFinitePose(&'static str),

    /// Camera intrinsics cannot be projected through.
    #[error("{camera} camera intrinsics are degenerate: {defect:?}")]
    DegenerateIntrinsics {
        /// Which camera was rejected.
        camera: &'static str,
        /// What is wrong with it.
        defect: IntrinsicsDefect,
    },
}

/// Errors that can occur while integrating frames.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Invalid configuration or mismatched resolutions.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Non-finite pose or degenerate intrinsics.
    #[error(transparent)]
    InputValidity(#[from] InputValidityError),

    /// The block pool ran out of space mid-call. Blocks already updated in
    /// the same call keep their new values.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(StorageError),

    /// Block storage broke its own bookkeeping. The map may have been
    /// partially updated.
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for MappingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidVoxelSize(size) => {
                Self::Configuration(ConfigurationError::InvalidVoxelSize(size))
            }
            StorageError::Exhausted { .. } => Self::ResourceExhausted(err),
            StorageError::CorruptSlot { .. } => Self::Storage(err),
        }
    }
}

impl MappingError {
    /// True for errors guaranteed to leave the map untouched.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InputValidity(_))
    }
}

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_classified() {
        let exhausted: MappingError = StorageError::Exhausted { capacity: 4 }.into();
        assert!(matches!(exhausted, MappingError::ResourceExhausted(_)));
        assert!(!exhausted.is_rejection());

        let bad_size: MappingError = StorageError::InvalidVoxelSize(0.0).into();
        assert_eq!(
            bad_size,
            MappingError::Configuration(ConfigurationError::InvalidVoxelSize(0.0))
        );
        assert!(bad_size.is_rejection());

        let corrupt: MappingError = StorageError::CorruptSlot { index: 9 }.into();
        assert!(matches!(corrupt, MappingError::Storage(_)));
        assert!(!matches!(corrupt, MappingError::ResourceExhausted(_)));
        assert!(!corrupt.is_rejection());
        assert_eq!(corrupt.to_string(), "storage failure: block slot 9 is corrupt");
    }

    #[test]
    fn test_messages() {
        let err = MappingError::from(ConfigurationError::ResolutionMismatch {
            image: "mask",
            expected_cols: 64,
            expected_rows: 48,
            actual_cols: 32,
            actual_rows: 24,
        });
        assert_eq!(err.to_string(), "mask image is 32x24, expected 64x48");

        let err = MappingError::from(InputValidityError::NonFinitePose("T_L_C"));
        assert_eq!(err.to_string(), "T_L_C transform is not finite");
    }
}
