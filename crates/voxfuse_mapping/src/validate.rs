//! Up-front input checks shared by the integrators and gates.

use voxfuse_shared::{Camera, Image, Transform};

use crate::error::{ConfigurationError, InputValidityError};

pub(crate) fn check_camera(name: &'static str, camera: &Camera) -> Result<(), InputValidityError> {
    camera
        .validate()
        .map_err(|defect| InputValidityError::DegenerateIntrinsics { camera: name, defect })
}

pub(crate) fn check_pose(name: &'static str, transform: &Transform) -> Result<(), InputValidityError> {
    if transform.is_finite() {
        Ok(())
    } else {
        Err(InputValidityError::NonFinitePose(name))
    }
}

/// The image must have exactly the camera's resolution.
pub(crate) fn check_image<P: Copy + Default>(
    name: &'static str,
    image: &Image<P>,
    camera: &Camera,
) -> Result<(), ConfigurationError> {
    if image.rows() == camera.rows() && image.cols() == camera.cols() {
        Ok(())
    } else {
        Err(ConfigurationError::ResolutionMismatch {
            image: name,
            expected_cols: camera.cols(),
            expected_rows: camera.rows(),
            actual_cols: image.cols(),
            actual_rows: image.rows(),
        })
    }
}
