//! Interpolation helpers.
//!
//! Linear interpolation for translation/scale and a shortest-arc quaternion
//! SLERP for rotation, plus the per-joint combination of both.

pub mod functions;

pub use functions::{interpolate_joint_pose, lerp_f32, lerp_vec3, slerp_quat};
