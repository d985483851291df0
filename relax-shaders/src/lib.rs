//! Compute entry points of the ReLAX pipeline.
//!
//! Every stage reads its parameters from a uniform buffer at
//! `descriptor_set = 0` and its textures from `descriptor_set = 1`: first the
//! inputs, then the outputs, in the order declared by the host's kernel
//! table.

#![cfg_attr(target_arch = "spirv", no_std)]

#[cfg(target_arch = "spirv")]
pub mod atrous;
#[cfg(target_arch = "spirv")]
pub mod disocclusion_fix;
#[cfg(target_arch = "spirv")]
pub mod firefly;
#[cfg(target_arch = "spirv")]
pub mod history_clamping;
#[cfg(target_arch = "spirv")]
pub mod prepass;
#[cfg(target_arch = "spirv")]
pub mod reprojection;
#[cfg(target_arch = "spirv")]
pub mod spatial_variance_estimation;
#[cfg(target_arch = "spirv")]
pub mod split_screen;
