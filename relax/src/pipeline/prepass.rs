use std::f32::consts::TAU;

use glam::{vec4, Vec4};
use relax_gpu::{PrepassParams, GOLDEN_RATIO, RELAX_MAX_HISTORY_FRAME_NUM};

use crate::{ComputePass, FrameGraph, FrameInputs, FramePool, Kernel, Settings};

pub struct PrepassOutputs<T> {
    pub specular: T,
    pub diffuse: T,

    /// In world units
    pub view_z: T,

    /// In meters
    pub scaled_view_z: T,
}

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    frame_index: u64,
) -> PrepassOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = PrepassOutputs {
        specular: pool.create(graph, "prepass_specular"),
        diffuse: pool.create(graph, "prepass_diffuse"),
        view_z: pool.create(graph, "prepass_view_z"),
        scaled_view_z: pool.create(graph, "prepass_scaled_view_z"),
    };

    let [frustum_right, frustum_up, frustum_forward] = inputs.camera.frustum();

    let params = PrepassParams {
        rotator: rotator(frame_index),
        frustum_right,
        frustum_up,
        frustum_forward,
        resolution: inputs.viewport,
        frame_index: frame_index as u32,
        checkerboard: settings.checkerboard.as_gpu(),
        diffuse_blur_radius: settings.diffuse_blur_radius,
        specular_blur_radius: settings.specular_blur_radius,
        denoising_range: settings.denoising_range,
        units_per_meter: settings.units_per_meter,
    };

    graph.dispatch(
        ComputePass::builder(Kernel::Prepass, "prepass")
            .read(&inputs.specular)
            .read(&inputs.diffuse)
            .read(&inputs.normal_roughness)
            .read(&inputs.view_z)
            .write(&out.specular)
            .write(&out.diffuse)
            .write(&out.view_z)
            .write(&out.scaled_view_z)
            .params(&params)
            .build(inputs.viewport),
    );

    out
}

/// Returns the frame's 2x2 rotation of the blur's sample pattern, as
/// `(cos, sin, -sin, cos)`.
///
/// Consecutive frames are rotated by the golden ratio (of a full turn), so
/// the patterns never line up; the index wraps with the history's length.
pub fn rotator(frame_index: u64) -> Vec4 {
    let idx = (frame_index % RELAX_MAX_HISTORY_FRAME_NUM as u64) as f32;
    let angle = (idx * GOLDEN_RATIO).fract() * TAU;
    let (sin, cos) = angle.sin_cos();

    vec4(cos, sin, -sin, cos)
}
