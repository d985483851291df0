use relax_gpu::DisocclusionFixPassParams;

use super::prepass::PrepassOutputs;
use super::reprojection::ReprojectionOutputs;
use crate::{ComputePass, FrameGraph, FrameInputs, FramePool, Kernel, Settings};

pub struct DisocclusionFixOutputs<T> {
    pub specular: T,
    pub diffuse: T,
    pub specular_responsive: T,
    pub diffuse_responsive: T,
}

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    prepass: &PrepassOutputs<G::Texture>,
    reprojection: &ReprojectionOutputs<G::Texture>,
) -> DisocclusionFixOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = DisocclusionFixOutputs {
        specular: pool.create(graph, "disocclusion_fix_specular"),
        diffuse: pool.create(graph, "disocclusion_fix_diffuse"),
        specular_responsive: pool
            .create(graph, "disocclusion_fix_specular_responsive"),
        diffuse_responsive: pool
            .create(graph, "disocclusion_fix_diffuse_responsive"),
    };

    let [frustum_right, frustum_up, frustum_forward] = inputs.camera.frustum();

    let params = DisocclusionFixPassParams {
        frustum_right,
        frustum_up,
        frustum_forward,
        resolution: inputs.viewport,
        frames_to_fix: settings.disocclusion_fix_num_frames_to_fix as f32,
        max_radius: settings.disocclusion_fix_max_radius,
        normal_power: settings.disocclusion_fix_edge_stopping_normal_power,
        denoising_range: settings.scaled_denoising_range(),
        disocclusion_threshold: settings.disocclusion_threshold,
        _pad0: 0.0,
    };

    graph.dispatch(
        ComputePass::builder(Kernel::DisocclusionFix, "disocclusion_fix")
            .read(&reprojection.specular)
            .read(&reprojection.diffuse)
            .read(&reprojection.specular_responsive)
            .read(&reprojection.diffuse_responsive)
            .read(&reprojection.history_length)
            .read(&inputs.normal_roughness)
            .read(&prepass.scaled_view_z)
            .write(&out.specular)
            .write(&out.diffuse)
            .write(&out.specular_responsive)
            .write(&out.diffuse_responsive)
            .params(&params)
            .build(inputs.viewport),
    );

    out
}
