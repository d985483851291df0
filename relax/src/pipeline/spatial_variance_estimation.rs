use relax_gpu::SpatialVarianceEstimationPassParams;

use super::history_clamping::HistoryClampingOutputs;
use super::prepass::PrepassOutputs;
use crate::{ComputePass, FrameGraph, FrameInputs, FramePool, Kernel, Settings};

pub struct SpatialVarianceEstimationOutputs<T> {
    /// Specular radiance in `.rgb`, variance in `.a`
    pub specular: T,

    /// Diffuse radiance in `.rgb`, variance in `.a`
    pub diffuse: T,

    pub normal_roughness: T,
}

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    prepass: &PrepassOutputs<G::Texture>,
    clamped: &HistoryClampingOutputs<G::Texture>,
) -> SpatialVarianceEstimationOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = SpatialVarianceEstimationOutputs {
        specular: pool.create(graph, "spatial_variance_estimation_specular"),
        diffuse: pool.create(graph, "spatial_variance_estimation_diffuse"),
        normal_roughness: pool
            .create(graph, "spatial_variance_estimation_normal_roughness"),
    };

    let [frustum_right, frustum_up, frustum_forward] = inputs.camera.frustum();

    let params = SpatialVarianceEstimationPassParams {
        frustum_right,
        frustum_up,
        frustum_forward,
        resolution: inputs.viewport,
        history_threshold: settings
            .spatial_variance_estimation_history_threshold
            as f32,
        phi_normal: settings.phi_normal,
        denoising_range: settings.scaled_denoising_range(),
        ..Default::default()
    };

    graph.dispatch(
        ComputePass::builder(
            Kernel::SpatialVarianceEstimation,
            "spatial_variance_estimation",
        )
        .read(&clamped.specular)
        .read(&clamped.diffuse)
        .read(&clamped.history_length)
        .read(&inputs.normal_roughness)
        .read(&prepass.scaled_view_z)
        .write(&out.specular)
        .write(&out.diffuse)
        .write(&out.normal_roughness)
        .params(&params)
        .build(inputs.viewport),
    );

    out
}
