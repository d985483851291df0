use relax_gpu::AtrousPassParams;

use super::history_clamping::HistoryClampingOutputs;
use super::prepass::PrepassOutputs;
use super::reprojection::ReprojectionOutputs;
use super::spatial_variance_estimation::SpatialVarianceEstimationOutputs;
use crate::{
    ComputePass, DenoisedOutputs, FrameGraph, FrameInputs, FramePool, Kernel,
    Settings,
};

#[allow(clippy::too_many_arguments)]
pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    prepass: &PrepassOutputs<G::Texture>,
    reprojection: &ReprojectionOutputs<G::Texture>,
    clamped: &HistoryClampingOutputs<G::Texture>,
    estimated: &SpatialVarianceEstimationOutputs<G::Texture>,
) -> DenoisedOutputs<G::Texture>
where
    G: FrameGraph,
{
    let ping = DenoisedOutputs {
        specular: pool.create(graph, "atrous_specular_ping"),
        diffuse: pool.create(graph, "atrous_diffuse_ping"),
    };

    let pong = DenoisedOutputs {
        specular: pool.create(graph, "atrous_specular_pong"),
        diffuse: pool.create(graph, "atrous_diffuse_pong"),
    };

    let [frustum_right, frustum_up, frustum_forward] = inputs.camera.frustum();

    let mut params = AtrousPassParams {
        frustum_right,
        frustum_up,
        frustum_forward,
        resolution: inputs.viewport,
        step_size: 1,
        roughness_edge_stopping: settings.roughness_edge_stopping as u32,
        specular_phi_luminance: settings.specular_phi_luminance,
        diffuse_phi_luminance: settings.diffuse_phi_luminance,
        max_luminance_relative_difference: settings
            .max_luminance_relative_difference(),
        phi_normal: settings.phi_normal,
        phi_depth: settings.phi_depth,
        specular_lobe_angle_fraction: settings.specular_lobe_angle_fraction,
        specular_lobe_angle_slack: settings
            .specular_lobe_angle_slack_radians(),
        roughness_edge_stopping_relaxation: settings
            .roughness_edge_stopping_relaxation,
        normal_edge_stopping_relaxation: settings
            .normal_edge_stopping_relaxation,
        luminance_edge_stopping_relaxation: settings
            .luminance_edge_stopping_relaxation,
        denoising_range: settings.scaled_denoising_range(),
        _pad0: 0.0,
    };

    for iteration in 0..settings.atrous_iterations {
        // Iteration `n` reads what iteration `n - 1` wrote
        let (kernel, src_specular, src_diffuse, dst) = if iteration == 0 {
            (
                Kernel::AtrousSmem,
                &estimated.specular,
                &estimated.diffuse,
                &ping,
            )
        } else if iteration % 2 == 1 {
            (Kernel::Atrous, &ping.specular, &ping.diffuse, &pong)
        } else {
            (Kernel::Atrous, &pong.specular, &pong.diffuse, &ping)
        };

        params.step_size = 1 << iteration;

        graph.dispatch(
            ComputePass::builder(kernel, format!("atrous_{iteration}"))
                .read(src_specular)
                .read(src_diffuse)
                .read(&reprojection.specular_confidence)
                .read(&clamped.history_length)
                .read(&estimated.normal_roughness)
                .read(&prepass.scaled_view_z)
                .write(&dst.specular)
                .write(&dst.diffuse)
                .params(&params)
                .build(inputs.viewport),
        );
    }

    last_written(settings.atrous_iterations, ping, pong)
}

/// Returns the buffers written by the last of `iterations` passes; the
/// first pass writes into `ping`.
fn last_written<T>(iterations: u32, ping: T, pong: T) -> T {
    if iterations % 2 == 1 {
        ping
    } else {
        pong
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_written_follows_parity() {
        assert_eq!("pong", last_written(2, "ping", "pong"));
        assert_eq!("ping", last_written(3, "ping", "pong"));
        assert_eq!("pong", last_written(4, "ping", "pong"));
        assert_eq!("ping", last_written(5, "ping", "pong"));
    }
}
