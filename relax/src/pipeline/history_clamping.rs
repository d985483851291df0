use relax_gpu::HistoryClampingPassParams;

use super::disocclusion_fix::DisocclusionFixOutputs;
use super::reprojection::ReprojectionOutputs;
use crate::{ComputePass, FrameGraph, FramePool, Kernel, Settings};

pub struct HistoryClampingOutputs<T> {
    pub specular: T,
    pub diffuse: T,
    pub history_length: T,
}

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    reprojection: &ReprojectionOutputs<G::Texture>,
    fixed: &DisocclusionFixOutputs<G::Texture>,
) -> HistoryClampingOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = HistoryClampingOutputs {
        specular: pool.create(graph, "history_clamping_specular"),
        diffuse: pool.create(graph, "history_clamping_diffuse"),
        history_length: pool.create(graph, "history_clamping_history_length"),
    };

    let params = HistoryClampingPassParams {
        resolution: pool.size(),
        color_box_sigma_scale: settings.history_clamping_color_box_sigma_scale,
        specular_max_fast_accumulated_frame_num: settings
            .specular_max_fast_accumulated_frame_num
            as f32,
        diffuse_max_fast_accumulated_frame_num: settings
            .diffuse_max_fast_accumulated_frame_num
            as f32,
        ..Default::default()
    };

    graph.dispatch(
        ComputePass::builder(Kernel::HistoryClamping, "history_clamping")
            .read(&fixed.specular)
            .read(&fixed.diffuse)
            .read(&fixed.specular_responsive)
            .read(&fixed.diffuse_responsive)
            .read(&reprojection.history_length)
            .write(&out.specular)
            .write(&out.diffuse)
            .write(&out.history_length)
            .params(&params)
            .build(pool.size()),
    );

    out
}
