use relax_gpu::FireflyPassParams;

use super::history_clamping::HistoryClampingOutputs;
use super::prepass::PrepassOutputs;
use crate::{ComputePass, FrameGraph, FramePool, Kernel, Settings};

pub struct FireflyOutputs<T> {
    pub specular: T,
    pub diffuse: T,
}

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    prepass: &PrepassOutputs<G::Texture>,
    clamped: &HistoryClampingOutputs<G::Texture>,
) -> FireflyOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = FireflyOutputs {
        specular: pool.create(graph, "firefly_specular"),
        diffuse: pool.create(graph, "firefly_diffuse"),
    };

    let params = FireflyPassParams {
        resolution: pool.size(),
        denoising_range: settings.scaled_denoising_range(),
        _pad0: 0.0,
    };

    graph.dispatch(
        ComputePass::builder(Kernel::Firefly, "firefly")
            .read(&clamped.specular)
            .read(&clamped.diffuse)
            .read(&prepass.scaled_view_z)
            .write(&out.specular)
            .write(&out.diffuse)
            .params(&params)
            .build(pool.size()),
    );

    out
}
