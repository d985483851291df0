use relax_gpu::SplitScreenPassParams;

use super::prepass::PrepassOutputs;
use crate::{
    ComputePass, DenoisedOutputs, FrameGraph, FrameInputs, FramePool, Kernel,
    Settings,
};

pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    prepass: &PrepassOutputs<G::Texture>,
    filtered: DenoisedOutputs<G::Texture>,
) -> DenoisedOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = DenoisedOutputs {
        diffuse: pool.create(graph, "split_screen_diffuse"),
        specular: pool.create(graph, "split_screen_specular"),
    };

    let params = SplitScreenPassParams {
        resolution: inputs.viewport,
        split_screen: settings.split_screen_fraction(),
        denoising_range: settings.denoising_range,
    };

    graph.dispatch(
        ComputePass::builder(Kernel::SplitScreen, "split_screen")
            .read(&prepass.view_z)
            .read(&inputs.diffuse)
            .read(&inputs.specular)
            .read(&filtered.diffuse)
            .read(&filtered.specular)
            .write(&out.diffuse)
            .write(&out.specular)
            .params(&params)
            .build(inputs.viewport),
    );

    out
}
