use std::time::Instant;

use relax_gpu::ReprojectionPassParams;

use super::prepass::PrepassOutputs;
use crate::{
    import_or_fallback, ComputePass, FrameGraph, FrameInputs, FramePool,
    HistoryBuffers, Kernel, Settings,
};

pub struct ReprojectionOutputs<T> {
    pub specular: T,
    pub diffuse: T,
    pub specular_responsive: T,
    pub diffuse_responsive: T,
    pub hit_distance: T,
    pub history_length: T,
    pub specular_confidence: T,
}

#[allow(clippy::too_many_arguments)]
pub fn run<G>(
    graph: &mut G,
    pool: &mut FramePool<G::Texture>,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    prepass: &PrepassOutputs<G::Texture>,
    prev: Option<&HistoryBuffers<G::Texture>>,
    prev_timestamp: Option<Instant>,
    reset: bool,
) -> ReprojectionOutputs<G::Texture>
where
    G: FrameGraph,
{
    let out = ReprojectionOutputs {
        specular: pool.create(graph, "reprojection_specular"),
        diffuse: pool.create(graph, "reprojection_diffuse"),
        specular_responsive: pool
            .create(graph, "reprojection_specular_responsive"),
        diffuse_responsive: pool
            .create(graph, "reprojection_diffuse_responsive"),
        hit_distance: pool.create(graph, "reprojection_hit_distance"),
        history_length: pool.create(graph, "reprojection_history_length"),
        specular_confidence: pool
            .create(graph, "reprojection_specular_confidence"),
    };

    let zero = pool.zero();
    let import = |f: fn(&HistoryBuffers<G::Texture>) -> &G::Texture| {
        import_or_fallback(prev.map(f), zero)
    };

    let prev_specular = import(|b| &b.specular);
    let prev_diffuse = import(|b| &b.diffuse);
    let prev_specular_responsive = import(|b| &b.specular_responsive);
    let prev_diffuse_responsive = import(|b| &b.diffuse_responsive);
    let prev_normal_roughness = import(|b| &b.normal_roughness);
    let prev_view_z = import(|b| &b.view_z);
    let prev_hit_distance = import(|b| &b.hit_distance);
    let prev_history_length = import(|b| &b.history_length);

    let confidence = inputs.confidence();

    let (specular_confidence, diffuse_confidence) = confidence
        .map(|(specular, diffuse)| (specular.clone(), diffuse.clone()))
        .unwrap_or_else(|| (zero.clone(), zero.clone()));

    let [frustum_right, frustum_up, frustum_forward] = inputs.camera.frustum();

    let params = ReprojectionPassParams {
        prev_world_to_clip: inputs.prev_camera.world_to_clip(),
        camera_position: inputs.camera.position().extend(1.0),
        frustum_right,
        frustum_up,
        frustum_forward,
        resolution: inputs.viewport,
        reset_history: reset as u32,
        use_bicubic: settings.bicubic as u32,
        use_confidence_inputs: confidence.is_some() as u32,
        roughness_based_specular_accumulation: settings
            .roughness_based_specular_accumulation
            as u32,
        framerate_scale: framerate_scale(prev_timestamp, inputs.timestamp),
        denoising_range: settings.denoising_range,
        disocclusion_threshold: settings.disocclusion_threshold,
        jitter_delta: inputs.camera.jitter_delta(&inputs.prev_camera),
        specular_variance_boost: settings.specular_variance_boost,
        specular_max_accumulated_frame_num: settings
            .specular_max_accumulated_frame_num
            as f32,
        specular_max_fast_accumulated_frame_num: settings
            .specular_max_fast_accumulated_frame_num
            as f32,
        diffuse_max_accumulated_frame_num: settings
            .diffuse_max_accumulated_frame_num
            as f32,
        diffuse_max_fast_accumulated_frame_num: settings
            .diffuse_max_fast_accumulated_frame_num
            as f32,
        reject_diffuse_history_normal_threshold: settings
            .reject_diffuse_history_normal_threshold,
    };

    graph.dispatch(
        ComputePass::builder(Kernel::Reprojection, "reprojection")
            .read(&prepass.specular)
            .read(&prepass.diffuse)
            .read(&inputs.motion)
            .read(&inputs.normal_roughness)
            .read(&prepass.view_z)
            .read(&prev_specular)
            .read(&prev_diffuse)
            .read(&prev_specular_responsive)
            .read(&prev_diffuse_responsive)
            .read(&prev_normal_roughness)
            .read(&prev_view_z)
            .read(&prev_hit_distance)
            .read(&prev_history_length)
            .read(&specular_confidence)
            .read(&diffuse_confidence)
            .write(&out.specular)
            .write(&out.diffuse)
            .write(&out.specular_responsive)
            .write(&out.diffuse_responsive)
            .write(&out.hit_distance)
            .write(&out.history_length)
            .write(&out.specular_confidence)
            .params(&params)
            .build(inputs.viewport),
    );

    out
}

/// Returns how many 60 Hz frames fit into the time between two frames,
/// inverted and clamped into `0.25..=4.0` (e.g. `2.0` at 120 Hz).
fn framerate_scale(prev: Option<Instant>, curr: Instant) -> f32 {
    const REFERENCE_FRAME_TIME: f32 = 1.0 / 60.0;

    let Some(prev) = prev else {
        return 1.0;
    };

    let dt = curr.saturating_duration_since(prev).as_secs_f32();

    if dt <= 0.0 {
        return 4.0;
    }

    (REFERENCE_FRAME_TIME / dt).clamp(0.25, 4.0)
}
