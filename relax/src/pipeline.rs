mod atrous;
mod disocclusion_fix;
mod firefly;
mod history_clamping;
mod prepass;
mod reprojection;
mod spatial_variance_estimation;
mod split_screen;

use std::time::Instant;

use glam::UVec2;
use log::{debug, info, warn};

use crate::{
    Camera, FrameGraph, FramePool, History, HistoryBuffers, Settings,
};

/// Per-frame inputs of the denoiser.
///
/// All textures must be of the viewport's size. Illumination is linear
/// radiance, with the specular's alpha holding the reflection's hit
/// distance.
#[derive(Clone, Debug)]
pub struct FrameInputs<T> {
    pub diffuse: T,
    pub specular: T,

    /// Packed normal and roughness, see: [`relax_gpu::NormalRoughness`]
    pub normal_roughness: T,

    /// Linear view depth (in world units) in `.x`; zero for the sky
    pub view_z: T,

    /// Per-pixel offset to the previous frame: `.xy` in pixels, `.z` as the
    /// view depth delta and `.w` as validity; pixels with `.w == 0.0` get
    /// reprojected using camera motion alone
    pub motion: T,

    /// Optional `0.0..=1.0` confidence of the inputs in `.x`; used only if
    /// both are provided
    pub specular_confidence: Option<T>,
    pub diffuse_confidence: Option<T>,

    pub camera: Camera,
    pub prev_camera: Camera,

    /// Size of the viewport, in pixels
    pub viewport: UVec2,

    /// When the frame got rendered; the delta to the previous frame scales
    /// how fast the responsive history follows the inputs
    pub timestamp: Instant,
}

impl<T> FrameInputs<T>
where
    T: Clone,
{
    fn validate<G>(&self, graph: &G)
    where
        G: FrameGraph<Texture = T>,
    {
        assert!(
            self.viewport.x > 0 && self.viewport.y > 0,
            "viewport must not be empty"
        );

        let textures = [
            ("diffuse", Some(&self.diffuse)),
            ("specular", Some(&self.specular)),
            ("normal_roughness", Some(&self.normal_roughness)),
            ("view_z", Some(&self.view_z)),
            ("motion", Some(&self.motion)),
            ("specular_confidence", self.specular_confidence.as_ref()),
            ("diffuse_confidence", self.diffuse_confidence.as_ref()),
        ];

        for (name, tex) in textures {
            let Some(tex) = tex else {
                continue;
            };

            assert_eq!(
                self.viewport,
                graph.texture_desc(tex).size,
                "`{name}` doesn't match the viewport's size"
            );
        }
    }

    /// Returns confidence inputs, if both are present.
    fn confidence(&self) -> Option<(&T, &T)> {
        match (&self.specular_confidence, &self.diffuse_confidence) {
            (Some(specular), Some(diffuse)) => Some((specular, diffuse)),
            (None, None) => None,

            _ => {
                warn!(
                    "Only one of the confidence inputs has been provided; \
                     ignoring it"
                );

                None
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DenoiseFlags {
    /// Marks a hard discontinuity (e.g. a cut to a different camera); the
    /// frame ignores its history
    pub camera_cut: bool,

    /// When set, the frame gets denoised but not committed into history
    pub history_read_only: bool,
}

#[derive(Clone, Debug)]
pub struct DenoisedOutputs<T> {
    /// Denoised diffuse radiance in `.rgb`, variance in `.a`
    pub diffuse: T,

    /// Denoised specular radiance in `.rgb`, variance in `.a`
    pub specular: T,
}

/// Runs the whole pipeline for a single frame.
///
/// Settings are clamped into their ranges first, so any snapshot is safe to
/// pass here.
///
/// Panics if inputs don't match the viewport's size.
pub fn run<G>(
    graph: &mut G,
    settings: &Settings,
    inputs: &FrameInputs<G::Texture>,
    history: &mut History<G::Texture>,
    flags: DenoiseFlags,
) -> DenoisedOutputs<G::Texture>
where
    G: FrameGraph,
{
    inputs.validate(graph);

    let settings = &settings.clone().clamped();
    let mut pool = FramePool::new(graph, inputs.viewport);

    // History of a different size (e.g. from before the viewport got
    // resized) can't be reprojected, so it's treated as missing
    let prev = history.buffers().filter(|buffers| {
        graph.texture_desc(&buffers.specular).size == inputs.viewport
    });

    let reset = history.should_reset(flags.camera_cut) || prev.is_none();

    if reset && history.is_valid() {
        info!(
            "Resetting history; frame-index = {}, camera-cut = {}",
            history.frame_index(),
            flags.camera_cut
        );
    } else if reset {
        debug!("Starting without history");
    }

    let prepass =
        prepass::run(graph, &mut pool, settings, inputs, history.frame_index());

    let reprojection = reprojection::run(
        graph,
        &mut pool,
        settings,
        inputs,
        &prepass,
        prev,
        history.timestamp(),
        reset,
    );

    let fixed = disocclusion_fix::run(
        graph,
        &mut pool,
        settings,
        inputs,
        &prepass,
        &reprojection,
    );

    let mut clamped = history_clamping::run(
        graph,
        &mut pool,
        settings,
        &reprojection,
        &fixed,
    );

    if settings.antifirefly {
        let suppressed =
            firefly::run(graph, &mut pool, settings, &prepass, &clamped);

        clamped.specular = suppressed.specular;
        clamped.diffuse = suppressed.diffuse;
    }

    let estimated = spatial_variance_estimation::run(
        graph,
        &mut pool,
        settings,
        inputs,
        &prepass,
        &clamped,
    );

    let filtered = atrous::run(
        graph,
        &mut pool,
        settings,
        inputs,
        &prepass,
        &reprojection,
        &clamped,
        &estimated,
    );

    // Split-screen is just a debug overlay, so it's not supposed to leak
    // into the history
    if !flags.history_read_only {
        history.commit(
            HistoryBuffers {
                specular: clamped.specular,
                diffuse: clamped.diffuse,
                specular_responsive: fixed.specular_responsive,
                diffuse_responsive: fixed.diffuse_responsive,
                normal_roughness: estimated.normal_roughness,
                view_z: prepass.view_z.clone(),
                hit_distance: reprojection.hit_distance,
                history_length: clamped.history_length,
            },
            inputs.timestamp,
        );
    }

    debug!("Frame used {} transient textures", pool.created());

    if settings.split_screen > 0.0 {
        split_screen::run(
            graph, &mut pool, settings, inputs, &prepass, filtered,
        )
    } else {
        filtered
    }
}

