use std::time::Instant;

use glam::{uvec2, vec3, vec4, Mat4, UVec2, Vec3, Vec4, Vec4Swizzles};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relax::gpu::{HistoryLength, NormalRoughness};
use relax::{
    Camera, Config, CpuGraph, CpuTexture, DenoiseFlags, FrameInputs, History,
    Settings, Viewport,
};

const SIZE: UVec2 = UVec2::new(64, 64);
const DIFFUSE: Vec4 = Vec4::new(0.25, 0.5, 0.75, 0.0);
const SPECULAR: Vec4 = Vec4::new(0.5, 0.5, 0.25, 4.0);

fn camera() -> Camera {
    Camera::new(
        Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
        Mat4::perspective_rh(90.0f32.to_radians(), 1.0, 0.1, 1000.0),
    )
}

fn solid(label: &str, size: UVec2, value: Vec4) -> CpuTexture {
    CpuTexture::from_fn(label, size, |_| value)
}

fn noisy(label: &str, seed: u64, mean: Vec4, amplitude: f32) -> CpuTexture {
    let mut rng = StdRng::seed_from_u64(seed);

    let pixels = (0..SIZE.x * SIZE.y)
        .map(|_| {
            let noise = rng.gen_range(-amplitude..=amplitude);

            (mean.xyz() + Vec3::splat(noise)).extend(mean.w)
        })
        .collect();

    CpuTexture::from_pixels(label, SIZE, pixels)
}

/// A wall facing the camera, ten units away.
fn scene(diffuse: CpuTexture, specular: CpuTexture) -> FrameInputs<CpuTexture> {
    let size = diffuse.size();

    FrameInputs {
        diffuse,
        specular,
        normal_roughness: solid(
            "normal_roughness",
            size,
            NormalRoughness::new(vec3(0.0, 0.0, 1.0), 0.5).pack(),
        ),
        view_z: solid("view_z", size, vec4(10.0, 0.0, 0.0, 0.0)),
        motion: solid("motion", size, Vec4::ZERO),
        specular_confidence: None,
        diffuse_confidence: None,
        camera: camera(),
        prev_camera: camera(),
        viewport: size,
        timestamp: Instant::now(),
    }
}

fn static_scene() -> FrameInputs<CpuTexture> {
    scene(
        solid("diffuse", SIZE, DIFFUSE),
        solid("specular", SIZE, SPECULAR),
    )
}

fn with_random_motion(
    mut inputs: FrameInputs<CpuTexture>,
    seed: u64,
) -> FrameInputs<CpuTexture> {
    let mut rng = StdRng::seed_from_u64(seed);

    let pixels = (0..SIZE.x * SIZE.y)
        .map(|_| {
            vec4(
                rng.gen_range(-4.0..=4.0),
                rng.gen_range(-4.0..=4.0),
                0.0,
                1.0,
            )
        })
        .collect();

    inputs.motion = CpuTexture::from_pixels("motion", SIZE, pixels);
    inputs
}

fn history_lengths(history: &History<CpuTexture>) -> Vec<HistoryLength> {
    history
        .buffers()
        .expect("history should be valid")
        .history_length
        .pixels()
        .into_iter()
        .map(HistoryLength::unpack)
        .collect()
}

fn luma_variance(tex: &CpuTexture) -> f32 {
    let lumas: Vec<_> = tex
        .pixels()
        .iter()
        .map(|px| 0.2126 * px.x + 0.7152 * px.y + 0.0722 * px.z)
        .collect();

    let mean = lumas.iter().sum::<f32>() / lumas.len() as f32;

    lumas.iter().map(|l| (l - mean) * (l - mean)).sum::<f32>()
        / lumas.len() as f32
}

fn atrous_passes(graph: &CpuGraph) -> usize {
    graph
        .passes()
        .iter()
        .filter(|pass| pass.starts_with("atrous_"))
        .count()
}

// -----------------------------------------------------------------------------

#[test]
fn first_frame_is_fresh() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();

    relax::pipeline::run(
        &mut graph,
        &Settings::default(),
        &with_random_motion(static_scene(), 1),
        &mut history,
        DenoiseFlags::default(),
    );

    assert_eq!(1, history.frame_index());

    assert!(history_lengths(&history)
        .iter()
        .all(|len| *len == HistoryLength::FRESH));
}

#[test]
fn camera_cut_resets_history() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();
    let settings = Settings::default();
    let inputs = static_scene();

    for _ in 0..5 {
        relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );
    }

    assert!(history_lengths(&history)
        .iter()
        .all(|len| len.diffuse == 5.0));

    relax::pipeline::run(
        &mut graph,
        &settings,
        &with_random_motion(static_scene(), 2),
        &mut history,
        DenoiseFlags {
            camera_cut: true,
            ..Default::default()
        },
    );

    assert!(history_lengths(&history)
        .iter()
        .all(|len| *len == HistoryLength::FRESH));
}

#[test]
fn resized_viewport_resets_history() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();
    let settings = Settings::default();
    let small = uvec2(32, 16);

    for _ in 0..3 {
        relax::pipeline::run(
            &mut graph,
            &settings,
            &scene(
                solid("diffuse", small, DIFFUSE),
                solid("specular", small, SPECULAR),
            ),
            &mut history,
            DenoiseFlags::default(),
        );
    }

    relax::pipeline::run(
        &mut graph,
        &settings,
        &static_scene(),
        &mut history,
        DenoiseFlags::default(),
    );

    let lengths = history_lengths(&history);

    assert_eq!((SIZE.x * SIZE.y) as usize, lengths.len());
    assert!(lengths.iter().all(|len| *len == HistoryLength::FRESH));
}

#[test]
fn accumulation_saturates_at_caps() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();
    let inputs = static_scene();

    let settings = Settings {
        specular_max_accumulated_frame_num: 5,
        specular_max_fast_accumulated_frame_num: 2,
        diffuse_max_accumulated_frame_num: 10,
        diffuse_max_fast_accumulated_frame_num: 3,
        roughness_based_specular_accumulation: false,
        ..Default::default()
    };

    for frame in 1..=20 {
        relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );

        for len in history_lengths(&history) {
            assert_eq!(len.specular, (frame as f32).min(5.0));
            assert_eq!(len.diffuse, (frame as f32).min(10.0));
        }
    }
}

#[test]
fn disabled_optional_stages_are_not_dispatched() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();

    let out = relax::pipeline::run(
        &mut graph,
        &Settings::default(),
        &static_scene(),
        &mut history,
        DenoiseFlags::default(),
    );

    assert_eq!(
        [
            "prepass",
            "reprojection",
            "disocclusion_fix",
            "history_clamping",
            "spatial_variance_estimation",
            "atrous_0",
            "atrous_1",
            "atrous_2",
            "atrous_3",
            "atrous_4",
        ]
        .map(String::from)
        .to_vec(),
        graph.passes(),
    );

    // Nothing runs after the filter, so its buffers are handed out directly
    assert_eq!("relax_atrous_diffuse_ping", out.diffuse.label());
    assert_eq!("relax_atrous_specular_ping", out.specular.label());
}

#[test]
fn optional_stages_run_when_enabled() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();

    let settings = Settings {
        antifirefly: true,
        split_screen: 50.0,
        ..Default::default()
    };

    let out = relax::pipeline::run(
        &mut graph,
        &settings,
        &static_scene(),
        &mut history,
        DenoiseFlags::default(),
    );

    assert!(graph.passes().iter().any(|pass| pass == "firefly"));
    assert_eq!(Some("split_screen"), graph.passes().last().map(|s| s.as_str()));
    assert_eq!("relax_split_screen_diffuse", out.diffuse.label());
}

#[test]
fn split_screen_does_not_leak_into_history() {
    let inputs = scene(
        noisy("diffuse", 3, vec4(0.5, 0.5, 0.5, 0.0), 0.25),
        noisy("specular", 4, vec4(0.5, 0.5, 0.5, 1.0), 0.25),
    );

    let mut graph = CpuGraph::new();
    let mut history_a = History::new();
    let mut history_b = History::new();

    let out_a = relax::pipeline::run(
        &mut graph,
        &Settings::default(),
        &inputs,
        &mut history_a,
        DenoiseFlags::default(),
    );

    let out_b = relax::pipeline::run(
        &mut graph,
        &Settings {
            split_screen: 50.0,
            ..Default::default()
        },
        &inputs,
        &mut history_b,
        DenoiseFlags::default(),
    );

    let a = history_a.buffers().unwrap();
    let b = history_b.buffers().unwrap();

    assert_eq!(a.diffuse.pixels(), b.diffuse.pixels());
    assert_eq!(a.specular.pixels(), b.specular.pixels());

    // ... while the outputs differ on the left side
    let left = uvec2(3, 10);
    let right = uvec2(60, 10);

    assert_eq!(inputs.diffuse.get(left).xyz(), out_b.diffuse.get(left).xyz());
    assert_eq!(out_a.diffuse.get(right), out_b.diffuse.get(right));
}

#[test]
fn more_iterations_smooth_more() {
    let inputs = scene(
        noisy("diffuse", 5, vec4(0.5, 0.5, 0.5, 0.0), 0.25),
        solid("specular", SIZE, SPECULAR),
    );

    let input_variance = luma_variance(&inputs.diffuse);

    let variance = |iterations| {
        let mut graph = CpuGraph::new();
        let mut history = History::new();

        let settings = Settings {
            atrous_iterations: iterations,
            ..Default::default()
        };

        let out = relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );

        luma_variance(&out.diffuse)
    };

    let variance_2 = variance(2);
    let variance_8 = variance(8);

    assert!(variance_2 <= input_variance);
    assert!(variance_8 <= input_variance);
    assert!(variance_8 <= variance_2);
}

#[test]
fn output_follows_iteration_parity() {
    for iterations in 2..=5 {
        let mut graph = CpuGraph::new();
        let mut history = History::new();

        let settings = Settings {
            atrous_iterations: iterations,
            ..Default::default()
        };

        let out = relax::pipeline::run(
            &mut graph,
            &settings,
            &static_scene(),
            &mut history,
            DenoiseFlags::default(),
        );

        let expected = if iterations % 2 == 1 { "ping" } else { "pong" };

        assert_eq!(iterations as usize, atrous_passes(&graph));

        assert_eq!(
            format!("relax_atrous_diffuse_{expected}"),
            out.diffuse.label(),
            "iterations = {iterations}"
        );

        assert_eq!(
            format!("relax_atrous_specular_{expected}"),
            out.specular.label(),
            "iterations = {iterations}"
        );
    }
}

#[test]
fn read_only_history_is_not_advanced() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();
    let settings = Settings::default();

    let inputs = scene(
        noisy("diffuse", 6, vec4(0.5, 0.5, 0.5, 0.0), 0.25),
        noisy("specular", 7, vec4(0.5, 0.5, 0.5, 1.0), 0.25),
    );

    for _ in 0..3 {
        relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );
    }

    let committed = history.buffers().unwrap().clone();

    let flags = DenoiseFlags {
        history_read_only: true,
        ..Default::default()
    };

    let mut run = || {
        relax::pipeline::run(&mut graph, &settings, &inputs, &mut history, flags)
    };

    let out_a = run();
    let out_b = run();

    assert_eq!(3, history.frame_index());
    assert!(history.buffers().unwrap().specular.ptr_eq(&committed.specular));
    assert_eq!(out_a.diffuse.pixels(), out_b.diffuse.pixels());
    assert_eq!(out_a.specular.pixels(), out_b.specular.pixels());
}

#[test]
fn static_scene_converges() {
    let mut graph = CpuGraph::new();
    let mut viewport = Viewport::new("main");
    let config = Config::default();
    let inputs = static_scene();

    for frame in 1..=63 {
        let out = viewport.denoise(
            &mut graph,
            &config,
            &inputs,
            DenoiseFlags::default(),
        );

        let lengths = history_lengths(viewport.history());

        assert!(lengths.iter().all(|len| len.diffuse == frame as f32));

        if frame < 63 {
            assert!(lengths.iter().all(|len| len.diffuse < 63.0));
        } else {
            for px in out.diffuse.pixels() {
                approx::assert_relative_eq!(DIFFUSE.x, px.x, epsilon = 1e-4);
                approx::assert_relative_eq!(DIFFUSE.y, px.y, epsilon = 1e-4);
                approx::assert_relative_eq!(DIFFUSE.z, px.z, epsilon = 1e-4);
            }
        }
    }

    assert_eq!(63, viewport.history().frame_index());
}

#[test]
fn iterations_are_clamped_before_running() {
    for (requested, expected) in [(1, 2), (10, 8)] {
        let mut graph = CpuGraph::new();
        let mut viewport = Viewport::new("main");
        let mut config = Config::default();

        config.set("relax.atrous.iterations", requested).unwrap();

        viewport.denoise(
            &mut graph,
            &config,
            &static_scene(),
            DenoiseFlags::default(),
        );

        assert_eq!(expected, atrous_passes(&graph));
    }
}

#[test]
fn explicit_settings_are_clamped_before_running() {
    for (requested, expected) in [(0, 2), (1, 2), (5, 5), (40, 8)] {
        let mut graph = CpuGraph::new();
        let mut viewport = Viewport::new("main");

        let settings = Settings {
            atrous_iterations: requested,
            ..Default::default()
        };

        let out = viewport.denoise_with(
            &mut graph,
            &settings,
            &static_scene(),
            DenoiseFlags::default(),
        );

        assert_eq!(expected, atrous_passes(&graph), "requested = {requested}");

        // Whatever got dispatched last is what's handed out
        let expected = if expected % 2 == 1 { "ping" } else { "pong" };

        assert_eq!(
            format!("relax_atrous_diffuse_{expected}"),
            out.diffuse.label(),
            "requested = {requested}"
        );

        assert!(out.diffuse.pixels().iter().all(|px| *px != Vec4::ZERO));
    }
}

#[test]
fn explicit_caps_are_clamped_before_running() {
    let mut graph = CpuGraph::new();
    let mut history = History::new();
    let inputs = static_scene();

    let settings = Settings {
        specular_max_accumulated_frame_num: 100,
        specular_max_fast_accumulated_frame_num: 100,
        diffuse_max_accumulated_frame_num: 100,
        diffuse_max_fast_accumulated_frame_num: 100,
        roughness_based_specular_accumulation: false,
        ..Default::default()
    };

    for _ in 0..70 {
        relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );
    }

    for len in history_lengths(&history) {
        assert_eq!(63.0, len.specular);
        assert_eq!(63.0, len.diffuse);
    }
}

#[test]
fn firefly_touches_only_outliers() {
    let spike = uvec2(20, 20);
    let calm = uvec2(40, 40);

    let diffuse = CpuTexture::from_fn("diffuse", SIZE, |pos| {
        if pos == spike {
            vec4(50.0, 50.0, 50.0, 0.0)
        } else {
            DIFFUSE
        }
    });

    let inputs = scene(diffuse, solid("specular", SIZE, SPECULAR));

    let run = |antifirefly| {
        let mut graph = CpuGraph::new();
        let mut history = History::new();

        // No blurs before the clamping, so that the spike stays isolated
        let settings = Settings {
            antifirefly,
            diffuse_blur_radius: 0.0,
            disocclusion_fix_max_radius: 0.0,
            ..Default::default()
        };

        relax::pipeline::run(
            &mut graph,
            &settings,
            &inputs,
            &mut history,
            DenoiseFlags::default(),
        );

        let committed = history.buffers().unwrap().diffuse.clone();

        (graph, committed)
    };

    let (graph_off, diffuse_off) = run(false);
    let (graph_on, diffuse_on) = run(true);

    assert!(!graph_off.passes().iter().any(|pass| pass == "firefly"));
    assert!(graph_on.passes().iter().any(|pass| pass == "firefly"));

    // Switched off, the history gets exactly what history clamping wrote
    assert_eq!("relax_history_clamping_diffuse", diffuse_off.label());
    assert_eq!("relax_firefly_diffuse", diffuse_on.label());

    assert!(diffuse_off.get(spike).x > DIFFUSE.x);
    assert!(diffuse_on.get(spike).x < diffuse_off.get(spike).x);
    assert_eq!(diffuse_off.get(calm), diffuse_on.get(calm));
}

#[test]
#[should_panic(expected = "doesn't match the viewport's size")]
fn mismatched_inputs_are_rejected() {
    let mut inputs = static_scene();

    inputs.specular = solid("specular", uvec2(32, 32), SPECULAR);

    relax::pipeline::run(
        &mut CpuGraph::new(),
        &Settings::default(),
        &inputs,
        &mut History::new(),
        DenoiseFlags::default(),
    );
}
