use std::sync::{Arc, RwLock};

use derivative::Derivative;
use glam::{UVec2, Vec4};
use log::debug;
use relax_gpu::{
    Atrous, DisocclusionFix, Firefly, HistoryClamping, Prepass, Reprojection,
    SpatialVarianceEstimation, SplitScreen, TexRead,
};

use crate::{ComputePass, FrameGraph, Kernel, TextureDesc};

/// Frame graph that executes passes immediately, on the CPU, by running the
/// very same kernels the shaders are built from.
///
/// It's slow, but deterministic and doesn't require a GPU, which makes it
/// the reference implementation the pipeline is tested against.
#[derive(Debug, Default)]
pub struct CpuGraph {
    passes: Vec<String>,
}

impl CpuGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns labels of the passes dispatched so far, in order.
    pub fn passes(&self) -> &[String] {
        &self.passes
    }

    pub fn clear_passes(&mut self) {
        self.passes.clear();
    }
}

impl FrameGraph for CpuGraph {
    type Texture = CpuTexture;

    fn create_texture(&mut self, desc: &TextureDesc) -> CpuTexture {
        CpuTexture::new(&desc.label, desc.size)
    }

    fn texture_desc(&self, texture: &CpuTexture) -> TextureDesc {
        TextureDesc::new(texture.label(), texture.size())
    }

    fn dispatch(&mut self, pass: ComputePass<CpuTexture>) {
        debug!("Running pass `{}`; size={:?}", pass.label, pass.size);

        // Inputs are snapshotted before anything gets written, so a pass
        // cannot observe its own writes
        let snapshots: Vec<_> =
            pass.reads.iter().map(CpuTexture::pixels).collect();

        let inputs: Vec<_> = pass
            .reads
            .iter()
            .zip(&snapshots)
            .map(|(tex, pixels)| CpuView {
                size: tex.size(),
                pixels,
            })
            .collect();

        let outputs = execute(&pass, &inputs);

        for (tex, pixels) in pass.writes.iter().zip(outputs) {
            tex.write(pass.size, &pixels);
        }

        self.passes.push(pass.label);
    }
}

fn execute(pass: &ComputePass<CpuTexture>, t: &[CpuView]) -> Vec<Vec<Vec4>> {
    let size = pass.size;

    match pass.kernel {
        Kernel::Prepass => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = Prepass {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                normal_roughness: &t[2],
                view_z: &t[3],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.specular, out.diffuse, out.view_z, out.scaled_view_z]
            })
        }

        Kernel::Reprojection => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = Reprojection {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                motion: &t[2],
                normal_roughness: &t[3],
                view_z: &t[4],
                prev_specular: &t[5],
                prev_diffuse: &t[6],
                prev_specular_responsive: &t[7],
                prev_diffuse_responsive: &t[8],
                prev_normal_roughness: &t[9],
                prev_view_z: &t[10],
                prev_hit_distance: &t[11],
                prev_history_length: &t[12],
                specular_confidence: &t[13],
                diffuse_confidence: &t[14],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [
                    out.specular,
                    out.diffuse,
                    out.specular_responsive,
                    out.diffuse_responsive,
                    out.hit_distance,
                    out.history_length,
                    out.specular_confidence,
                ]
            })
        }

        Kernel::DisocclusionFix => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = DisocclusionFix {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                specular_responsive: &t[2],
                diffuse_responsive: &t[3],
                history_length: &t[4],
                normal_roughness: &t[5],
                scaled_view_z: &t[6],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [
                    out.specular,
                    out.diffuse,
                    out.specular_responsive,
                    out.diffuse_responsive,
                ]
            })
        }

        Kernel::HistoryClamping => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = HistoryClamping {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                specular_responsive: &t[2],
                diffuse_responsive: &t[3],
                history_length: &t[4],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.specular, out.diffuse, out.history_length]
            })
        }

        Kernel::Firefly => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = Firefly {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                scaled_view_z: &t[2],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.specular, out.diffuse]
            })
        }

        Kernel::SpatialVarianceEstimation => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = SpatialVarianceEstimation {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                history_length: &t[2],
                normal_roughness: &t[3],
                scaled_view_z: &t[4],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.specular, out.diffuse, out.normal_roughness]
            })
        }

        // On the CPU there's no workgroup memory to speak of, so both
        // variants run the same code
        Kernel::AtrousSmem | Kernel::Atrous => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = Atrous {
                params: &params,
                specular: &t[0],
                diffuse: &t[1],
                specular_reprojection_confidence: &t[2],
                history_length: &t[3],
                normal_roughness: &t[4],
                scaled_view_z: &t[5],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.specular, out.diffuse]
            })
        }

        Kernel::SplitScreen => {
            let params = bytemuck::pod_read_unaligned(&pass.params);

            let kernel = SplitScreen {
                params: &params,
                view_z: &t[0],
                diffuse_input: &t[1],
                specular_input: &t[2],
                diffuse: &t[3],
                specular: &t[4],
            };

            run(size, |pos| {
                let out = kernel.run(pos);

                [out.diffuse, out.specular]
            })
        }
    }
}

fn run<const N: usize>(
    size: UVec2,
    f: impl Fn(UVec2) -> [Vec4; N],
) -> Vec<Vec<Vec4>> {
    let mut outputs: Vec<_> = (0..N)
        .map(|_| Vec::with_capacity((size.x * size.y) as usize))
        .collect();

    for y in 0..size.y {
        for x in 0..size.x {
            for (output, value) in outputs.iter_mut().zip(f(UVec2::new(x, y)))
            {
                output.push(value);
            }
        }
    }

    outputs
}

/// Handle to a texture living in the main memory.
#[derive(Clone, Debug)]
pub struct CpuTexture(Arc<CpuTextureInner>);

#[derive(Derivative)]
#[derivative(Debug)]
struct CpuTextureInner {
    label: String,
    size: UVec2,

    #[derivative(Debug = "ignore")]
    pixels: RwLock<Vec<Vec4>>,
}

impl CpuTexture {
    pub fn new(label: impl ToString, size: UVec2) -> Self {
        Self::from_pixels(
            label,
            size,
            vec![Vec4::ZERO; (size.x * size.y) as usize],
        )
    }

    /// Creates a texture out of row-major pixels.
    pub fn from_pixels(
        label: impl ToString,
        size: UVec2,
        pixels: Vec<Vec4>,
    ) -> Self {
        assert_eq!(
            (size.x * size.y) as usize,
            pixels.len(),
            "texture's size doesn't match its number of pixels"
        );

        Self(Arc::new(CpuTextureInner {
            label: label.to_string(),
            size,
            pixels: RwLock::new(pixels),
        }))
    }

    pub fn from_fn(
        label: impl ToString,
        size: UVec2,
        f: impl Fn(UVec2) -> Vec4,
    ) -> Self {
        let pixels = (0..size.y)
            .flat_map(|y| (0..size.x).map(move |x| UVec2::new(x, y)))
            .map(f)
            .collect();

        Self::from_pixels(label, size, pixels)
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn size(&self) -> UVec2 {
        self.0.size
    }

    /// Returns a copy of this texture's pixels, row-major.
    pub fn pixels(&self) -> Vec<Vec4> {
        match self.0.pixels.read() {
            Ok(pixels) => pixels.clone(),
            Err(err) => err.into_inner().clone(),
        }
    }

    pub fn get(&self, pos: UVec2) -> Vec4 {
        assert!(
            pos.x < self.size().x && pos.y < self.size().y,
            "{pos:?} is out of bounds of `{}`",
            self.label(),
        );

        let idx = (pos.y * self.size().x + pos.x) as usize;

        match self.0.pixels.read() {
            Ok(pixels) => pixels[idx],
            Err(err) => err.into_inner()[idx],
        }
    }

    /// Returns whether both handles point at the same texture.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn write(&self, size: UVec2, values: &[Vec4]) {
        let mut pixels = match self.0.pixels.write() {
            Ok(pixels) => pixels,
            Err(err) => err.into_inner(),
        };

        let width = self.size().x;
        let height = self.size().y;

        for y in 0..size.y.min(height) {
            for x in 0..size.x.min(width) {
                pixels[(y * width + x) as usize] =
                    values[(y * size.x + x) as usize];
            }
        }
    }
}

struct CpuView<'a> {
    size: UVec2,
    pixels: &'a [Vec4],
}

impl TexRead for CpuView<'_> {
    fn load(&self, pos: UVec2) -> Vec4 {
        if pos.x < self.size.x && pos.y < self.size.y {
            self.pixels[(pos.y * self.size.x + pos.x) as usize]
        } else {
            Vec4::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{uvec2, vec4};
    use relax_gpu::FireflyPassParams;

    use super::*;

    #[test]
    fn textures_start_zeroed() {
        let mut graph = CpuGraph::new();
        let tex = graph.create_texture(&TextureDesc::new("tex", uvec2(3, 2)));

        assert!(tex.pixels().iter().all(|px| *px == Vec4::ZERO));
        assert_eq!(uvec2(3, 2), graph.texture_desc(&tex).size);
    }

    #[test]
    fn handles_are_shared() {
        let a = CpuTexture::new("a", uvec2(1, 1));
        let b = a.clone();
        let c = CpuTexture::new("a", uvec2(1, 1));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn dispatch() {
        let mut graph = CpuGraph::new();
        let size = uvec2(4, 4);
        let color = vec4(0.5, 0.25, 0.125, 0.0);

        let specular = CpuTexture::from_fn("specular", size, |_| color);
        let diffuse = CpuTexture::from_fn("diffuse", size, |_| color);
        let view_z = CpuTexture::from_fn("view_z", size, |_| Vec4::ONE);
        let out_specular = CpuTexture::new("out_specular", size);
        let out_diffuse = CpuTexture::new("out_diffuse", size);

        let params = FireflyPassParams {
            resolution: size,
            denoising_range: 1000.0,
            ..Default::default()
        };

        graph.dispatch(
            ComputePass::builder(Kernel::Firefly, "firefly")
                .read(&specular)
                .read(&diffuse)
                .read(&view_z)
                .write(&out_specular)
                .write(&out_diffuse)
                .params(&params)
                .build(size),
        );

        assert_eq!(["firefly".to_string()], graph.passes());
        assert_eq!(color, out_specular.get(uvec2(1, 2)));
        assert_eq!(color, out_diffuse.get(uvec2(3, 3)));
    }
}
