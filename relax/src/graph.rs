mod cpu_graph;
mod wgpu_graph;

use std::mem;

use bytemuck::Pod;
use glam::UVec2;
use relax_gpu::{
    AtrousPassParams, DisocclusionFixPassParams, FireflyPassParams,
    HistoryClampingPassParams, PrepassParams, ReprojectionPassParams,
    SpatialVarianceEstimationPassParams, SplitScreenPassParams,
};

pub use self::cpu_graph::*;
pub use self::wgpu_graph::*;

/// Scheduler the denoiser issues its passes to.
///
/// Graphs own texture creation and pass execution; the denoiser only ever
/// sees opaque, reference-counted texture handles - a texture lives for as
/// long as any of its handles does.
pub trait FrameGraph {
    type Texture: Clone;

    /// Creates a zero-filled texture.
    fn create_texture(&mut self, desc: &TextureDesc) -> Self::Texture;

    fn texture_desc(&self, texture: &Self::Texture) -> TextureDesc;

    /// Schedules given pass; it must observe the writes of every pass
    /// dispatched before it.
    fn dispatch(&mut self, pass: ComputePass<Self::Texture>);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: String,
    pub size: UVec2,
}

impl TextureDesc {
    pub fn new(label: impl ToString, size: UVec2) -> Self {
        Self {
            label: label.to_string(),
            size,
        }
    }
}

/// Compute kernel of the pipeline, as exported by the shaders crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    Prepass,
    Reprojection,
    DisocclusionFix,
    HistoryClamping,
    Firefly,
    SpatialVarianceEstimation,
    AtrousSmem,
    Atrous,
    SplitScreen,
}

impl Kernel {
    pub const ALL: [Self; 9] = [
        Self::Prepass,
        Self::Reprojection,
        Self::DisocclusionFix,
        Self::HistoryClamping,
        Self::Firefly,
        Self::SpatialVarianceEstimation,
        Self::AtrousSmem,
        Self::Atrous,
        Self::SplitScreen,
    ];

    pub fn entry_point(&self) -> &'static str {
        match self {
            Self::Prepass => "prepass::main",
            Self::Reprojection => "reprojection::main",
            Self::DisocclusionFix => "disocclusion_fix::main",
            Self::HistoryClamping => "history_clamping::main",
            Self::Firefly => "firefly::main",
            Self::SpatialVarianceEstimation => {
                "spatial_variance_estimation::main"
            }
            Self::AtrousSmem => "atrous::main_smem",
            Self::Atrous => "atrous::main",
            Self::SplitScreen => "split_screen::main",
        }
    }

    /// Number of textures the kernel reads
    pub fn reads(&self) -> usize {
        match self {
            Self::Prepass => 4,
            Self::Reprojection => 15,
            Self::DisocclusionFix => 7,
            Self::HistoryClamping => 5,
            Self::Firefly => 3,
            Self::SpatialVarianceEstimation => 5,
            Self::AtrousSmem | Self::Atrous => 6,
            Self::SplitScreen => 5,
        }
    }

    /// Number of textures the kernel writes
    pub fn writes(&self) -> usize {
        match self {
            Self::Prepass => 4,
            Self::Reprojection => 7,
            Self::DisocclusionFix => 4,
            Self::HistoryClamping => 3,
            Self::Firefly => 2,
            Self::SpatialVarianceEstimation => 3,
            Self::AtrousSmem | Self::Atrous => 2,
            Self::SplitScreen => 2,
        }
    }

    /// Size of the kernel's parameter block, in bytes
    pub fn params_size(&self) -> usize {
        match self {
            Self::Prepass => mem::size_of::<PrepassParams>(),
            Self::Reprojection => mem::size_of::<ReprojectionPassParams>(),
            Self::DisocclusionFix => {
                mem::size_of::<DisocclusionFixPassParams>()
            }
            Self::HistoryClamping => {
                mem::size_of::<HistoryClampingPassParams>()
            }
            Self::Firefly => mem::size_of::<FireflyPassParams>(),
            Self::SpatialVarianceEstimation => {
                mem::size_of::<SpatialVarianceEstimationPassParams>()
            }
            Self::AtrousSmem | Self::Atrous => {
                mem::size_of::<AtrousPassParams>()
            }
            Self::SplitScreen => mem::size_of::<SplitScreenPassParams>(),
        }
    }
}

/// A single dispatch of a [`Kernel`].
#[derive(Clone, Debug)]
pub struct ComputePass<T> {
    pub kernel: Kernel,
    pub label: String,
    pub reads: Vec<T>,
    pub writes: Vec<T>,
    pub params: Vec<u8>,

    /// Number of pixels to run the kernel for
    pub size: UVec2,
}

impl<T> ComputePass<T>
where
    T: Clone,
{
    pub fn builder(
        kernel: Kernel,
        label: impl ToString,
    ) -> ComputePassBuilder<T> {
        ComputePassBuilder {
            kernel,
            label: label.to_string(),
            reads: Default::default(),
            writes: Default::default(),
            params: Default::default(),
        }
    }
}

pub struct ComputePassBuilder<T> {
    kernel: Kernel,
    label: String,
    reads: Vec<T>,
    writes: Vec<T>,
    params: Vec<u8>,
}

impl<T> ComputePassBuilder<T>
where
    T: Clone,
{
    pub fn read(mut self, texture: &T) -> Self {
        self.reads.push(texture.clone());
        self
    }

    pub fn write(mut self, texture: &T) -> Self {
        self.writes.push(texture.clone());
        self
    }

    pub fn params<P>(mut self, params: &P) -> Self
    where
        P: Pod,
    {
        self.params = bytemuck::bytes_of(params).to_vec();
        self
    }

    pub fn build(self, size: UVec2) -> ComputePass<T> {
        assert_eq!(
            self.kernel.reads(),
            self.reads.len(),
            "pass `{}` has a wrong number of inputs",
            self.label,
        );

        assert_eq!(
            self.kernel.writes(),
            self.writes.len(),
            "pass `{}` has a wrong number of outputs",
            self.label,
        );

        assert_eq!(
            self.kernel.params_size(),
            self.params.len(),
            "pass `{}` has a wrong parameter block",
            self.label,
        );

        ComputePass {
            kernel: self.kernel,
            label: self.label,
            reads: self.reads,
            writes: self.writes,
            params: self.params,
            size,
        }
    }
}
