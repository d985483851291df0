use std::sync::Arc;

use derivative::Derivative;
use fxhash::FxHashMap;
use glam::UVec2;
use log::debug;
use wgpu::util::DeviceExt;

use crate::{ComputePass, FrameGraph, Kernel, TextureDesc};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Features a device must be created with to run the denoiser; read-write
/// storage access to `Rgba32Float` is adapter-specific.
pub const REQUIRED_FEATURES: wgpu::Features =
    wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;

/// Returns `base` with the limits the denoiser needs raised.
pub fn required_limits(base: wgpu::Limits) -> wgpu::Limits {
    let max_textures = Kernel::ALL
        .iter()
        .map(|kernel| (kernel.reads() + kernel.writes()) as u32)
        .max()
        .unwrap_or_default();

    wgpu::Limits {
        max_storage_textures_per_shader_stage: base
            .max_storage_textures_per_shader_stage
            .max(max_textures),
        max_bindings_per_bind_group: base
            .max_bindings_per_bind_group
            .max(max_textures),
        ..base
    }
}

/// Compute pipelines of all kernels, built once and shared across frames
/// and viewports.
#[derive(Debug)]
pub struct WgpuPipelines {
    pipelines: FxHashMap<Kernel, WgpuPipeline>,
}

#[derive(Debug)]
struct WgpuPipeline {
    pipeline: wgpu::ComputePipeline,
    params_layout: wgpu::BindGroupLayout,
    textures_layout: wgpu::BindGroupLayout,
}

impl WgpuPipelines {
    /// Builds pipelines out of given module, which must export every entry
    /// point listed by [`Kernel::entry_point()`].
    pub fn new(device: &wgpu::Device, module: &wgpu::ShaderModule) -> Self {
        let pipelines = Kernel::ALL
            .iter()
            .map(|&kernel| (kernel, WgpuPipeline::new(device, module, kernel)))
            .collect();

        Self { pipelines }
    }

    fn get(&self, kernel: Kernel) -> &WgpuPipeline {
        // Every kernel gets a pipeline in `new()`
        &self.pipelines[&kernel]
    }
}

impl WgpuPipeline {
    fn new(
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        kernel: Kernel,
    ) -> Self {
        let entry_point = kernel.entry_point();
        let label = format!("relax_{}", entry_point.replace("::", "_"));

        debug!("Initializing pass: {label}:{entry_point}");

        let params_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label}_params_layout")),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let textures: Vec<_> = (0..kernel.reads() + kernel.writes())
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding: binding as u32,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::StorageTexture {
                    access: wgpu::StorageTextureAccess::ReadWrite,
                    format: FORMAT,
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            })
            .collect();

        let textures_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label}_textures_layout")),
                entries: &textures,
            });

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{label}_pipeline_layout")),
                bind_group_layouts: &[&params_layout, &textures_layout],
                push_constant_ranges: &[],
            });

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&format!("{label}_pipeline")),
                layout: Some(&pipeline_layout),
                module,
                entry_point,
            });

        Self {
            pipeline,
            params_layout,
            textures_layout,
        }
    }
}

/// Frame graph that records passes into a command encoder; submitting the
/// encoder is up to the caller.
pub struct WgpuGraph<'a> {
    device: &'a wgpu::Device,
    pipelines: &'a WgpuPipelines,
    encoder: &'a mut wgpu::CommandEncoder,
}

impl<'a> WgpuGraph<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        pipelines: &'a WgpuPipelines,
        encoder: &'a mut wgpu::CommandEncoder,
    ) -> Self {
        Self {
            device,
            pipelines,
            encoder,
        }
    }
}

impl FrameGraph for WgpuGraph<'_> {
    type Texture = WgpuTexture;

    fn create_texture(&mut self, desc: &TextureDesc) -> WgpuTexture {
        WgpuTexture::new(self.device, &desc.label, desc.size)
    }

    fn texture_desc(&self, texture: &WgpuTexture) -> TextureDesc {
        TextureDesc::new(texture.label(), texture.size())
    }

    fn dispatch(&mut self, pass: ComputePass<WgpuTexture>) {
        let pipeline = self.pipelines.get(pass.kernel);
        let label = format!("relax_{}_pass", pass.label);

        // Uniform buffers must be a multiple of 16 bytes
        let mut params = pass.params;
        params.resize((params.len() + 15) & !15, 0);

        let params =
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label}_params")),
                    contents: &params,
                    usage: wgpu::BufferUsages::UNIFORM,
                });

        let params = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}_params_bg")),
            layout: &pipeline.params_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params.as_entire_binding(),
            }],
        });

        let textures: Vec<_> = pass
            .reads
            .iter()
            .chain(&pass.writes)
            .enumerate()
            .map(|(binding, texture)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            })
            .collect();

        let textures =
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label}_textures_bg")),
                layout: &pipeline.textures_layout,
                entries: &textures,
            });

        let mut cpass =
            self.encoder
                .begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(&label),
                });

        cpass.set_pipeline(&pipeline.pipeline);
        cpass.set_bind_group(0, &params, &[]);
        cpass.set_bind_group(1, &textures, &[]);
        cpass.dispatch_workgroups(
            (pass.size.x + 7) / 8,
            (pass.size.y + 7) / 8,
            1,
        );
    }
}

/// Handle to an `Rgba32Float` storage texture.
///
/// Callers provide the denoiser's inputs as such textures (filled e.g. by
/// copying into [`WgpuTexture::texture()`]) and read its outputs back the
/// same way.
#[derive(Clone, Debug)]
pub struct WgpuTexture(Arc<WgpuTextureInner>);

#[derive(Derivative)]
#[derivative(Debug)]
struct WgpuTextureInner {
    label: String,
    size: UVec2,

    #[derivative(Debug = "ignore")]
    tex: wgpu::Texture,

    #[derivative(Debug = "ignore")]
    tex_view: wgpu::TextureView,
}

impl WgpuTexture {
    pub fn new(
        device: &wgpu::Device,
        label: impl AsRef<str>,
        size: UVec2,
    ) -> Self {
        let label = label.as_ref();

        debug!("Allocating texture `{label}`; size={:?}", size);

        assert!(size.x > 0);
        assert!(size.y > 0);

        let tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label}_tex")),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let tex_view = tex.create_view(&Default::default());

        Self(Arc::new(WgpuTextureInner {
            label: label.to_string(),
            size,
            tex,
            tex_view,
        }))
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    pub fn size(&self) -> UVec2 {
        self.0.size
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.0.tex
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.0.tex_view
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
