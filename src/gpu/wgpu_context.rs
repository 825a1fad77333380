//! [`GpuContext`] over a wgpu device and queue.
//!
//! Commands are recorded into one encoder per frame. Buffer writes go
//! through `Queue::write_buffer`, which wgpu orders before the command
//! buffers of the next `submit`, so a frame's uploads are visible to its
//! dispatch. The compute pass stays open from `bind_compute` until
//! `clear_compute_output` (or `submit`) ends it; ending the pass is what
//! releases the storage binding of the output image before it is sampled.

use crate::error::{Error, Result};

use super::context::{
    BorderMode, BufferDesc, BufferKind, ComputeKernelDesc, GpuContext, QuadKernelDesc, SamplerDesc,
};

/// Format of the compute output image.
pub const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Device features the pipeline uses when the adapter offers them.
pub fn wanted_features() -> wgpu::Features {
    wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES | wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER
}

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
const QUAD_STRIDE: wgpu::BufferAddress = 16;

/// Output image plus the view used for both storage and sampling.
pub struct WgpuImage {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct WgpuComputeKernel {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    storage_inputs: u32,
}

pub struct WgpuQuadKernel {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    encoder: Option<wgpu::CommandEncoder>,
    compute_pass: Option<wgpu::ComputePass<'static>>,
}

impl WgpuContext {
    /// Wrap an existing device. `target_format` is the format of the
    /// textures the compositor will draw into.
    ///
    /// Fails if the device cannot bind an `Rgba32Float` image read-write.
    pub fn new(
        adapter: &wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        if !device.features().contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            return Err(Error::MissingFeature("TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES".into()));
        }
        let format = adapter.get_texture_format_features(OUTPUT_FORMAT);
        if !format.flags.contains(wgpu::TextureFormatFeatureFlags::STORAGE_READ_WRITE)
            || !format.allowed_usages.contains(wgpu::TextureUsages::STORAGE_BINDING)
        {
            return Err(Error::MissingFeature(format!("{OUTPUT_FORMAT:?} read-write storage")));
        }

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, ?target_format, "gpu context ready");
        Ok(Self {
            device,
            queue,
            target_format,
            encoder: None,
            compute_pass: None,
        })
    }

    /// Close the frame's encoder and hand it to the queue.
    pub fn submit(&mut self) -> Option<wgpu::SubmissionIndex> {
        self.compute_pass = None;
        let encoder = self.encoder.take()?;
        Some(self.queue.submit(std::iter::once(encoder.finish())))
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            })
        })
    }

    fn shader(&self, label: &str, code: &str) -> wgpu::ShaderModule {
        self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(code.into()),
        })
    }
}

impl GpuContext for WgpuContext {
    type Buffer = wgpu::Buffer;
    type Image = WgpuImage;
    type ComputeKernel = WgpuComputeKernel;
    type QuadKernel = WgpuQuadKernel;
    type Sampler = wgpu::Sampler;
    type Bindings = wgpu::BindGroup;
    type Target = wgpu::TextureView;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<wgpu::Buffer> {
        use wgpu::util::DeviceExt;

        let limits = self.device.limits();
        match desc.kind {
            BufferKind::Structured { .. } => {
                if desc.size > limits.max_storage_buffer_binding_size as u64 {
                    return Err(Error::creation(
                        desc.label,
                        format!("{} bytes exceeds storage binding limit {}", desc.size, limits.max_storage_buffer_binding_size),
                    ));
                }
                Ok(self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(desc.label),
                    size: desc.size,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }))
            }
            BufferKind::Vertex => {
                let contents = desc
                    .contents
                    .ok_or_else(|| Error::creation(desc.label, "vertex buffer without contents"))?;
                Ok(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(desc.label),
                    contents,
                    usage: wgpu::BufferUsages::VERTEX,
                }))
            }
        }
    }

    fn create_image(&mut self, label: &str, width: u32, height: u32) -> Result<WgpuImage> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(Error::creation(label, format!("image size {width}x{height} outside 1..={max}")));
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(WgpuImage { texture, view })
    }

    fn create_compute_kernel(&mut self, desc: &ComputeKernelDesc<'_>) -> Result<WgpuComputeKernel> {
        let label = desc.source.label.as_str();
        let module = self.shader(label, &desc.source.code);

        // Read-only structured inputs, then the read-write output image
        let mut entries: Vec<_> = (0..desc.storage_inputs)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: desc.storage_inputs,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::ReadWrite,
                format: OUTPUT_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        });

        let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raytracer_bind_group_layout"),
            entries: &entries,
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("raytracer_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some(desc.entry_point),
            compilation_options: Default::default(),
            cache: None,
        });
        tracing::info!(kernel = label, entry = desc.entry_point, "compute kernel created");

        Ok(WgpuComputeKernel {
            pipeline,
            layout,
            storage_inputs: desc.storage_inputs,
        })
    }

    fn create_quad_kernel(&mut self, desc: &QuadKernelDesc<'_>) -> Result<WgpuQuadKernel> {
        let label = desc.source.label.as_str();
        let module = self.shader(label, &desc.source.code);

        let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad_bind_group_layout"),
            entries: &[
                // Rgba32Float is not filterable without FLOAT32_FILTERABLE
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(desc.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: QUAD_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(desc.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.target_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        tracing::info!(kernel = label, "quad kernel created");

        Ok(WgpuQuadKernel { pipeline, layout })
    }

    fn create_sampler(&mut self, desc: &SamplerDesc<'_>) -> Result<wgpu::Sampler> {
        let border_supported = self.device.features().contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let (address_mode, border_color) = match desc.border {
            BorderMode::OpaqueWhite if border_supported => {
                (wgpu::AddressMode::ClampToBorder, Some(wgpu::SamplerBorderColor::OpaqueWhite))
            }
            BorderMode::OpaqueWhite => {
                tracing::warn!(sampler = desc.label, "ADDRESS_MODE_CLAMP_TO_BORDER unavailable, clamping to edge");
                (wgpu::AddressMode::ClampToEdge, None)
            }
            BorderMode::ClampToEdge => (wgpu::AddressMode::ClampToEdge, None),
        };
        Ok(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(desc.label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            border_color,
            ..Default::default()
        }))
    }

    fn create_compute_bindings(
        &mut self,
        kernel: &WgpuComputeKernel,
        inputs: &[&wgpu::Buffer],
        output: &WgpuImage,
    ) -> Result<wgpu::BindGroup> {
        if inputs.len() != kernel.storage_inputs as usize {
            return Err(Error::creation(
                "raytracer_bind_group",
                format!("kernel expects {} inputs, got {}", kernel.storage_inputs, inputs.len()),
            ));
        }
        let mut entries: Vec<_> = inputs
            .iter()
            .zip(0u32..)
            .map(|(buffer, binding)| wgpu::BindGroupEntry {
                binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: kernel.storage_inputs,
            resource: wgpu::BindingResource::TextureView(&output.view),
        });

        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raytracer_bind_group"),
            layout: &kernel.layout,
            entries: &entries,
        }))
    }

    fn create_quad_bindings(
        &mut self,
        kernel: &WgpuQuadKernel,
        image: &WgpuImage,
        sampler: &wgpu::Sampler,
    ) -> Result<wgpu::BindGroup> {
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_bind_group"),
            layout: &kernel.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&image.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }))
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, bytes: &[u8]) {
        // Empty scenes upload nothing
        if bytes.is_empty() {
            return;
        }
        self.queue.write_buffer(buffer, 0, bytes);
    }

    fn bind_compute(&mut self, kernel: &WgpuComputeKernel, bindings: &wgpu::BindGroup) {
        if self.compute_pass.is_none() {
            let pass = self
                .encoder()
                .begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("raytracer_pass"),
                    timestamp_writes: None,
                })
                .forget_lifetime();
            self.compute_pass = Some(pass);
        }
        if let Some(pass) = &mut self.compute_pass {
            pass.set_pipeline(&kernel.pipeline);
            pass.set_bind_group(0, bindings, &[]);
        }
    }

    fn dispatch(&mut self, groups: [u32; 3]) {
        let [x, y, z] = groups;
        match &mut self.compute_pass {
            Some(pass) => pass.dispatch_workgroups(x, y, z),
            None => tracing::warn!("dispatch without bound compute kernel ignored"),
        }
    }

    fn clear_compute_output(&mut self) {
        self.compute_pass = None;
    }

    fn draw(
        &mut self,
        kernel: &WgpuQuadKernel,
        bindings: &wgpu::BindGroup,
        vertices: &wgpu::Buffer,
        target: &wgpu::TextureView,
        vertex_count: u32,
    ) {
        self.compute_pass = None;
        let mut pass = self.encoder().begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quad_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&kernel.pipeline);
        pass.set_bind_group(0, bindings, &[]);
        pass.set_vertex_buffer(0, vertices.slice(..));
        pass.draw(0..vertex_count, 0..1);
    }
}
