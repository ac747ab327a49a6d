use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, BufferBindingType, ColorTargetState,
    CommandEncoder, Device, FragmentState, PipelineCompilationOptions, PipelineLayoutDescriptor,
    PrimitiveState, Queue, RenderPipeline, Sampler, SamplerBindingType, ShaderStages,
    TextureFormat, TextureSampleType, TextureView, TextureViewDimension, VertexState,
};

use super::camera::Camera;
use super::placeholder::{FRAME_FORMAT, PlaceholderTexture};
use super::uniforms::SurfaceUniforms;
use crate::media::DecodedFrame;
use crate::surface::SurfaceGeometry;

const SURFACE_SHADER: &str = include_str!("../../../../assets/shaders/surface.wgsl");

const MARKER_COLOR: [f32; 4] = [0.9, 0.15, 0.15, 1.0];
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.07,
    g: 0.07,
    b: 0.07,
    a: 1.0,
};

/// GPU copy of the latest video frame.
struct FrameTexture {
    texture: wgpu::Texture,
    #[allow(dead_code)]
    view: TextureView,
    width: u32,
    height: u32,
}

/// Draws the video surface (textured quad) and its resize marker (fixed-size
/// disc at the positive corner) into the swapchain view.
pub struct SurfacePass {
    pipeline: RenderPipeline,
    bind_group_layout: BindGroupLayout,
    sampler: Sampler,
    placeholder: PlaceholderTexture,
    frame: Option<FrameTexture>,
    surface_uniforms: wgpu::Buffer,
    marker_uniforms: wgpu::Buffer,
    surface_bind_group: BindGroup,
    marker_bind_group: BindGroup,
}

impl SurfacePass {
    pub fn new(device: &Device, queue: &Queue, target_format: TextureFormat) -> Self {
        let placeholder = PlaceholderTexture::new(device, queue);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("surface-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let uniform_size = std::mem::size_of::<SurfaceUniforms>() as u64;
        let make_uniforms = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: uniform_size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let surface_uniforms = make_uniforms("surface-uniforms");
        let marker_uniforms = make_uniforms("marker-uniforms");

        // Bind group layout: uniform(0), texture(1), sampler(2)
        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("surface-bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX_FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: std::num::NonZeroU64::new(uniform_size),
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("surface"),
            source: wgpu::ShaderSource::Wgsl(SURFACE_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("surface-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("surface-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let surface_bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &surface_uniforms,
            &placeholder.view,
            &sampler,
            "surface-bg",
        );
        // The marker never samples its texture; any view satisfies the layout
        let marker_bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &marker_uniforms,
            &placeholder.view,
            &sampler,
            "marker-bg",
        );

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            placeholder,
            frame: None,
            surface_uniforms,
            marker_uniforms,
            surface_bind_group,
            marker_bind_group,
        }
    }

    /// Copy a decoded frame into the surface texture, reallocating it when the
    /// frame size changes.
    pub fn upload_frame(&mut self, device: &Device, queue: &Queue, frame: &DecodedFrame) {
        if frame.is_empty() {
            return;
        }
        let expected = (frame.width as usize) * (frame.height as usize) * 4;
        if frame.data.len() < expected {
            log::warn!(
                "Skipping short frame: {} bytes for {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            );
            return;
        }

        let needs_alloc = self
            .frame
            .as_ref()
            .map_or(true, |f| f.width != frame.width || f.height != frame.height);
        if needs_alloc {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("surface-frame"),
                size: wgpu::Extent3d {
                    width: frame.width,
                    height: frame.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FRAME_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.surface_bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.surface_uniforms,
                &view,
                &self.sampler,
                "surface-bg",
            );
            log::debug!("Allocated frame texture {}x{}", frame.width, frame.height);
            self.frame = Some(FrameTexture {
                texture,
                view,
                width: frame.width,
                height: frame.height,
            });
        }

        let Some(target) = &self.frame else {
            return;
        };
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.data[..expected],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Drop the frame texture and go back to the transparent placeholder.
    pub fn reset_frame(&mut self, device: &Device) {
        self.frame = None;
        self.surface_bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            &self.surface_uniforms,
            &self.placeholder.view,
            &self.sampler,
            "surface-bg",
        );
    }

    /// Write this frame's uniforms from the current geometry.
    pub fn update(
        &self,
        queue: &Queue,
        camera: &Camera,
        geometry: &SurfaceGeometry,
        marker_radius_px: f32,
    ) {
        let view_proj = camera.view_proj();
        let surface = SurfaceUniforms::textured(view_proj, geometry.position, geometry.size);
        let marker_diameter = 2.0 * marker_radius_px * camera.units_per_pixel();
        let marker = SurfaceUniforms::disc(
            view_proj,
            geometry.handle_position(),
            marker_diameter,
            MARKER_COLOR,
        );
        queue.write_buffer(&self.surface_uniforms, 0, bytemuck::bytes_of(&surface));
        queue.write_buffer(&self.marker_uniforms, 0, bytemuck::bytes_of(&marker));
    }

    /// Clear `view` and draw surface then marker.
    pub fn draw(&self, encoder: &mut CommandEncoder, view: &TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("surface-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKGROUND),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.surface_bind_group, &[]);
        pass.draw(0..6, 0..1);
        pass.set_bind_group(0, &self.marker_bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }
}

fn create_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &TextureView,
    sampler: &Sampler,
    label: &str,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(view),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::Sampler(sampler),
            },
        ],
    })
}
