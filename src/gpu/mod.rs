//! wgpu render host.
//!
//! [`GpuRenderer`] draws a [`Frame`] into a window surface: lines first, then
//! instanced glow billboards, both additively blended over the background.
//! Vertex buffers are created once at full capacity in
//! [`RenderHost::allocate_buffers`]; each frame only rewrites point positions
//! and the active prefix of the line buffers.

mod pipelines;
mod shaders;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::buffers::FrameBuffers;
use crate::config::{Config, Viewport};
use crate::engine::RenderHost;
use crate::error::{GpuError, ResourceError};
use crate::scene::Frame;
use crate::sprite::GlowSprite;

const SPRITE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const MSAA_SAMPLES: u32 = 4;
/// Vertices per billboard quad.
const QUAD_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_position: [f32; 3],
    point_size: f32,
    fog_color: [f32; 3],
    fog_density: f32,
    viewport: [f32; 2],
    sprite_enabled: f32,
    _pad: f32,
}

impl Uniforms {
    fn new(frame: &Frame<'_>, viewport: [f32; 2], sprite_enabled: bool) -> Self {
        Self {
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            model: frame.model.to_cols_array_2d(),
            camera_position: frame.camera_position.to_array(),
            point_size: frame.point_size,
            fog_color: frame.fog.color.to_array(),
            fog_density: frame.fog.density,
            viewport,
            sprite_enabled: if sprite_enabled { 1.0 } else { 0.0 },
            _pad: 0.0,
        }
    }
}

struct SpriteTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct VertexBuffers {
    point_positions: wgpu::Buffer,
    point_colors: wgpu::Buffer,
    line_positions: wgpu::Buffer,
    line_colors: wgpu::Buffer,
}

impl VertexBuffers {
    fn destroy(&self) {
        self.point_positions.destroy();
        self.point_colors.destroy();
        self.line_positions.destroy();
        self.line_colors.destroy();
    }
}

/// Render host backed by a wgpu surface.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,
    max_pixel_ratio: f32,
    clear_color: wgpu::Color,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sprite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    point_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    sprite: Option<SpriteTexture>,
    /// 1x1 white texture bound while points render flat.
    flat_sprite: SpriteTexture,
    buffers: Option<VertexBuffers>,
    input_attached: bool,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, config: &Config) -> Result<Self, GpuError> {
        let quality = config.render_quality();
        let (width, height) = config.viewport.render_size(quality.max_pixel_ratio);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        device.on_uncaptured_error(Box::new(|e: wgpu::Error| log::error!("wgpu error: {}", e)));

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let sample_count = if quality.sample_count() > 1
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            if quality.antialias {
                log::debug!("{:?} does not support {}x MSAA", format, MSAA_SAMPLES);
            }
            1
        };
        let msaa_view = create_msaa_view(&device, &surface_config, sample_count);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = pipelines::uniform_layout(&device);
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sprite_layout = pipelines::sprite_layout(&device);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let point_pipeline = pipelines::create_point_pipeline(
            &device,
            &uniform_layout,
            &sprite_layout,
            format,
            sample_count,
        );
        let line_pipeline =
            pipelines::create_line_pipeline(&device, &uniform_layout, format, sample_count);

        let flat_sprite = create_sprite_texture(
            &device,
            &queue,
            &sprite_layout,
            &sampler,
            "Flat Sprite",
            1,
            &[255; 4],
        );

        let bg = config.background();
        let clear_color = wgpu::Color {
            r: bg.x as f64,
            g: bg.y as f64,
            b: bg.z as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            sample_count,
            msaa_view,
            max_pixel_ratio: quality.max_pixel_ratio,
            clear_color,
            uniform_buffer,
            uniform_bind_group,
            sprite_layout,
            sampler,
            point_pipeline,
            line_pipeline,
            sprite: None,
            flat_sprite,
            buffers: None,
            input_attached: false,
        })
    }

    /// Whether pointer events should currently be forwarded to the engine.
    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    /// Physical size of the surface.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn vertex_buffer(&self, label: &'static str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl RenderHost for GpuRenderer {
    fn allocate_sprite(&mut self, sprite: &GlowSprite) -> Result<(), ResourceError> {
        let size = sprite.size();
        if size > self.device.limits().max_texture_dimension_2d {
            return Err(ResourceError::SpriteSize { size });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = create_sprite_texture(
            &self.device,
            &self.queue,
            &self.sprite_layout,
            &self.sampler,
            "Glow Sprite",
            size,
            sprite.data(),
        );
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            texture.texture.destroy();
            return Err(ResourceError::Allocation {
                label: "glow sprite",
                message: err.to_string(),
            });
        }

        if let Some(old) = self.sprite.replace(texture) {
            old.texture.destroy();
        }
        Ok(())
    }

    fn allocate_buffers(&mut self, buffers: &FrameBuffers) -> Result<(), ResourceError> {
        let limit = self.device.limits().max_buffer_size;
        let sizes = [
            ("point positions", byte_size(buffers.point_positions())),
            ("point colors", byte_size(buffers.point_colors())),
            ("line positions", byte_size(buffers.line_positions())),
            ("line colors", byte_size(buffers.line_colors())),
        ];
        for (label, size) in sizes {
            if size > limit {
                return Err(ResourceError::BufferTooLarge { label, size, limit });
            }
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let allocated = VertexBuffers {
            point_positions: self.vertex_buffer("Point Positions", sizes[0].1),
            point_colors: self.vertex_buffer("Point Colors", sizes[1].1),
            line_positions: self.vertex_buffer("Line Positions", sizes[2].1),
            line_colors: self.vertex_buffer("Line Colors", sizes[3].1),
        };
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            allocated.destroy();
            return Err(ResourceError::Allocation {
                label: "vertex buffers",
                message: err.to_string(),
            });
        }

        // Colors are fixed for the lifetime of the field.
        if !buffers.point_colors().is_empty() {
            self.queue.write_buffer(
                &allocated.point_colors,
                0,
                bytemuck::cast_slice(buffers.point_colors()),
            );
        }

        log::debug!(
            "allocated vertex buffers: {} points, {} edge slots ({} bytes of lines)",
            buffers.point_count(),
            buffers.max_edges(),
            sizes[2].1 + sizes[3].1
        );

        if let Some(old) = self.buffers.replace(allocated) {
            old.destroy();
        }
        Ok(())
    }

    fn attach_input(&mut self) {
        self.input_attached = true;
    }

    fn detach_input(&mut self) {
        self.input_attached = false;
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), ResourceError> {
        let Some(gpu_buffers) = &self.buffers else {
            return Err(ResourceError::Allocation {
                label: "vertex buffers",
                message: "present called before allocation".into(),
            });
        };

        let uniforms = Uniforms::new(
            frame,
            [self.config.width as f32, self.config.height as f32],
            self.sprite.is_some(),
        );
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let cpu = frame.buffers;
        if !cpu.point_positions().is_empty() {
            self.queue.write_buffer(
                &gpu_buffers.point_positions,
                0,
                bytemuck::cast_slice(cpu.point_positions()),
            );
        }
        let line_vertices = frame.line_vertex_count() as u32;
        let line_bytes = std::mem::size_of_val(cpu.active_line_positions()) as u64;
        if line_vertices > 0 {
            self.queue.write_buffer(
                &gpu_buffers.line_positions,
                0,
                bytemuck::cast_slice(cpu.active_line_positions()),
            );
            self.queue.write_buffer(
                &gpu_buffers.line_colors,
                0,
                bytemuck::cast_slice(cpu.active_line_colors()),
            );
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(ResourceError::OutOfMemory),
            Err(e) => {
                log::warn!("Surface error: {:?}", e);
                return Ok(());
            }
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (view, resolve_target, store) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&surface_view), wgpu::StoreOp::Discard),
            None => (&surface_view, None, wgpu::StoreOp::Store),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if line_vertices > 0 {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, gpu_buffers.line_positions.slice(..line_bytes));
                render_pass.set_vertex_buffer(1, gpu_buffers.line_colors.slice(..line_bytes));
                render_pass.draw(0..line_vertices, 0..1);
            }

            let point_count = frame.point_count() as u32;
            if point_count > 0 {
                let sprite = self.sprite.as_ref().unwrap_or(&self.flat_sprite);
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_bind_group(1, &sprite.bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu_buffers.point_positions.slice(..));
                render_pass.set_vertex_buffer(1, gpu_buffers.point_colors.slice(..));
                render_pass.draw(0..QUAD_VERTICES, 0..point_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn resize(&mut self, viewport: &Viewport) {
        let (width, height) = viewport.render_size(self.max_pixel_ratio);
        if (width, height) == (self.config.width, self.config.height) {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.msaa_view = create_msaa_view(&self.device, &self.config, self.sample_count);
    }

    fn release(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            buffers.destroy();
        }
        if let Some(sprite) = self.sprite.take() {
            sprite.texture.destroy();
        }
        self.input_attached = false;
        log::debug!("GPU resources released");
    }
}

/// GPU size of a float buffer. Zero-sized buffers cannot be sliced, and a
/// single particle has no edges.
fn byte_size(data: &[f32]) -> u64 {
    (std::mem::size_of_val(data) as u64).max(wgpu::COPY_BUFFER_ALIGNMENT)
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Color Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

fn create_sprite_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    size: u32,
    data: &[u8],
) -> SpriteTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SPRITE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    SpriteTexture { texture, bind_group }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn test_uniform_size() {
        // Three mat4s plus three 16-byte rows.
        assert_eq!(std::mem::size_of::<Uniforms>(), 240);
        assert_eq!(std::mem::size_of::<Uniforms>() % 16, 0);
    }

    #[test]
    fn test_uniforms_from_frame() {
        let config = Config::default().with_particle_count(4).with_seed(1);
        let scene = Scene::new(&config).unwrap();
        let frame = scene.frame();
        let uniforms = Uniforms::new(&frame, [800.0, 600.0], false);

        assert_eq!(uniforms.view, frame.view.to_cols_array_2d());
        assert_eq!(uniforms.fog_density, config.fog.density);
        assert_eq!(uniforms.point_size, config.point_size);
        assert_eq!(uniforms.sprite_enabled, 0.0);
        assert_eq!(Uniforms::new(&frame, [1.0, 1.0], true).sprite_enabled, 1.0);
    }
}
