use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wave::{FragmentUniforms, Mesh, Scene};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, SurfaceSettings};

use super::context::GpuContext;
use super::pipeline::{MaterialPipeline, CAMERA_BINDING, MATERIAL_BINDING};
use super::uniforms::{CameraBlock, MaterialBlock};

/// GPU resources backing one scene: surface, pipeline, geometry and uniforms.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: MaterialPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    multisample_target: Option<MultisampleTarget>,
    frame_count: u64,
    last_fps_update: Instant,
    frames_since_last_update: u32,
}

struct MultisampleTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

impl GpuState {
    /// Creates the surface and uploads `mesh`'s geometry and material program.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        settings: &SurfaceSettings,
        mesh: &Mesh,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, settings)?;
        let device = &context.device;
        let pipeline = MaterialPipeline::new(
            device,
            &mesh.material,
            context.surface_format,
            context.sample_count,
        )?;

        let positions = mesh.geometry.positions();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane vertices"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = mesh.geometry.indices();
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("plane indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let material_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("material uniform buffer"),
            size: std::mem::size_of::<MaterialBlock>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniform buffer"),
            contents: bytemuck::bytes_of(&CameraBlock::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material bind group"),
            layout: &pipeline.uniform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: MATERIAL_BINDING,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: CAMERA_BINDING,
                    resource: camera_buffer.as_entire_binding(),
                },
            ],
        });

        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });

        Ok(Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            material_buffer,
            camera_buffer,
            uniform_bind_group,
            multisample_target,
            frame_count: 0,
            last_fps_update: Instant::now(),
            frames_since_last_update: 0,
            context,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        if let Some(previous) = self.multisample_target.take() {
            previous.texture.destroy();
        }
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            )
        });
    }

    /// Uploads the scene's uniforms and draws one frame to the surface.
    ///
    /// A scene without a mesh, or whose uniform table cannot be read, presents
    /// a cleared frame.
    pub(crate) fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        self.track_fps();

        let material = match scene.uniforms().map(FragmentUniforms::from_table) {
            Some(Ok(uniforms)) => Some(MaterialBlock::from(&uniforms)),
            Some(Err(err)) => {
                warn!(error = %err, "material uniforms unreadable; skipping draw");
                None
            }
            None => None,
        };
        if let Some(block) = material.as_ref() {
            let (projection, model_view) = scene.transforms();
            self.context
                .queue
                .write_buffer(&self.material_buffer, 0, bytemuck::bytes_of(block));
            self.context.queue.write_buffer(
                &self.camera_buffer,
                0,
                bytemuck::bytes_of(&CameraBlock::new(projection, model_view)),
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        self.encode_draw(&mut encoder, &view, material.is_some());
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.frame_count = self.frame_count.saturating_add(1);
        Ok(())
    }

    fn encode_draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        draw_mesh: bool,
    ) {
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(view)),
            None => (view, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        if !draw_mesh {
            return;
        }
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    fn track_fps(&mut self) {
        let now = Instant::now();
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = fps.round(),
                frame_count = self.frame_count,
                "render stats"
            );
        }
    }

    /// Releases every GPU allocation owned by the scene.
    pub(crate) fn dispose(self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.material_buffer.destroy();
        self.camera_buffer.destroy();
        if let Some(msaa) = self.multisample_target {
            msaa.texture.destroy();
        }
        debug!(frames = self.frame_count, "disposed GPU resources");
    }
}
