use egui::Context;
use winit::event::WindowEvent;
use winit::window::Window;

use super::theme::{self, ThemeMode};

/// Tessellated output of the last UI pass, waiting for `render`.
#[derive(Default)]
struct PreparedFrame {
    shapes: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
}

/// egui on top of the scene: winit input in, one load-op pass out.
pub struct EguiOverlay {
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    theme: ThemeMode,
    frame: PreparedFrame,
    screen: egui_wgpu::ScreenDescriptor,
}

impl EguiOverlay {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        window: &Window,
        theme: ThemeMode,
    ) -> Self {
        let ctx = Context::default();
        theme::apply(&ctx, theme);
        let viewport_id = ctx.viewport_id();
        let state = egui_winit::State::new(ctx, viewport_id, window, None, None, None);
        let renderer = egui_wgpu::Renderer::new(
            device,
            format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                ..Default::default()
            },
        );

        let size = window.inner_size();
        Self {
            state,
            renderer,
            theme,
            frame: PreparedFrame::default(),
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: window.scale_factor() as f32,
            },
        }
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
        theme::apply(self.state.egui_ctx(), theme);
    }

    /// Feed a window event to egui. Returns whether egui consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    pub fn wants_keyboard(&self) -> bool {
        self.state.egui_ctx().wants_keyboard_input()
    }

    /// Whether a press at the current pointer position belongs to egui.
    pub fn wants_mouse(&self) -> bool {
        let ctx = self.state.egui_ctx();
        ctx.wants_pointer_input() || ctx.is_pointer_over_area()
    }

    pub fn context(&self) -> Context {
        self.state.egui_ctx().clone()
    }

    pub fn resize(&mut self, width: u32, height: u32, pixels_per_point: f32) {
        self.screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point,
        };
    }

    /// Run one UI pass and keep its output for the next `render`.
    pub fn run(&mut self, window: &Window, ui: impl FnMut(&Context)) {
        let input = self.state.take_egui_input(window);
        let ctx = self.state.egui_ctx().clone();
        let output = ctx.run(input, ui);
        self.state
            .handle_platform_output(window, output.platform_output);
        self.frame = PreparedFrame {
            shapes: ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
        };
    }

    /// Draw the prepared frame over whatever is already in `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let frame = std::mem::take(&mut self.frame);
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.shapes, &self.screen);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("ui-overlay"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &frame.shapes, &self.screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
