use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::domain::{
    Button, ConsoleState, FRAME_SIZE, FrameDriver, Framebuffer, ImageBank, InitError, InputState,
    PaletteBank, Player, RESOLUTION_HEIGHT, RESOLUTION_WIDTH, Renderer,
};

#[cfg(feature = "gamepad")]
use gilrs::Gilrs;

const RESOLUTION_WIDTH_U32: u32 = RESOLUTION_WIDTH as u32;
const RESOLUTION_HEIGHT_U32: u32 = RESOLUTION_HEIGHT as u32;
const WINDOW_SCALE: u32 = 3;
const FRAME_RATE_HZ: u64 = 60;
const FRAME_INTERVAL_NS: u64 = 1_000_000_000 / FRAME_RATE_HZ;
#[cfg(feature = "gamepad")]
const STICK_DEADZONE: f32 = 0.25;

/// The windowed frame driver: rasterizes the console state on the CPU,
/// blits it through wgpu, and samples keyboard (and optionally gamepad)
/// devices. Blocking for the next frame deadline happens inside
/// `advance`, which makes it the session's pacing mechanism.
pub struct WindowDriver {
    event_loop: Option<EventLoop<()>>,
    gfx: Option<Gfx>,
    keyboard: InputState,
    sample: InputState,
    booted_at: Option<Instant>,
    next_frame: Instant,
    quit: bool,
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
}

impl WindowDriver {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            gfx: None,
            keyboard: InputState::new(),
            sample: InputState::new(),
            booted_at: None,
            next_frame: Instant::now(),
            quit: false,
            #[cfg(feature = "gamepad")]
            gilrs: None,
        }
    }

    /// Pumps window events until the frame deadline passes, feeding
    /// keyboard changes into the held-state and honoring close/resize
    /// requests.
    fn pace_and_pump(&mut self) {
        let Some(event_loop) = self.event_loop.as_mut() else {
            self.quit = true;
            return;
        };
        let window = self.gfx.as_ref().map(|gfx| Arc::clone(&gfx.window));
        let keyboard = &mut self.keyboard;
        let mut resized = None;

        loop {
            let remaining = self.next_frame.saturating_duration_since(Instant::now());
            let status = event_loop.pump_events(Some(remaining), |event, elwt| {
                let Event::WindowEvent { event, .. } = event else {
                    return;
                };
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => resized = Some(size),
                    WindowEvent::KeyboardInput { event, .. } => {
                        if let PhysicalKey::Code(code) = event.physical_key {
                            let pressed = event.state == ElementState::Pressed;
                            if pressed && !event.repeat && code == KeyCode::F11 {
                                if let Some(window) = window.as_deref() {
                                    toggle_borderless_fullscreen(window);
                                }
                            }
                            if let Some(button) = button_for_key(code) {
                                keyboard.set_held(Player::Alpha, button, pressed);
                            }
                        }
                    }
                    _ => {}
                }
            });
            if let PumpStatus::Exit(_) = status {
                self.quit = true;
            }
            if self.quit || Instant::now() >= self.next_frame {
                break;
            }
        }

        if let (Some(gfx), Some(size)) = (self.gfx.as_mut(), resized) {
            gfx.resize(size);
        }

        let now = Instant::now();
        let interval = Duration::from_nanos(FRAME_INTERVAL_NS);
        while self.next_frame <= now {
            self.next_frame += interval;
        }
    }

    #[cfg(feature = "gamepad")]
    fn sample_gamepads(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };
        while gilrs.next_event().is_some() {}

        for (index, (_id, gamepad)) in gilrs.gamepads().enumerate() {
            let Some(player) = Player::from_index(index) else {
                break;
            };
            let mut pad = InputState::new();
            read_gamepad(&gamepad, player, &mut pad);
            self.sample.merge(&pad);
        }
    }
}

impl Default for WindowDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver for WindowDriver {
    fn boot(&mut self, images: &ImageBank, palettes: &PaletteBank) -> Result<(), InitError> {
        let event_loop = EventLoop::new()
            .map_err(|err| InitError::Backend(format!("event loop: {err}")))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title("glowbug")
                .with_inner_size(PhysicalSize::new(
                    RESOLUTION_WIDTH_U32 * WINDOW_SCALE,
                    RESOLUTION_HEIGHT_U32 * WINDOW_SCALE,
                ))
                .with_min_inner_size(PhysicalSize::new(
                    RESOLUTION_WIDTH_U32,
                    RESOLUTION_HEIGHT_U32,
                ))
                .build(&event_loop)
                .map_err(|err| InitError::Backend(format!("window: {err}")))?,
        );

        let renderer = Renderer::new(images, palettes);
        let gfx = pollster::block_on(Gfx::new(window, renderer))?;

        #[cfg(feature = "gamepad")]
        {
            self.gilrs = match Gilrs::new() {
                Ok(gilrs) => Some(gilrs),
                Err(err) => {
                    log::warn!("gamepad backend unavailable: {err}");
                    None
                }
            };
        }

        self.event_loop = Some(event_loop);
        self.gfx = Some(gfx);
        self.booted_at = Some(Instant::now());
        self.next_frame = Instant::now() + Duration::from_nanos(FRAME_INTERVAL_NS);
        log::info!("window backend bound at {RESOLUTION_WIDTH}x{RESOLUTION_HEIGHT}");
        Ok(())
    }

    fn advance(&mut self, state: &ConsoleState) -> bool {
        if self.quit {
            return false;
        }
        let Some(gfx) = self.gfx.as_mut() else {
            return false;
        };

        gfx.renderer.render(state, &mut gfx.framebuffer);
        match gfx.present() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => gfx.resize(gfx.size),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, ending session");
                self.quit = true;
            }
            Err(wgpu::SurfaceError::Outdated) => {}
            Err(wgpu::SurfaceError::Timeout) => {}
        }

        self.pace_and_pump();

        self.sample = self.keyboard;
        #[cfg(feature = "gamepad")]
        self.sample_gamepads();

        !self.quit
    }

    fn time(&self) -> u64 {
        self.booted_at
            .map(|booted| booted.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn input(&self, player: Player, button: Button) -> bool {
        self.sample.is_held(player, button)
    }
}

fn button_for_key(code: KeyCode) -> Option<Button> {
    match code {
        KeyCode::ArrowUp => Some(Button::DirUp),
        KeyCode::ArrowRight => Some(Button::DirRight),
        KeyCode::ArrowDown => Some(Button::DirDown),
        KeyCode::ArrowLeft => Some(Button::DirLeft),
        KeyCode::KeyS => Some(Button::FaceUp),
        KeyCode::KeyX => Some(Button::FaceRight),
        KeyCode::KeyZ => Some(Button::FaceDown),
        KeyCode::KeyA => Some(Button::FaceLeft),
        KeyCode::KeyQ => Some(Button::TriggerLeft),
        KeyCode::KeyW => Some(Button::TriggerRight),
        KeyCode::Enter => Some(Button::Menu),
        _ => None,
    }
}

#[cfg(feature = "gamepad")]
fn read_gamepad(gamepad: &gilrs::Gamepad, player: Player, out: &mut InputState) {
    use gilrs::{Axis, Button as PadButton};

    let axis_x = gamepad
        .axis_data(Axis::LeftStickX)
        .map(|a| a.value())
        .unwrap_or(0.0);
    let axis_y = gamepad
        .axis_data(Axis::LeftStickY)
        .map(|a| a.value())
        .unwrap_or(0.0);

    out.set_held(
        player,
        Button::DirUp,
        gamepad.is_pressed(PadButton::DPadUp) || axis_y > STICK_DEADZONE,
    );
    out.set_held(
        player,
        Button::DirDown,
        gamepad.is_pressed(PadButton::DPadDown) || axis_y < -STICK_DEADZONE,
    );
    out.set_held(
        player,
        Button::DirLeft,
        gamepad.is_pressed(PadButton::DPadLeft) || axis_x < -STICK_DEADZONE,
    );
    out.set_held(
        player,
        Button::DirRight,
        gamepad.is_pressed(PadButton::DPadRight) || axis_x > STICK_DEADZONE,
    );

    out.set_held(player, Button::FaceDown, gamepad.is_pressed(PadButton::South));
    out.set_held(player, Button::FaceRight, gamepad.is_pressed(PadButton::East));
    out.set_held(player, Button::FaceLeft, gamepad.is_pressed(PadButton::West));
    out.set_held(player, Button::FaceUp, gamepad.is_pressed(PadButton::North));

    out.set_held(
        player,
        Button::TriggerLeft,
        gamepad.is_pressed(PadButton::LeftTrigger),
    );
    out.set_held(
        player,
        Button::TriggerRight,
        gamepad.is_pressed(PadButton::RightTrigger),
    );

    out.set_held(
        player,
        Button::Menu,
        gamepad.is_pressed(PadButton::Start) || gamepad.is_pressed(PadButton::Mode),
    );
}

fn toggle_borderless_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

struct Gfx {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    renderer: Renderer,
    framebuffer: Framebuffer,
}

impl Gfx {
    async fn new(window: Arc<Window>, renderer: Renderer) -> Result<Self, InitError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|err| InitError::Backend(format!("surface: {err}")))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| InitError::Backend("no compatible adapter".into()))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|err| InitError::Backend(format!("device: {err}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("framebuffer"),
            size: wgpu::Extent3d {
                width: RESOLUTION_WIDTH_U32,
                height: RESOLUTION_HEIGHT_U32,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("framebuffer_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture_sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_blit.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            texture,
            bind_group,
            pipeline,
            renderer,
            framebuffer: Framebuffer::new(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.size = size;
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let (padded, bytes_per_row) = prepare_framebuffer_upload(self.framebuffer.as_slice());
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &padded,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(RESOLUTION_HEIGHT_U32),
            },
            wgpu::Extent3d {
                width: RESOLUTION_WIDTH_U32,
                height: RESOLUTION_HEIGHT_U32,
                depth_or_array_layers: 1,
            },
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let viewport = self.compute_viewport();
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.07,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_viewport(
                viewport.x,
                viewport.y,
                viewport.width,
                viewport.height,
                0.0,
                1.0,
            );
            render_pass.set_scissor_rect(
                viewport.scissor_x,
                viewport.scissor_y,
                viewport.scissor_width,
                viewport.scissor_height,
            );
            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Largest integer scale of the console resolution that fits the
    /// window, centered with letterbox bars.
    fn compute_viewport(&self) -> Viewport {
        let window_w = self.size.width;
        let window_h = self.size.height;
        if window_w == 0 || window_h == 0 {
            return Viewport::full(window_w, window_h);
        }

        let max_scale_w = window_w / RESOLUTION_WIDTH_U32;
        let max_scale_h = window_h / RESOLUTION_HEIGHT_U32;
        let scale = max_scale_w.min(max_scale_h).max(1);
        let target_w = RESOLUTION_WIDTH_U32 * scale;
        let target_h = RESOLUTION_HEIGHT_U32 * scale;
        let x = window_w.saturating_sub(target_w) / 2;
        let y = window_h.saturating_sub(target_h) / 2;

        Viewport {
            x: x as f32,
            y: y as f32,
            width: target_w as f32,
            height: target_h as f32,
            scissor_x: x,
            scissor_y: y,
            scissor_width: target_w.min(window_w),
            scissor_height: target_h.min(window_h),
        }
    }
}

fn prepare_framebuffer_upload(frame: &[u8]) -> (Vec<u8>, u32) {
    let width = RESOLUTION_WIDTH;
    let height = RESOLUTION_HEIGHT;
    if frame.len() != FRAME_SIZE {
        return (vec![0u8; width * height * 4], (width * 4) as u32);
    }
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    let padded = unpadded.div_ceil(align) * align;
    let mut data = vec![0u8; padded * height];
    for y in 0..height {
        let src = y * width * 3;
        let dst = y * padded;
        for x in 0..width {
            let src_px = src + x * 3;
            let dst_px = dst + x * 4;
            data[dst_px] = frame[src_px];
            data[dst_px + 1] = frame[src_px + 1];
            data[dst_px + 2] = frame[src_px + 2];
            data[dst_px + 3] = 0xFF;
        }
    }
    (data, padded as u32)
}

#[derive(Debug, Clone, Copy)]
struct Viewport {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    scissor_x: u32,
    scissor_y: u32,
    scissor_width: u32,
    scissor_height: u32,
}

impl Viewport {
    fn full(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            scissor_x: 0,
            scissor_y: 0,
            scissor_width: width,
            scissor_height: height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_rows_are_aligned_and_opaque() {
        let frame = vec![7u8; FRAME_SIZE];
        let (data, bytes_per_row) = prepare_framebuffer_upload(&frame);

        assert_eq!(bytes_per_row as usize % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize, 0);
        assert_eq!(data.len(), bytes_per_row as usize * RESOLUTION_HEIGHT);
        assert_eq!(&data[0..4], &[7, 7, 7, 0xFF]);
    }

    #[test]
    fn keyboard_map_covers_every_button_once() {
        use std::collections::HashSet;

        let keys = [
            KeyCode::ArrowUp,
            KeyCode::ArrowRight,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::KeyS,
            KeyCode::KeyX,
            KeyCode::KeyZ,
            KeyCode::KeyA,
            KeyCode::KeyQ,
            KeyCode::KeyW,
            KeyCode::Enter,
        ];
        let mapped: HashSet<_> = keys.iter().filter_map(|code| button_for_key(*code)).collect();
        assert_eq!(mapped.len(), Button::ALL.len());
        assert_eq!(button_for_key(KeyCode::F11), None);
    }
}
