use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use tessera_assets::{
    AssetSerializer, AssetStore, DEFAULT_TILE_SIZE, TileAtlasSource, TileMapData, TileMapSerializer, TileSet,
    TileSetSerializer,
};
use tessera_author::{
    CanvasInput, MAX_CELL_SIZE, MAX_HALF_EXTENT, MIN_CELL_SIZE, TileMapEditor, Tool,
};
use tessera_common::AssetHandle;
use tessera_render::{GraphicsApi, RendererConfig, RendererContext, Stats2D};
use tessera_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.1,
    a: 1.0,
};

#[derive(Parser)]
#[command(name = "tessera-editor", about = "Tessera tile map editor")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Tile map file; created on first save if it does not exist
    map: PathBuf,

    /// Tile set file; a generated palette tile set is used when omitted
    #[arg(long)]
    tileset: Option<PathBuf>,

    /// Half-extent of a newly created map
    #[arg(long, default_value = "8")]
    half_extent: u32,

    /// Palette atlas layout registered for the tile set's atlas sources
    #[arg(long, default_value = "4")]
    palette_columns: u32,
    #[arg(long, default_value = "4")]
    palette_rows: u32,

    /// Graphics API
    #[arg(long, default_value = "wgpu")]
    api: GraphicsApi,

    /// Renderer configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Mouse state accumulated between frames.
#[derive(Default)]
struct PointerState {
    cursor: Option<Vec2>,
    primary: bool,
    secondary: bool,
    middle: bool,
    pan_delta: Vec2,
    wheel: f32,
}

/// Application state.
struct AppState {
    store: AssetStore,
    tile_set: Option<AssetHandle>,
    editor: TileMapEditor,
    map_path: PathBuf,
    pointer: PointerState,
    ctrl_held: bool,
    status: String,
}

impl AppState {
    fn load(cli: &Cli) -> Result<Self> {
        let mut map = if cli.map.exists() {
            TileMapSerializer::try_deserialize(&cli.map)
                .with_context(|| format!("reading tile map {}", cli.map.display()))?
        } else {
            tracing::info!(path = %cli.map.display(), "creating new tile map");
            let half = cli.half_extent.min(MAX_HALF_EXTENT);
            let mut map = TileMapData::new(half, half);
            map.handle = AssetHandle::new();
            map
        };

        let mut store = AssetStore::new();
        let set = match &cli.tileset {
            Some(path) => TileSetSerializer::try_deserialize(path)
                .with_context(|| format!("reading tile set {}", path.display()))?,
            None => demo_tile_set(
                &mut store,
                map.tile_set_handle,
                cli.palette_columns,
                cli.palette_rows,
            )?,
        };
        for source in set.atlas_sources() {
            store.register_palette_atlas(cli.palette_columns, cli.palette_rows, source.tile_size);
        }
        let set_handle = store.insert_tile_set(set);
        let missing = store.resolve_tile_set_textures(set_handle);
        if missing > 0 {
            tracing::warn!(missing, "tile set has unresolved textures");
        }

        if map.tile_set_handle.is_null() {
            map.tile_set_handle = set_handle;
        } else if map.tile_set_handle != set_handle {
            tracing::warn!(
                map = %map.tile_set_handle,
                tile_set = %set_handle,
                "map references a different tile set"
            );
        }

        let mut editor = TileMapEditor::new(Vec2::new(1280.0, 720.0));
        editor.open(map);

        Ok(Self {
            store,
            tile_set: Some(set_handle),
            editor,
            map_path: cli.map.clone(),
            pointer: PointerState::default(),
            ctrl_held: false,
            status: String::new(),
        })
    }

    fn tile_set(&self) -> Option<&TileSet> {
        self.tile_set.and_then(|h| self.store.tile_set(h))
    }

    fn frame_input(&mut self, pointer_over_ui: bool) {
        let input = CanvasInput {
            cursor: self.pointer.cursor.filter(|_| !pointer_over_ui),
            primary: self.pointer.primary,
            secondary: self.pointer.secondary,
            pan_delta: std::mem::take(&mut self.pointer.pan_delta),
            wheel: std::mem::take(&mut self.pointer.wheel),
        };
        self.editor.handle_input(&input);
    }

    fn save(&mut self) {
        let Some(map) = self.editor.map() else {
            return;
        };
        match TileMapSerializer::serialize(&self.map_path, map) {
            Ok(()) => {
                self.editor.mark_saved();
                self.status = format!("Saved {}", self.map_path.display());
                tracing::info!(path = %self.map_path.display(), "tile map saved");
            }
            Err(e) => {
                self.status = format!("Save failed: {e}");
                tracing::error!("failed to save tile map: {e}");
            }
        }
    }

    fn undo(&mut self) {
        if let Err(e) = self.editor.undo() {
            self.status = e.to_string();
        }
    }

    fn redo(&mut self) {
        if let Err(e) = self.editor.redo() {
            self.status = e.to_string();
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if matches!(key, KeyCode::ControlLeft | KeyCode::ControlRight) {
            self.ctrl_held = pressed;
        }
        if !pressed {
            return;
        }

        match key {
            KeyCode::KeyS if self.ctrl_held => self.save(),
            KeyCode::KeyZ if self.ctrl_held => self.undo(),
            KeyCode::KeyY if self.ctrl_held => self.redo(),
            KeyCode::KeyB => self.editor.set_tool(Tool::Brush),
            KeyCode::KeyE => self.editor.set_tool(Tool::Eraser),
            KeyCode::KeyF => self.editor.set_tool(Tool::Fill),
            KeyCode::Home => self.reframe(),
            _ => {}
        }
    }

    fn reframe(&mut self) {
        if let Some(map) = self.editor.map().cloned() {
            self.editor.camera_mut().frame(&map);
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, stats: Stats2D) {
        egui::SidePanel::left("tile_map")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Tile Map");
                let dirty = if self.editor.is_dirty() { " *" } else { "" };
                ui.label(format!("{}{dirty}", self.map_path.display()));
                ui.separator();

                ui.heading("Tools");
                ui.horizontal(|ui| {
                    for tool in Tool::ALL {
                        if ui
                            .selectable_label(self.editor.tool() == tool, tool.label())
                            .clicked()
                        {
                            self.editor.set_tool(tool);
                        }
                    }
                });

                ui.separator();
                ui.heading("Palette");
                let ids: Vec<u16> = self
                    .tile_set()
                    .map(|set| set.sorted_tile_defs().iter().map(|d| d.id).collect())
                    .unwrap_or_default();
                if ids.is_empty() {
                    ui.label("No tiles defined");
                }
                ui.horizontal_wrapped(|ui| {
                    for id in ids {
                        let selected = self.editor.selected_tile() == id;
                        if ui.selectable_label(selected, format!("{id:>3}")).clicked() {
                            self.editor.select_tile(id);
                        }
                    }
                });

                if let Some(map) = self.editor.map() {
                    let mut half = [map.half_width(), map.half_height()];
                    let mut cell_size = map.cell_size();
                    let old_half = half;
                    let old_cell_size = cell_size;

                    ui.separator();
                    ui.heading("Map");
                    ui.horizontal(|ui| {
                        ui.label("Half extent:");
                        ui.add(egui::DragValue::new(&mut half[0]).range(0..=MAX_HALF_EXTENT).prefix("W: "));
                        ui.add(egui::DragValue::new(&mut half[1]).range(0..=MAX_HALF_EXTENT).prefix("H: "));
                    });
                    ui.horizontal(|ui| {
                        ui.label("Cell size:");
                        ui.add(
                            egui::DragValue::new(&mut cell_size)
                                .range(MIN_CELL_SIZE..=MAX_CELL_SIZE)
                                .speed(0.05),
                        );
                    });
                    ui.label(format!("Size: {}x{}", map.width(), map.height()));

                    if let Some(fill) = self.editor.fill_stats() {
                        ui.label(format!(
                            "Tiles: {} filled / {} empty / {} total",
                            fill.filled, fill.empty, fill.total
                        ));
                    }

                    if half != old_half {
                        let _ = self.editor.resize(half[0], half[1]);
                    }
                    if cell_size != old_cell_size {
                        let _ = self.editor.set_cell_size(cell_size);
                    }
                }

                ui.separator();
                match self.editor.hovered_tile() {
                    Some(cell) => ui.label(format!("Hovered: ({}, {})", cell.x, cell.y)),
                    None => ui.label("Hovered: -"),
                };
                ui.label(format!("Zoom: {:.1}", self.editor.camera().zoom));
                ui.label(format!(
                    "Draw calls: {}  Quads: {}  Lines: {}",
                    stats.draw_calls, stats.quad_count, stats.line_count
                ));

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save (Ctrl+S)").clicked() {
                        self.save();
                    }
                    if ui.button("Frame (Home)").clicked() {
                        self.reframe();
                    }
                });
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(self.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                        .clicked()
                    {
                        self.undo();
                    }
                    if ui
                        .add_enabled(self.editor.can_redo(), egui::Button::new("Redo (Ctrl+Y)"))
                        .clicked()
                    {
                        self.redo();
                    }
                });

                if !self.status.is_empty() {
                    ui.separator();
                    ui.small(&self.status);
                }
                ui.separator();
                ui.small("LMB: tool | RMB: erase | MMB: pan | Wheel: zoom | B/E/F: tools");
            });
    }
}

/// Palette atlas tile set with one tile per swatch.
fn demo_tile_set(
    store: &mut AssetStore,
    handle: AssetHandle,
    columns: u32,
    rows: u32,
) -> Result<TileSet> {
    let tile_size = DEFAULT_TILE_SIZE;
    let atlas = store.register_palette_atlas(columns, rows, tile_size);
    let handle = if handle.is_null() {
        AssetHandle::new()
    } else {
        handle
    };
    let mut set = TileSet::new(handle);
    let index = set.add_atlas_source(TileAtlasSource {
        texture_handle: atlas,
        tile_size,
        cached_texture: store.texture(atlas),
    });
    set.add_atlas_grid(index)?;
    Ok(set)
}

/// Window, surface and everything that renders into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    renderer: RendererContext<WgpuBackend>,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        store: &AssetStore,
        renderer_config: RendererConfig,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Tessera Tile Map Editor")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable graphics adapter")?;

        let features = WgpuBackend::required_features();
        if !adapter.features().contains(features) {
            bail!("adapter does not support texture binding arrays");
        }
        let limits = adapter.limits();
        if limits.max_sampled_textures_per_shader_stage < renderer_config.max_texture_slots {
            bail!(
                "adapter supports {} textures per stage, {} texture slots configured",
                limits.max_sampled_textures_per_shader_stage,
                renderer_config.max_texture_slots
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tessera_device"),
                required_features: features,
                required_limits: limits,
                memory_hints: Default::default(),
            },
            None,
        ))?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut backend = WgpuBackend::new(
            device.clone(),
            queue.clone(),
            surface_format,
            config.width,
            config.height,
            &renderer_config,
        );
        for asset in store.textures() {
            let texture = asset.texture;
            backend.upload_texture(texture.id, texture.width, texture.height, &asset.pixels);
        }
        let renderer = RendererContext::new(backend, renderer_config)?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .backend_mut()
            .resize(self.config.width, self.config.height);
    }
}

struct EditorApp {
    state: AppState,
    renderer_config: RendererConfig,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl EditorApp {
    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let stats = gpu.renderer.stats_2d();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx, stats);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let pointer_over_ui = self.egui_ctx.is_pointer_over_area();
        self.state.frame_input(pointer_over_ui);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.reset_stats_2d();
        gpu.renderer.backend_mut().begin_frame(view, CLEAR_COLOR);
        {
            let camera = *self.state.editor.camera();
            let tile_set = self.state.tile_set.and_then(|h| self.state.store.tile_set(h));
            let mut scene = gpu
                .renderer
                .begin_2d_with_transform(&camera.projection(), camera.transform());
            self.state.editor.render_canvas(&mut scene, tile_set);
            scene.end_scene();
        }
        let Some(view) = gpu.renderer.backend_mut().end_frame() else {
            return;
        };

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        let title = if self.state.editor.is_dirty() {
            "Tessera Tile Map Editor *"
        } else {
            "Tessera Tile Map Editor"
        };
        gpu.window.set_title(title);
        output.present();
    }
}

impl ApplicationHandler for EditorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(
            event_loop,
            &self.egui_ctx,
            &self.state.store,
            self.renderer_config,
        ) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state
                    .editor
                    .camera_mut()
                    .set_canvas_size(Vec2::new(size.width as f32, size.height as f32));
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        let always_handled = matches!(
            event,
            WindowEvent::CloseRequested
                | WindowEvent::Resized(_)
                | WindowEvent::RedrawRequested
                | WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput {
                    state: ElementState::Released,
                    ..
                }
        );
        if response.consumed && !always_handled {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if self.state.editor.is_dirty() {
                    tracing::warn!("closing with unsaved changes");
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size);
                self.state
                    .editor
                    .camera_mut()
                    .set_canvas_size(Vec2::new(size.width as f32, size.height as f32));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                let pointer = &mut self.state.pointer;
                if pointer.middle {
                    if let Some(last) = pointer.cursor {
                        pointer.pan_delta += position - last;
                    }
                }
                pointer.cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.pointer.cursor = None;
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                let pointer = &mut self.state.pointer;
                match button {
                    MouseButton::Left => pointer.primary = pressed,
                    MouseButton::Right => pointer.secondary = pressed,
                    MouseButton::Middle => pointer.middle = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.pointer.wheel += match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.api {
        GraphicsApi::Wgpu => {}
        GraphicsApi::Headless => bail!("the editor needs a window; use tessera-cli for headless rendering"),
        api => bail!("graphics api '{api}' is not implemented"),
    }

    let renderer_config = match &cli.config {
        Some(path) => RendererConfig::load(path)
            .with_context(|| format!("loading renderer config {}", path.display()))?,
        None => RendererConfig::default(),
    };
    renderer_config.validate()?;

    tracing::info!("tessera-editor starting");
    let state = AppState::load(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = EditorApp {
        state,
        renderer_config,
        gpu: None,
        egui_ctx: EguiContext::default(),
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}
