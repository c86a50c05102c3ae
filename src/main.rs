//! Beatslide - A metronome that flips through images on every beat
//!
//! Each tick plays a short click, flashes the beat indicator and advances
//! the slideshow to the next image, resized off the UI thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use env_logger::{Builder, Env};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, ModifiersState, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use beatslide::app::Controller;
use beatslide::audio::ToneOutput;
use beatslide::cli::Args;
use beatslide::events::{EventSink, UserEvent};
use beatslide::params::{display_constants, tempo_constants, RenderConfig, SoundKind};
use beatslide::rendering::RenderSystem;
use beatslide::resize::{ResizeOutcome, ResizeWorker};
use beatslide::scheduler::Tick;
use beatslide::settings::DisplayControls;
use beatslide::slideshow::collect_image_sources;

/// Posts helper-thread events into the winit loop
#[derive(Clone)]
struct UiProxy(EventLoopProxy<UserEvent>);

impl EventSink<Tick> for UiProxy {
    fn send(&self, event: Tick) -> bool {
        self.0.send_event(UserEvent::Tick(event)).is_ok()
    }
}

impl EventSink<ResizeOutcome> for UiProxy {
    fn send(&self, event: ResizeOutcome) -> bool {
        self.0.send_event(UserEvent::ImageReady(event)).is_ok()
    }
}

type AppController = Controller<ToneOutput, ResizeWorker, UiProxy>;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    render_config: RenderConfig,

    // Metronome, slideshow and audio
    controller: AppController,

    // Raw control values behind the display config
    controls: DisplayControls,
    modifiers: ModifiersState,

    // Startup inputs, consumed once the window exists
    initial_images: Vec<PathBuf>,
    start_on_launch: bool,

    // Files from the current drop gesture
    dropped: Vec<PathBuf>,

    // Indicator state as last drawn
    drawn_lit: bool,
}

impl App {
    fn new(args: &Args, controller: AppController) -> Self {
        Self {
            window: None,
            render_system: None,
            render_config: args.render_config(),
            controller,
            controls: args.display_controls(),
            modifiers: ModifiersState::empty(),
            initial_images: args.images.clone(),
            start_on_launch: args.start,
            dropped: Vec::new(),
            drawn_lit: false,
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let fullscreen = self
            .render_config
            .fullscreen
            .then_some(Fullscreen::Borderless(None));
        let window_attributes = Window::default_attributes()
            .with_title("Beatslide")
            .with_fullscreen(fullscreen)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize rendering system
        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.render_config.clone(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                log::error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        self.window = Some(window);
        self.render_system = Some(render_system);

        // Images are requested only once there is a surface to show them on
        let paths = std::mem::take(&mut self.initial_images);
        if !paths.is_empty() {
            self.load_paths(&paths);
        }

        if self.start_on_launch {
            self.toggle_playback();
        }

        log::info!("Beatslide is running (Space start/stop, Esc quit)");
        self.update_title();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
                self.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::DroppedFile(path) => {
                self.dropped.push(path);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key, repeat),
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Tick(tick) => {
                if self.controller.on_tick(tick, Instant::now()) {
                    self.request_redraw();
                }
            }
            UserEvent::ImageReady(outcome) => {
                let Some(blob) = self.controller.on_image_ready(outcome) else {
                    return;
                };
                if let Some(render_system) = &mut self.render_system {
                    if let Err(e) = render_system.upload_image(blob) {
                        log::error!("Failed to display image: {}", e);
                    }
                }
                self.request_redraw();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // All files from one drop gesture arrive before the loop goes idle
        if !self.dropped.is_empty() {
            let paths = std::mem::take(&mut self.dropped);
            self.load_paths(&paths);
        }

        let indicator = self.controller.state().indicator();
        let lit = indicator.is_lit(Instant::now());
        if lit != self.drawn_lit {
            self.request_redraw();
        }

        match indicator.off_at() {
            Some(off_at) if lit => event_loop.set_control_flow(ControlFlow::WaitUntil(off_at)),
            _ => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

impl App {
    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, repeat: bool) {
        let bpm_step = if self.modifiers.shift_key() {
            tempo_constants::COARSE_BPM_STEP as i64
        } else {
            1
        };
        let dimension_step = display_constants::DIMENSION_STEP as i64;

        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space if !repeat => self.toggle_playback(),
            KeyCode::ArrowUp => self.adjust_bpm(bpm_step),
            KeyCode::ArrowDown => self.adjust_bpm(-bpm_step),
            KeyCode::Digit1 => self.controller.set_sound(SoundKind::Beep),
            KeyCode::Digit2 => self.controller.set_sound(SoundKind::Woodblock),
            KeyCode::Digit3 => self.controller.set_sound(SoundKind::Cowbell),
            KeyCode::KeyS if !repeat => {
                let next = self.controller.state().playback().selected_sound.next();
                self.controller.set_sound(next);
            }
            KeyCode::KeyA if !repeat => {
                self.controls.cycle_aspect();
                self.apply_controls();
            }
            KeyCode::ArrowLeft => {
                self.controls.adjust_max_width(-dimension_step);
                self.apply_controls();
            }
            KeyCode::ArrowRight => {
                self.controls.adjust_max_width(dimension_step);
                self.apply_controls();
            }
            KeyCode::PageDown => {
                self.controls.adjust_max_height(-dimension_step);
                self.apply_controls();
            }
            KeyCode::PageUp => {
                self.controls.adjust_max_height(dimension_step);
                self.apply_controls();
            }
            KeyCode::BracketLeft => {
                self.controls.adjust_custom_width(-1);
                self.apply_controls();
            }
            KeyCode::BracketRight => {
                self.controls.adjust_custom_width(1);
                self.apply_controls();
            }
            KeyCode::Minus => {
                self.controls.adjust_custom_height(-1);
                self.apply_controls();
            }
            KeyCode::Equal => {
                self.controls.adjust_custom_height(1);
                self.apply_controls();
            }
            KeyCode::Enter | KeyCode::NumpadEnter if !repeat => self.apply_controls(),
            KeyCode::KeyF | KeyCode::F11 if !repeat => self.toggle_fullscreen(),
            _ => return,
        }

        self.update_title();
    }

    /// Push the control values into the display config and re-render
    fn apply_controls(&mut self) {
        self.controller.apply_display(self.controls.to_config());
        self.request_redraw();
    }

    fn toggle_playback(&mut self) {
        if let Err(e) = self.controller.toggle() {
            log::error!("Failed to start metronome: {}", e);
        }
    }

    fn adjust_bpm(&mut self, delta: i64) {
        if let Err(e) = self.controller.adjust_bpm(delta) {
            log::error!("Failed to change tempo: {}", e);
        }
    }

    fn toggle_fullscreen(&self) {
        if let Some(window) = &self.window {
            let fullscreen = match window.fullscreen() {
                Some(_) => None,
                None => Some(Fullscreen::Borderless(None)),
            };
            window.set_fullscreen(fullscreen);
        }
    }

    /// Replace the image set with whatever images `paths` contain
    fn load_paths(&mut self, paths: &[PathBuf]) {
        match collect_image_sources(paths) {
            Ok(images) if images.is_empty() => {
                log::warn!("No images found in {} path(s)", paths.len());
            }
            Ok(images) => self.controller.load_images(images),
            Err(e) => log::error!("Failed to load images: {}", e),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };

        let playback = self.controller.state().playback();
        let run_state = if playback.is_playing { "playing" } else { "stopped" };
        let mut title = format!(
            "Beatslide | {} BPM | {} | {} | {} {}x{}",
            playback.bpm,
            playback.selected_sound,
            run_state,
            self.controls.aspect_label(),
            self.controls.max_width,
            self.controls.max_height,
        );
        if !self.controller.tone_player().is_available() {
            title.push_str(" (no audio)");
        }
        window.set_title(&title);
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(render_system) = &mut self.render_system else {
            return;
        };

        let state = self.controller.state();
        let lit = state.indicator().is_lit(Instant::now());

        match render_system.render(state.display(), lit) {
            Ok(()) => self.drawn_lit = lit,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
                self.request_redraw();
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }
    }
}

/// Setup and configure the logger
fn setup_logger() {
    // Override with `RUST_LOG`, e.g. `RUST_LOG=debug`
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(());
}

fn main() {
    setup_logger();
    let args = Args::parse();

    let event_loop = match EventLoop::<UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            return;
        }
    };
    let proxy = UiProxy(event_loop.create_proxy());

    let resizer = match ResizeWorker::spawn(proxy.clone()) {
        Ok(resizer) => resizer,
        Err(e) => {
            log::error!("Failed to start resize worker: {}", e);
            return;
        }
    };
    let tone = ToneOutput::open(args.recording_config().as_ref());
    let controller = Controller::new(
        args.playback_state(),
        args.display_controls().to_config(),
        tone,
        resizer,
        proxy,
    );

    let mut app = App::new(&args, controller);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
    }
}
