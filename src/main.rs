#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = native::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::any::Any;
    use std::fmt;
    use std::panic::{self, AssertUnwindSafe};
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::{anyhow, Context, Result};
    use glam::Vec2;
    use log::info;
    use pollster::block_on;
    use winit::application::ApplicationHandler;
    use winit::dpi::LogicalSize;
    use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
    use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
    use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
    use winit::window::{Window, WindowId};

    use canvas_scene::app::{display_size_changed, print_final_state, print_scene_summary};
    use canvas_scene::{
        InputState, KeyCode, MouseButton, Renderer, TextureImage, Viewer, ViewerConfig,
    };

    const WINDOW_WIDTH: u32 = 1280;
    const WINDOW_HEIGHT: u32 = 720;

    pub fn run() -> Result<()> {
        let options = CliOptions::parse(std::env::args().skip(1))?;
        let mut config = match &options.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("failed to load configuration {path}"))?,
            None => ViewerConfig::default(),
        };
        if let Some(texture) = &options.texture {
            config.texture = Some(PathBuf::from(texture));
        }

        let viewer = Viewer::new(&config, WINDOW_WIDTH, WINDOW_HEIGHT)?;
        print_scene_summary(viewer.scene());
        let ground = TextureImage::open_or_checker(config.texture.as_deref());
        info!("ground texture is {}x{}", ground.width, ground.height);

        if options.summary_only {
            run_headless(viewer, options.frames.unwrap_or(0))
        } else {
            match run_interactive(&config, ground, options.frames) {
                Ok(()) => Ok(()),
                Err(err) => {
                    if err.downcast_ref::<WindowInitError>().is_some() {
                        eprintln!(
                            "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                        );
                        run_headless(viewer, options.frames.unwrap_or(0))
                    } else {
                        Err(err)
                    }
                }
            }
        }
    }

    fn run_headless(mut viewer: Viewer, frames: u32) -> Result<()> {
        let input = InputState::new();
        for _ in 0..frames {
            viewer.advance(&input);
        }
        print_final_state(viewer.scene());
        Ok(())
    }

    fn run_interactive(
        config: &ViewerConfig,
        ground: TextureImage,
        frame_limit: Option<u32>,
    ) -> Result<()> {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
        panic::set_hook(default_hook);
        let event_loop = event_loop
            .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
            .map_err(|err| WindowInitError::from_error("event loop", err))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            config: config.clone(),
            ground,
            input: Arc::new(InputState::new()),
            frame_limit,
            state: None,
            last_error: None,
        };
        event_loop
            .run_app(&mut app)
            .context("event loop terminated abnormally")?;

        app.shutdown();

        if let Some(err) = app.last_error {
            return Err(err);
        }
        Ok(())
    }

    struct App {
        config: ViewerConfig,
        ground: TextureImage,
        input: Arc<InputState>,
        frame_limit: Option<u32>,
        state: Option<WindowState>,
        last_error: Option<anyhow::Error>,
    }

    struct WindowState {
        window: Arc<Window>,
        renderer: Renderer,
        viewer: Viewer,
    }

    impl App {
        fn create_state(&self, event_loop: &ActiveEventLoop) -> Result<WindowState> {
            let attributes = Window::default_attributes()
                .with_title("Canvas Scene")
                .with_inner_size(LogicalSize::new(WINDOW_WIDTH as f64, WINDOW_HEIGHT as f64));
            let window = Arc::new(
                event_loop
                    .create_window(attributes)
                    .map_err(|err| WindowInitError::from_error("window", err))?,
            );
            let size = window.inner_size();
            let (width, height) = (size.width.max(1), size.height.max(1));
            let renderer = block_on(Renderer::new(
                Arc::clone(&window),
                (width, height),
                &self.ground,
            ))?;
            let viewer = Viewer::new(&self.config, width, height)?;
            info!("window ready at {width}x{height}");
            Ok(WindowState {
                window,
                renderer,
                viewer,
            })
        }

        fn render_frame(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
            let Some(state) = self.state.as_mut() else {
                return Ok(());
            };

            let size = state.window.inner_size();
            if let Some((width, height)) =
                display_size_changed(state.renderer.size(), (size.width, size.height))
            {
                state.renderer.resize(width, height);
                state.viewer.set_viewport(width, height);
            }

            state.viewer.advance(&self.input);
            state
                .renderer
                .update_globals(&state.viewer.camera_params(), &state.viewer.light_params());
            state.renderer.draw(state.viewer.scene())?;

            if let Some(limit) = self.frame_limit {
                if state.viewer.frames() >= u64::from(limit) {
                    event_loop.exit();
                }
            }
            Ok(())
        }

        fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
            self.last_error = Some(err);
            event_loop.exit();
        }

        fn shutdown(&self) {
            if let Some(state) = &self.state {
                print_final_state(state.viewer.scene());
            }
        }
    }

    impl ApplicationHandler for App {
        fn resumed(&mut self, event_loop: &ActiveEventLoop) {
            if self.state.is_some() {
                return;
            }
            match self.create_state(event_loop) {
                Ok(state) => {
                    state.window.request_redraw();
                    self.state = Some(state);
                }
                Err(err) => self.fail(event_loop, err),
            }
        }

        fn window_event(
            &mut self,
            event_loop: &ActiveEventLoop,
            _window_id: WindowId,
            event: WindowEvent,
        ) {
            match event {
                WindowEvent::CloseRequested => event_loop.exit(),
                WindowEvent::Focused(false) => self.input.release_all(),
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    let Some(key) = map_keycode(code) else {
                        return;
                    };
                    match event.state {
                        ElementState::Pressed => self.input.set_key_down(key),
                        ElementState::Released => self.input.set_key_up(key),
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    let button = map_mouse_button(button);
                    match state {
                        ElementState::Pressed => self.input.set_mouse_button_down(button),
                        ElementState::Released => self.input.set_mouse_button_up(button),
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    self.input
                        .set_mouse_position(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    // Scrolling toward the user zooms out, as in the browser.
                    let amount = match delta {
                        MouseScrollDelta::LineDelta(_, y) => -y,
                        MouseScrollDelta::PixelDelta(position) => -(position.y as f32) / 100.0,
                    };
                    if amount != 0.0 {
                        self.input.add_wheel_delta(amount);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if let Err(err) = self.render_frame(event_loop) {
                        self.fail(event_loop, err);
                    }
                }
                _ => {}
            }
        }

        fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
            if let Some(state) = &self.state {
                state.window.request_redraw();
            }
        }
    }

    fn map_keycode(code: WinitKeyCode) -> Option<KeyCode> {
        Some(match code {
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            _ => return None,
        })
    }

    fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
        match button {
            WinitMouseButton::Left => MouseButton::LEFT,
            WinitMouseButton::Middle => MouseButton::MIDDLE,
            WinitMouseButton::Right => MouseButton::RIGHT,
            WinitMouseButton::Back => MouseButton::new(3),
            WinitMouseButton::Forward => MouseButton::new(4),
            WinitMouseButton::Other(value) => MouseButton::new(value.min(u8::MAX as u16) as u8),
        }
    }

    #[derive(Debug)]
    struct WindowInitError {
        message: String,
    }

    impl WindowInitError {
        fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {}", panic_message(panic)),
            }
        }

        fn from_error(stage: &str, err: impl fmt::Display) -> Self {
            Self {
                message: format!("failed to initialize {stage}: {err}"),
            }
        }
    }

    impl fmt::Display for WindowInitError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl std::error::Error for WindowInitError {}

    fn panic_message(panic: Box<dyn Any + Send>) -> String {
        match panic.downcast::<String>() {
            Ok(msg) => *msg,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(msg) => (*msg).to_string(),
                Err(_) => "unknown panic".into(),
            },
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct CliOptions {
        config: Option<String>,
        texture: Option<String>,
        summary_only: bool,
        frames: Option<u32>,
    }

    const USAGE: &str =
        "Usage: canvas-scene [--config <file.xml>] [--texture <image>] [--summary-only] [--frames <n>]";

    impl CliOptions {
        fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
            let mut options = Self::default();
            let mut args = args.into_iter();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--config" => options.config = Some(value_of(&mut args, "--config")?),
                    "--texture" => options.texture = Some(value_of(&mut args, "--texture")?),
                    "--summary-only" => options.summary_only = true,
                    "--frames" => {
                        let value = value_of(&mut args, "--frames")?;
                        let frames = value
                            .parse()
                            .with_context(|| format!("invalid frame count '{value}'"))?;
                        options.frames = Some(frames);
                    }
                    "--help" | "-h" => return Err(anyhow!(USAGE)),
                    other => {
                        return Err(anyhow!(
                            "Unknown argument: {other}. Expected --config, --texture, --summary-only or --frames\n{USAGE}"
                        ));
                    }
                }
            }
            Ok(options)
        }
    }

    fn value_of(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
        args.next()
            .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
    }

}
