#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Result};
use log::{error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, HtmlCanvasElement, Response};

use crate::app::{display_size_changed, Viewer};
use crate::input::wasm::WasmInputHandler;
use crate::{InputState, Renderer, TextureImage, ViewerConfig};

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = wasm_logger::init(wasm_logger::Config::default());
}

/// Mounts the scene on the canvas with id `canvas_id`.
///
/// `texture_url` points at the PNG or JPEG ground texture. A checkerboard is
/// used when it is absent or cannot be fetched or decoded.
#[wasm_bindgen]
pub async fn mount(canvas_id: String, texture_url: Option<String>) -> Result<WasmApp, JsValue> {
    let canvas = find_canvas(&canvas_id).map_err(to_js)?;
    let (width, height) = display_size(&canvas);
    let (width, height) = (width.max(1), height.max(1));
    canvas.set_width(width);
    canvas.set_height(height);

    let ground = load_texture(texture_url.as_deref()).await;

    let config = ViewerConfig::default();
    let viewer = Viewer::new(&config, width, height).map_err(to_js)?;
    let renderer = Renderer::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        (width, height),
        &ground,
    )
    .await
    .map_err(to_js)?;

    let input = Arc::new(InputState::new());
    let input_handler = WasmInputHandler::attach(&canvas, Arc::clone(&input)).map_err(to_js)?;
    info!("mounted scene on #{canvas_id} at {width}x{height}");

    let state = AppState {
        canvas,
        renderer,
        viewer,
        input,
        _input_handler: input_handler,
    };
    Ok(WasmApp {
        inner: Rc::new(RefCell::new(state)),
        frame: Rc::new(FrameLoop::default()),
    })
}

#[wasm_bindgen]
pub struct WasmApp {
    inner: Rc<RefCell<AppState>>,
    frame: Rc<FrameLoop>,
}

#[wasm_bindgen]
impl WasmApp {
    /// Starts the per-frame loop. Calling it while running does nothing.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.frame.handle.get().is_some() {
            return Ok(());
        }
        schedule_animation_loop(Rc::clone(&self.inner), Rc::clone(&self.frame)).map_err(to_js)
    }

    /// Cancels the next scheduled frame.
    pub fn stop(&self) {
        self.frame.cancel();
    }

    #[wasm_bindgen(js_name = bouncePosition)]
    pub fn bounce_position(&self) -> f32 {
        self.inner.borrow().viewer.bounce_position()
    }
}

impl Drop for WasmApp {
    fn drop(&mut self) {
        self.frame.cancel();
        self.frame.callback.borrow_mut().take();
    }
}

/// The `requestAnimationFrame` callback and the id of its pending request.
#[derive(Default)]
struct FrameLoop {
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
    handle: Cell<Option<i32>>,
}

impl FrameLoop {
    fn request(&self, window: &web_sys::Window) -> Result<()> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| anyhow!("frame callback missing"))?;
        let id = window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))?;
        self.handle.set(Some(id));
        Ok(())
    }

    fn cancel(&self) {
        if let (Some(id), Some(window)) = (self.handle.take(), window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                error!("cancelAnimationFrame failed: {err:?}");
            }
        }
    }
}

struct AppState {
    canvas: HtmlCanvasElement,
    renderer: Renderer,
    viewer: Viewer,
    input: Arc<InputState>,
    _input_handler: WasmInputHandler,
}

impl AppState {
    fn render_frame(&mut self) -> Result<()> {
        if let Some((width, height)) =
            display_size_changed(self.renderer.size(), display_size(&self.canvas))
        {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            self.renderer.resize(width, height);
            self.viewer.set_viewport(width, height);
        }

        self.viewer.advance(&self.input);
        self.renderer
            .update_globals(&self.viewer.camera_params(), &self.viewer.light_params());
        self.renderer.draw(self.viewer.scene())
    }
}

fn schedule_animation_loop(app: Rc<RefCell<AppState>>, frame: Rc<FrameLoop>) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;

    if frame.callback.borrow().is_none() {
        let next = Rc::clone(&frame);
        let frame_window = window.clone();
        let closure = Closure::wrap(Box::new(move || {
            next.handle.set(None);
            if let Err(err) = app.borrow_mut().render_frame() {
                error!("frame failed: {err:?}");
                return;
            }
            if let Err(err) = next.request(&frame_window) {
                error!("{err:?}");
            }
        }) as Box<dyn FnMut()>);
        *frame.callback.borrow_mut() = Some(closure);
    }

    frame.request(&window)
}

async fn load_texture(url: Option<&str>) -> TextureImage {
    let Some(url) = url else {
        return TextureImage::decode_or_checker(None);
    };
    match fetch_bytes(url).await {
        Ok(bytes) => TextureImage::decode_or_checker(Some(bytes.as_slice())),
        Err(err) => {
            warn!("texture could not be fetched, using checkerboard: {err:?}");
            TextureImage::checker()
        }
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|err| anyhow!("request for {url} failed: {err:?}"))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| anyhow!("fetch for {url} did not return a Response"))?;
    ensure!(response.ok(), "{url} answered HTTP {}", response.status());
    let buffer = response
        .array_buffer()
        .map_err(|err| anyhow!("unable to read {url}: {err:?}"))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|err| anyhow!("unable to read {url}: {err:?}"))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn find_canvas(canvas_id: &str) -> Result<HtmlCanvasElement> {
    let document = window()
        .and_then(|window| window.document())
        .ok_or_else(|| anyhow!("document not available"))?;
    let element = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow!("canvas element '{canvas_id}' not found"))?;
    element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("element '{canvas_id}' is not a canvas"))
}

/// CSS size of the canvas in physical pixels.
fn display_size(canvas: &HtmlCanvasElement) -> (u32, u32) {
    let ratio = window().map_or(1.0, |window| window.device_pixel_ratio());
    let width = (f64::from(canvas.client_width()) * ratio).round() as u32;
    let height = (f64::from(canvas.client_height()) * ratio).round() as u32;
    (width, height)
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
