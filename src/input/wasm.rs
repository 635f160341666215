use std::sync::Arc;

use anyhow::{anyhow, Result};
use glam::Vec2;
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::{InputState, KeyCode, MouseButton};

/// Handles DOM input events and updates the shared [`InputState`].
pub struct WasmInputHandler {
    listeners: Vec<EventListener>,
}

impl WasmInputHandler {
    pub fn attach(canvas: &HtmlCanvasElement, input: Arc<InputState>) -> Result<Self> {
        let window = window().ok_or_else(|| anyhow!("window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("document not available"))?;

        let mut listeners = Vec::new();

        // Keys are captured on the document so the canvas does not need focus.
        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_name(&event.key()) {
                    event.prevent_default();
                    input_state.set_key_down(code);
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&document, "keyup", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if let Some(code) = KeyCode::from_name(&event.key()) {
                    input_state.set_key_up(code);
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mousedown", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                input_state.set_mouse_position(offset_of(event));
                input_state.set_mouse_button_down(MouseButton::new(event.button() as u8));
            }));
        }

        // Released on the window so a drag that leaves the canvas still ends.
        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&window, "mouseup", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                input_state.set_mouse_button_up(MouseButton::new(event.button() as u8));
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mousemove", move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                input_state.set_mouse_position(offset_of(event));
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new_with_options(
                canvas,
                "wheel",
                EventListenerOptions::enable_prevent_default(),
                move |event| {
                    let Some(event) = event.dyn_ref::<WheelEvent>() else {
                        return;
                    };
                    event.prevent_default();
                    let delta = event.delta_y();
                    if delta != 0.0 {
                        input_state.add_wheel_delta(delta.signum() as f32);
                    }
                },
            ));
        }

        listeners.push(EventListener::new_with_options(
            canvas,
            "contextmenu",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        ));

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(&window, "blur", move |_| {
                input_state.release_all();
            }));
        }

        Ok(Self { listeners })
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        self.listeners.clear();
    }
}

/// Pointer position in drawing-buffer pixels, the space the viewport is measured in.
fn offset_of(event: &MouseEvent) -> Vec2 {
    let ratio = window().map_or(1.0, |window| window.device_pixel_ratio()) as f32;
    Vec2::new(event.offset_x() as f32, event.offset_y() as f32) * ratio
}
