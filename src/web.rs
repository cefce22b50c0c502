//! Browser host: DOM listeners feeding [`InputState`], a
//! `requestAnimationFrame` loop driving the [`FrameLoop`], and teardown that
//! removes everything it registered.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec3;
use tracing::{error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use crate::config::Settings;
use crate::controller::input::{wasm as dom, CaptureRequest, InputEvent, InputProcessor, InputState};
use crate::controller::{FrameLoop, KinematicBody};
use crate::model::ColliderRegistry;
use crate::scene;

type Listener = Closure<dyn FnMut(Event)>;

/// DOM event listeners registered for one controller.
///
/// Dropping or detaching removes every listener, so a torn-down controller
/// stops receiving input.
pub struct InputListeners {
    registered: Vec<(EventTarget, &'static str, Listener)>,
}

impl InputListeners {
    pub fn attach(
        window: &Window,
        document: &Document,
        canvas: &HtmlCanvasElement,
        input: Rc<RefCell<InputState>>,
        processor: InputProcessor,
    ) -> Result<Self, JsValue> {
        let mut listeners = Self { registered: Vec::new() };

        // Capture changes are requested by InputState and carried out here
        let apply_capture = {
            let canvas = canvas.clone();
            let document = document.clone();
            let input = input.clone();
            Rc::new(move || {
                let request = input.borrow_mut().take_capture_request();
                match request {
                    Some(CaptureRequest::Engage) => canvas.request_pointer_lock(),
                    Some(CaptureRequest::Release) => document.exit_pointer_lock(),
                    None => {}
                }
            })
        };

        {
            let input = input.clone();
            let apply_capture = apply_capture.clone();
            listeners.listen(document, "keydown", move |e| {
                let e = e.unchecked_ref::<KeyboardEvent>();
                let key = e.key();
                let b = processor.bindings();
                if [&b.forward, &b.backward, &b.left, &b.right, &b.jump]
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(&key))
                    || key.starts_with("Arrow")
                {
                    e.prevent_default();
                }
                input.borrow_mut().process_event(&dom::keyboard_event_to_input(e, true));
                (*apply_capture)();
            })?;
        }
        {
            let input = input.clone();
            listeners.listen(document, "keyup", move |e| {
                let e = e.unchecked_ref::<KeyboardEvent>();
                input.borrow_mut().process_event(&dom::keyboard_event_to_input(e, false));
            })?;
        }
        {
            let input = input.clone();
            listeners.listen(window, "blur", move |_| {
                input.borrow_mut().process_event(&InputEvent::FocusLost);
            })?;
        }
        {
            let input = input.clone();
            let doc = document.clone();
            listeners.listen(document, "visibilitychange", move |_| {
                input.borrow_mut().process_event(&InputEvent::VisibilityChanged { visible: !doc.hidden() });
            })?;
        }
        {
            let input = input.clone();
            let doc = document.clone();
            listeners.listen(document, "pointerlockchange", move |_| {
                let locked = doc.pointer_lock_element().is_some();
                input.borrow_mut().process_event(&InputEvent::PointerLockChanged { locked });
            })?;
        }
        {
            let input = input.clone();
            let apply_capture = apply_capture.clone();
            listeners.listen(canvas, "mousedown", move |e| {
                let e = e.unchecked_ref::<MouseEvent>();
                input.borrow_mut().process_event(&dom::mouse_button_to_input(e, true));
                (*apply_capture)();
                e.prevent_default();
            })?;
        }
        {
            let input = input.clone();
            listeners.listen(document, "mouseup", move |e| {
                let e = e.unchecked_ref::<MouseEvent>();
                input.borrow_mut().process_event(&dom::mouse_button_to_input(e, false));
            })?;
        }
        {
            let input = input.clone();
            listeners.listen(document, "mousemove", move |e| {
                let e = e.unchecked_ref::<MouseEvent>();
                input.borrow_mut().process_event(&dom::mouse_move_to_input(e));
            })?;
        }
        {
            let input = input.clone();
            listeners.listen(canvas, "wheel", move |e| {
                let e = e.unchecked_ref::<WheelEvent>();
                input.borrow_mut().process_event(&dom::mouse_wheel_to_input(e));
                e.prevent_default();
            })?;
        }
        listeners.listen(canvas, "contextmenu", |e| e.prevent_default())?;

        Ok(listeners)
    }

    fn listen(
        &mut self,
        target: &EventTarget,
        name: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        self.registered.push((target.clone(), name, closure));
        Ok(())
    }

    pub fn detach(&mut self) {
        for (target, name, closure) in self.registered.drain(..) {
            if let Err(e) = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
                error!(event = name, "failed to remove listener: {e:?}");
            }
        }
    }
}

impl Drop for InputListeners {
    fn drop(&mut self) {
        self.detach();
    }
}

/// `requestAnimationFrame` loop that can be cancelled.
struct AnimationLoop {
    window: Window,
    handle: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl AnimationLoop {
    fn start(window: Window, mut frame: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let handle = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

        let next = callback.clone();
        let next_handle = handle.clone();
        let win = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            frame();

            // Schedule the next frame
            if let Some(cb) = next.borrow().as_ref() {
                match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    Ok(id) => next_handle.set(Some(id)),
                    Err(e) => error!("requestAnimationFrame failed: {e:?}"),
                }
            }
        }) as Box<dyn FnMut()>));

        let id = match callback.borrow().as_ref() {
            Some(cb) => window.request_animation_frame(cb.as_ref().unchecked_ref())?,
            None => return Err(js_error("animation callback missing")),
        };
        handle.set(Some(id));

        Ok(Self { window, handle, callback })
    }

    fn stop(&mut self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        // breaks the closure's reference to itself
        self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything a running browser controller owns.
pub struct WebHost {
    frame_loop: Rc<RefCell<FrameLoop<KinematicBody>>>,
    listeners: InputListeners,
    animation: AnimationLoop,
}

impl WebHost {
    pub fn start(window: Window, document: &Document, canvas: &HtmlCanvasElement, settings: Settings) -> Result<Self, JsValue> {
        let mut registry = ColliderRegistry::new();
        scene::populate(&mut registry);
        let body = KinematicBody::spawn(&mut registry, scene::SPAWN_POINT, Vec3::splat(0.5));

        let frame_loop = Rc::new(RefCell::new(FrameLoop::new(body, &settings, canvas.width(), canvas.height())));
        let input = Rc::new(RefCell::new(InputState::with_release_key(settings.bindings.release_pointer.clone())));
        let listeners = InputListeners::attach(
            &window,
            document,
            canvas,
            input.clone(),
            InputProcessor::new(settings.bindings.clone()),
        )?;

        let performance = window.performance();
        let last_time = Cell::new(performance.as_ref().map(|p| p.now()).unwrap_or(0.0));
        let registry = RefCell::new(registry);
        let animation = {
            let frame_loop = frame_loop.clone();
            AnimationLoop::start(window, move || {
                let now = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
                let dt = ((now - last_time.replace(now)) / 1000.0).clamp(0.0, 0.1) as f32;
                frame_loop.borrow_mut().update(
                    &mut input.borrow_mut(),
                    &mut *registry.borrow_mut(),
                    dt,
                    |body, registry, dt| body.step(registry, dt),
                );
            })?
        };

        info!("controller attached");
        Ok(Self { frame_loop, listeners, animation })
    }

    /// Remove listeners, stop the animation loop and clear diagnostics.
    pub fn detach(mut self) {
        self.animation.stop();
        self.listeners.detach();
        self.frame_loop.borrow_mut().detach();
        info!("controller detached");
    }
}

pub fn init_canvas(width: u32, height: u32) -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;
    canvas.set_width(width);
    canvas.set_height(height);
    body.append_child(&canvas)?;
    Ok((window, document, canvas))
}

fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}
