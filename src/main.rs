use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{info, warn};
use winit::{
    event::*,
    event_loop::EventLoop,
    window::{CursorGrabMode, Window},
};

use thirdperson::{
    logging, scene,
    config::Settings,
    controller::{self, CaptureRequest, DebugLines, FrameLoop, InputEvent, InputState, KinematicBody},
    model::ColliderRegistry,
};

const SETTINGS_ENV: &str = "THIRDPERSON_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "data/settings.ron";
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

struct App {
    window: Arc<Window>,
    input: InputState,
    frame_loop: FrameLoop<KinematicBody, DebugLines>,
    colliders: ColliderRegistry,
    last_frame_time: Instant,
    last_status: Instant,
}

impl App {
    fn new(window: Arc<Window>, settings: Settings) -> Self {
        let size = window.inner_size();

        let mut colliders = ColliderRegistry::new();
        scene::populate(&mut colliders);
        let body = KinematicBody::spawn(&mut colliders, scene::SPAWN_POINT, Vec3::splat(0.5));

        let input = InputState::with_release_key(settings.bindings.release_pointer.clone());
        let frame_loop = FrameLoop::with_diagnostics(body, &settings, size.width, size.height, DebugLines::new());

        Self {
            window,
            input,
            frame_loop,
            colliders,
            last_frame_time: Instant::now(),
            last_status: Instant::now(),
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        let converted = match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, logical_key, .. }, .. } => {
                controller::input::native::keyboard_to_input(logical_key, *state)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                Some(controller::input::native::mouse_button_to_input(*button, *state))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                Some(controller::input::native::mouse_wheel_to_input(*delta))
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            WindowEvent::Occluded(occluded) => Some(InputEvent::VisibilityChanged { visible: !occluded }),
            _ => None,
        };

        match converted {
            Some(input_event) => {
                self.input.process_event(&input_event);
                self.apply_capture_request();
                true
            }
            None => false,
        }
    }

    fn handle_mouse_motion(&mut self, delta: (f64, f64)) {
        self.input.process_event(&controller::input::native::mouse_motion_to_input(delta));
    }

    fn apply_capture_request(&mut self) {
        let locked = match self.input.take_capture_request() {
            Some(CaptureRequest::Engage) => {
                let grabbed = self
                    .window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(e) = grabbed {
                    warn!("cursor grab failed: {e}");
                    return;
                }
                self.window.set_cursor_visible(false);
                true
            }
            Some(CaptureRequest::Release) => {
                let _ = self.window.set_cursor_grab(CursorGrabMode::None);
                self.window.set_cursor_visible(true);
                false
            }
            None => return,
        };
        self.input.process_event(&InputEvent::PointerLockChanged { locked });
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.frame_loop.camera_mut().set_aspect(new_size.width, new_size.height);
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32().min(0.1);
        self.last_frame_time = now;

        let output = self.frame_loop.update(&mut self.input, &mut self.colliders, dt, |body, colliders, dt| {
            body.step(colliders, dt)
        });

        if let Some(out) = output {
            if now - self.last_status >= STATUS_INTERVAL {
                self.last_status = now;
                let grounded_rays = self.frame_loop.diagnostics().lines().iter().filter(|l| l.hit).count();
                info!(
                    position = ?out.character.position,
                    velocity = ?out.velocity,
                    grounded = out.character.grounded,
                    grounded_rays,
                    camera = ?out.camera_position,
                    "status"
                );
            }
        }
    }

    fn shutdown(&mut self) {
        self.frame_loop.detach();
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
    }
}

fn main() -> Result<()> {
    logging::init();

    let settings_path = env::var(SETTINGS_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load_or_default(&settings_path);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window_attributes = Window::default_attributes()
        .with_title("thirdperson")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes).context("failed to create window")?);

    let mut app = App::new(window.clone(), settings);
    info!("click to capture the mouse, WASD to move, space to jump, Escape to release");

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => {
                            app.shutdown();
                            elwt.exit();
                        }
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => {
                            app.update();
                        }
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    }).context("event loop failed")?;

    Ok(())
}
