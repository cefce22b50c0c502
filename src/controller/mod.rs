// CONTROLLER: input, ground probing, character and camera control, frame loop
pub mod input;
pub mod diagnostics;
pub mod ground_probe;
pub mod physics;
pub mod orbit_camera;
pub mod character_controller;
pub mod frame_loop;

pub use input::{CaptureRequest, InputEvent, InputProcessor, InputState, KeyBindings, MouseButton};
pub use diagnostics::{DebugLine, DebugLines, NoDiagnostics, ProbeDiagnostics};
pub use ground_probe::{GroundProbe, GroundProbeResult, ProbeSample};
pub use physics::{KinematicBody, PhysicsBody};
pub use orbit_camera::OrbitCamera;
pub use character_controller::CharacterController;
pub use frame_loop::{FrameLoop, FrameOutput};
