use glam::Vec3;

/// Receiver for per-frame debug geometry.
///
/// Every frame the ground probe clears what it drew last frame and then adds
/// one line per ray, so implementations never accumulate more than a frame's
/// worth of artifacts.
pub trait ProbeDiagnostics {
    fn clear(&mut self);
    fn add_line(&mut self, from: Vec3, to: Vec3, hit: bool);
}

/// Default hook: draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl ProbeDiagnostics for NoDiagnostics {
    fn clear(&mut self) {}
    fn add_line(&mut self, _from: Vec3, _to: Vec3, _hit: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugLine {
    pub from: Vec3,
    pub to: Vec3,
    pub hit: bool,
}

/// Keeps the current frame's lines in memory for a renderer to pick up.
#[derive(Debug, Default, Clone)]
pub struct DebugLines {
    lines: Vec<DebugLine>,
}

impl DebugLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[DebugLine] {
        &self.lines
    }
}

impl ProbeDiagnostics for DebugLines {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn add_line(&mut self, from: Vec3, to: Vec3, hit: bool) {
        self.lines.push(DebugLine { from, to, hit });
    }
}
