use crate::domain::FrameDriver;
use crate::infrastructure::headless::HeadlessDriver;
use crate::interface::gui::WindowDriver;

/// Which backend the five-operation surface binds to for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Presented window with real input devices.
    Window,
    /// Deterministic windowless backend; `frame_budget` frames succeed
    /// before the terminal false (None runs unbounded).
    Headless { frame_budget: Option<u64> },
}

/// The binding step: resolves the session's driver to a runtime-selected
/// backend. Kept apart from the core so the core only ever sees the
/// `FrameDriver` trait; backend resource acquisition happens later, at
/// `Session::initialize`, which is the contract's one recoverable error
/// point.
pub fn bind(kind: BackendKind) -> Box<dyn FrameDriver> {
    match kind {
        BackendKind::Window => Box::new(WindowDriver::new()),
        BackendKind::Headless { frame_budget } => Box::new(match frame_budget {
            Some(frames) => HeadlessDriver::with_frame_budget(frames),
            None => HeadlessDriver::new(),
        }),
    }
}
