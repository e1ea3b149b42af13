use std::collections::VecDeque;

use crate::domain::{Button, ConsoleState, FrameDriver, ImageBank, InitError, InputState, PaletteBank, Player};

/// Fixed clock step per frame advance, matching the windowed driver's
/// 60 Hz target to the millisecond.
pub const HEADLESS_FRAME_MS: u64 = 16;

/// A sample the deterministic driver serves for one frame advance: the
/// continue flag plus the input snapshot taken "during" that advance.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameSample {
    pub proceed: bool,
    pub input: InputState,
}

/// Windowless frame driver with a deterministic clock. Scripted frames
/// are served first; once the script runs dry, advances succeed until
/// the optional frame budget is exhausted. Used by the headless CLI mode
/// and as the mock backend for every core test.
#[derive(Debug, Default)]
pub struct HeadlessDriver {
    frames: u64,
    frame_budget: Option<u64>,
    script: VecDeque<FrameSample>,
    input: InputState,
    fail_boot: bool,
}

impl HeadlessDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances succeed for `frames` frames, then report the terminal
    /// false.
    pub fn with_frame_budget(frames: u64) -> Self {
        Self {
            frame_budget: Some(frames),
            ..Self::default()
        }
    }

    /// Queues one scripted frame. Scripted frames are consumed before
    /// the budget applies.
    pub fn push_frame(&mut self, proceed: bool, input: InputState) {
        self.script.push_back(FrameSample { proceed, input });
    }

    /// Makes boot fail, to exercise the one recoverable error path.
    pub fn fail_boot(mut self) -> Self {
        self.fail_boot = true;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameDriver for HeadlessDriver {
    fn boot(&mut self, _images: &ImageBank, _palettes: &PaletteBank) -> Result<(), InitError> {
        if self.fail_boot {
            return Err(InitError::Backend(
                "headless backend scripted to refuse boot".into(),
            ));
        }
        Ok(())
    }

    fn advance(&mut self, _state: &ConsoleState) -> bool {
        self.frames += 1;
        if let Some(sample) = self.script.pop_front() {
            self.input = sample.input;
            return sample.proceed;
        }
        match self.frame_budget {
            Some(budget) => self.frames <= budget,
            None => true,
        }
    }

    fn time(&self) -> u64 {
        self.frames * HEADLESS_FRAME_MS
    }

    fn input(&self, player: Player, button: Button) -> bool {
        self.input.is_held(player, button)
    }
}
