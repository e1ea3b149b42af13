use super::assets::{ImageBank, PaletteBank};
use super::console::ConsoleState;
use super::input::{Button, Player};

/// Resource acquisition failed while booting a backend. This is the only
/// recoverable error in the session contract; everything after a
/// successful initialize either works or ends the session through a
/// frame advance returning false.
#[derive(Debug)]
pub enum InitError {
    Backend(String),
}

/// The host-side surface a session drives. One implementation per
/// backend: the windowed driver presents frames and samples real
/// devices, the headless driver substitutes a deterministic clock and
/// scripted samples.
pub trait FrameDriver {
    /// Binds backend resources and takes a copy of the immutable stores.
    /// Called exactly once, before any other method.
    fn boot(&mut self, images: &ImageBank, palettes: &PaletteBank) -> Result<(), InitError>;

    /// The per-frame synchronization point: rasterize and present the
    /// given state, sample input devices for subsequent `input` calls,
    /// advance the time source, and block for frame pacing. Returns
    /// whether the session should continue; false is terminal.
    ///
    /// The state is read-only here: guest draw data is never mutated by
    /// the host.
    fn advance(&mut self, state: &ConsoleState) -> bool;

    /// Monotonically non-decreasing counter, milliseconds since boot.
    fn time(&self) -> u64;

    /// Held-state of one button for one player, as sampled during the
    /// most recent `advance`. All-false before the first advance.
    fn input(&self, player: Player, button: Button) -> bool;
}
