use super::assets::{ImageBank, PaletteBank};
use super::console::ConsoleState;
use super::driver::{FrameDriver, InitError};
use super::input::{Button, Player};

/// One console session: the guest-owned console state paired with the
/// frame driver bound at startup. Lives from `initialize` to `release`;
/// releasing consumes the value, so double-release and use-after-release
/// do not compile.
pub struct Session {
    state: ConsoleState,
    driver: Box<dyn FrameDriver>,
    ended: bool,
}

impl Session {
    /// Boots the bound driver with the two immutable stores and returns
    /// the session with a fully blank state. Backend resource
    /// acquisition failure is the single recoverable error.
    pub fn initialize(
        images: ImageBank,
        palettes: PaletteBank,
        mut driver: Box<dyn FrameDriver>,
    ) -> Result<Self, InitError> {
        driver.boot(&images, &palettes)?;
        Ok(Self {
            state: ConsoleState::new(),
            driver,
            ended: false,
        })
    }

    /// Presents the current state and returns whether the session should
    /// continue. A false return latches: the backend is not touched
    /// again and every later call returns false, leaving `release` as
    /// the guest's only useful next step.
    pub fn advance_frame(&mut self) -> bool {
        if self.ended {
            return false;
        }
        if !self.driver.advance(&self.state) {
            self.ended = true;
            return false;
        }
        true
    }

    pub fn time(&self) -> u64 {
        self.driver.time()
    }

    pub fn input(&self, player: Player, button: Button) -> bool {
        self.driver.input(player, button)
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConsoleState {
        &mut self.state
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    /// Tears down the driver and its backend resources. Consumes the
    /// session; there is nothing left to misuse afterwards.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::console::Tile;
    use crate::infrastructure::headless::HeadlessDriver;

    #[test]
    fn initialize_boots_with_a_blank_state() {
        let session = Session::initialize(
            ImageBank::blank(),
            PaletteBank::blank(),
            Box::new(HeadlessDriver::new()),
        )
        .expect("initialize");

        assert!(!session.ended());
        assert_eq!(session.state(), &ConsoleState::new());
        assert_eq!(session.time(), 0);
    }

    #[test]
    fn boot_failure_is_the_recoverable_error() {
        let result = Session::initialize(
            ImageBank::blank(),
            PaletteBank::blank(),
            Box::new(HeadlessDriver::new().fail_boot()),
        );

        assert!(matches!(result, Err(InitError::Backend(_))));
    }

    #[test]
    fn terminal_false_latches() {
        let mut session = Session::initialize(
            ImageBank::blank(),
            PaletteBank::blank(),
            Box::new(HeadlessDriver::with_frame_budget(2)),
        )
        .expect("initialize");

        assert!(session.advance_frame());
        assert!(session.advance_frame());
        assert!(!session.advance_frame());
        assert!(session.ended());
        // Latched: the driver is not consulted again.
        assert!(!session.advance_frame());
        session.release();
    }

    #[test]
    fn guest_state_survives_an_advance_unchanged() {
        let mut session = Session::initialize(
            ImageBank::blank(),
            PaletteBank::blank(),
            Box::new(HeadlessDriver::new()),
        )
        .expect("initialize");

        session.state_mut().set_tile(3, 2, Tile::new(42, 7));
        session.state_mut().set_pan(-4, 9);
        let before = session.state().clone();

        assert!(session.advance_frame());
        assert_eq!(session.state(), &before);
    }
}
