pub const PLAYER_COUNT: usize = 4;
pub const BUTTON_COUNT: usize = 11;

/// One of the four fixed player slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Alpha,
    Bravo,
    Charlie,
    Delta,
}

impl Player {
    pub const ALL: [Player; PLAYER_COUNT] =
        [Player::Alpha, Player::Bravo, Player::Charlie, Player::Delta];

    pub fn index(self) -> usize {
        match self {
            Player::Alpha => 0,
            Player::Bravo => 1,
            Player::Charlie => 2,
            Player::Delta => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Player> {
        Self::ALL.get(index).copied()
    }
}

/// The eleven button identities: four directional, four face, two
/// triggers, one menu button. The core reports held-state only; edge
/// detection is the guest's job, by diffing successive queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    DirUp,
    DirRight,
    DirDown,
    DirLeft,

    FaceUp,
    FaceRight,
    FaceDown,
    FaceLeft,

    TriggerLeft,
    TriggerRight,

    Menu,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::DirUp,
        Button::DirRight,
        Button::DirDown,
        Button::DirLeft,
        Button::FaceUp,
        Button::FaceRight,
        Button::FaceDown,
        Button::FaceLeft,
        Button::TriggerLeft,
        Button::TriggerRight,
        Button::Menu,
    ];

    pub fn index(self) -> usize {
        match self {
            Button::DirUp => 0,
            Button::DirRight => 1,
            Button::DirDown => 2,
            Button::DirLeft => 3,
            Button::FaceUp => 4,
            Button::FaceRight => 5,
            Button::FaceDown => 6,
            Button::FaceLeft => 7,
            Button::TriggerLeft => 8,
            Button::TriggerRight => 9,
            Button::Menu => 10,
        }
    }
}

/// The input sample taken during a frame advance. Starts all-false, so
/// queries issued before the first advance read the documented default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputState {
    held: [[bool; BUTTON_COUNT]; PLAYER_COUNT],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, player: Player, button: Button) -> bool {
        self.held[player.index()][button.index()]
    }

    pub fn set_held(&mut self, player: Player, button: Button, held: bool) {
        self.held[player.index()][button.index()] = held;
    }

    /// OR-merges another sample into this one, so multiple input sources
    /// (keyboard, gamepads) can contribute to the same players.
    pub fn merge(&mut self, other: &InputState) {
        for player in 0..PLAYER_COUNT {
            for button in 0..BUTTON_COUNT {
                self.held[player][button] |= other.held[player][button];
            }
        }
    }

    pub fn clear(&mut self) {
        self.held = [[false; BUTTON_COUNT]; PLAYER_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_reads_false_everywhere() {
        let input = InputState::new();
        for player in Player::ALL {
            for button in Button::ALL {
                assert!(!input.is_held(player, button));
            }
        }
    }

    #[test]
    fn set_and_query_single_button() {
        let mut input = InputState::new();
        input.set_held(Player::Charlie, Button::TriggerRight, true);

        assert!(input.is_held(Player::Charlie, Button::TriggerRight));
        assert!(!input.is_held(Player::Charlie, Button::TriggerLeft));
        assert!(!input.is_held(Player::Delta, Button::TriggerRight));
    }

    #[test]
    fn merge_is_an_or_over_sources() {
        let mut keyboard = InputState::new();
        keyboard.set_held(Player::Alpha, Button::DirUp, true);
        let mut gamepad = InputState::new();
        gamepad.set_held(Player::Alpha, Button::FaceDown, true);
        gamepad.set_held(Player::Bravo, Button::Menu, true);

        keyboard.merge(&gamepad);
        assert!(keyboard.is_held(Player::Alpha, Button::DirUp));
        assert!(keyboard.is_held(Player::Alpha, Button::FaceDown));
        assert!(keyboard.is_held(Player::Bravo, Button::Menu));
    }

    #[test]
    fn player_index_round_trips() {
        for (i, player) in Player::ALL.into_iter().enumerate() {
            assert_eq!(player.index(), i);
            assert_eq!(Player::from_index(i), Some(player));
        }
        assert_eq!(Player::from_index(4), None);
    }
}
