use crate::domain::{
    BACKGROUND_CANVAS_HEIGHT, BACKGROUND_CANVAS_WIDTH, Button, IMAGE_SIZE, Image, ImageBank,
    MAX_IMAGES, MAX_PALETTES, Palette, PaletteBank, Player, RESOLUTION_HEIGHT, RESOLUTION_WIDTH,
    Session, Sprite, Tile, pack_rgba,
};

const IMG_CHECKER: u8 = 1;
const IMG_RING: u8 = 2;
const IMG_PADDLE: u8 = 3;

const PAL_FIELD: u8 = 1;
const PAL_FIELD_ALT: u8 = 2;
const PAL_PADDLE: u8 = 3;
const PAL_BALL: u8 = 4;

const SPRITE_LEFT_PADDLE: usize = 0;
const SPRITE_RIGHT_PADDLE: usize = 3;
const SPRITE_BALL: usize = 6;
const PADDLE_SEGMENTS: usize = 3;

const PADDLE_SPEED: f32 = 144.0;
const SCROLL_SPEED: f32 = 24.0;
const PADDLE_HEIGHT: f32 = (PADDLE_SEGMENTS * IMAGE_SIZE) as f32;

/// Builds the demo's image and palette stores. Everything is generated
/// procedurally; the console consumes raw pixel data only.
pub fn build_assets() -> (ImageBank, PaletteBank) {
    let mut images = [Image::blank(); MAX_IMAGES];
    images[IMG_CHECKER as usize] = checker_image();
    images[IMG_RING as usize] = ring_image();
    images[IMG_PADDLE as usize] = paddle_image();

    let mut palettes = [Palette::blank(); MAX_PALETTES];
    palettes[PAL_FIELD as usize] = Palette([
        0,
        pack_rgba([1, 2, 6, 15]),
        pack_rgba([2, 3, 8, 15]),
        pack_rgba([4, 5, 10, 15]),
    ]);
    palettes[PAL_FIELD_ALT as usize] = Palette([
        0,
        pack_rgba([2, 1, 5, 15]),
        pack_rgba([3, 2, 7, 15]),
        pack_rgba([5, 4, 9, 15]),
    ]);
    palettes[PAL_PADDLE as usize] = Palette([
        0,
        pack_rgba([14, 14, 15, 15]),
        pack_rgba([8, 9, 11, 15]),
        pack_rgba([4, 4, 6, 15]),
    ]);
    palettes[PAL_BALL as usize] = Palette([
        0,
        pack_rgba([15, 10, 2, 15]),
        pack_rgba([15, 4, 2, 15]),
        pack_rgba([15, 15, 12, 15]),
    ]);

    (ImageBank::new(images), PaletteBank::new(palettes))
}

fn checker_image() -> Image {
    let mut pixels = [0u8; 256];
    for y in 0..IMAGE_SIZE {
        for x in 0..IMAGE_SIZE {
            let block = (x / 4 + y / 4) % 2;
            pixels[y * IMAGE_SIZE + x] = if block == 0 { 1 } else { 2 };
        }
    }
    Image(pixels)
}

fn ring_image() -> Image {
    let mut pixels = [0u8; 256];
    for y in 0..IMAGE_SIZE {
        for x in 0..IMAGE_SIZE {
            // Distance from the block center, in half-pixel units.
            let dx = 2 * x as i32 - 15;
            let dy = 2 * y as i32 - 15;
            let d2 = dx * dx + dy * dy;
            pixels[y * IMAGE_SIZE + x] = if d2 <= 64 {
                3
            } else if d2 <= 169 {
                1
            } else if d2 <= 225 {
                2
            } else {
                0
            };
        }
    }
    Image(pixels)
}

fn paddle_image() -> Image {
    let mut pixels = [0u8; 256];
    for y in 0..IMAGE_SIZE {
        for x in 4..12 {
            pixels[y * IMAGE_SIZE + x] = if x == 4 || x == 11 { 2 } else { 1 };
        }
    }
    Image(pixels)
}

/// The built-in guest program: two input-driven paddles over a slowly
/// scrolling checkered field, with a ball orbiting the center. Exercises
/// tiles, sprites, flips, palette remaps, pan, input, and time.
pub struct Demo {
    left_y: f32,
    right_y: f32,
    scroll: f32,
    ball_angle: f32,
    last_time: u64,
}

impl Demo {
    pub fn new() -> Self {
        let start = (RESOLUTION_HEIGHT as f32 - PADDLE_HEIGHT) / 2.0;
        Self {
            left_y: start,
            right_y: start,
            scroll: 0.0,
            ball_angle: 0.0,
            last_time: 0,
        }
    }

    /// One-time scene setup in a fresh console state.
    pub fn layout(&self, session: &mut Session) {
        let state = session.state_mut();

        for row in 0..BACKGROUND_CANVAS_HEIGHT {
            for col in 0..BACKGROUND_CANVAS_WIDTH {
                let palette = if (row + col) % 2 == 0 {
                    PAL_FIELD
                } else {
                    PAL_FIELD_ALT
                };
                state.set_tile(col, row, Tile::new(IMG_CHECKER, palette));
            }
        }

        let left_x = 8;
        let right_x = (RESOLUTION_WIDTH - IMAGE_SIZE - 8) as i16;
        for segment in 0..PADDLE_SEGMENTS {
            let mut left = Sprite::new(IMG_PADDLE, PAL_PADDLE, left_x, 0);
            left.set_flip_y(segment == 0);
            state.set_sprite(SPRITE_LEFT_PADDLE + segment, left);

            let mut right = Sprite::new(IMG_PADDLE, PAL_PADDLE, right_x, 0);
            right.set_flip_x(true);
            right.set_flip_y(segment == 0);
            state.set_sprite(SPRITE_RIGHT_PADDLE + segment, right);
        }

        state.set_sprite(SPRITE_BALL, Sprite::new(IMG_RING, PAL_BALL, 0, 0));
        self.place_sprites(session);
    }

    /// Per-frame guest logic: read the last input sample and the session
    /// clock, then rewrite the draw state before the next frame advance.
    pub fn update(&mut self, session: &mut Session) {
        let now = session.time();
        let delta = now.saturating_sub(self.last_time) as f32 / 1000.0;
        self.last_time = now;

        let max_y = RESOLUTION_HEIGHT as f32 - PADDLE_HEIGHT;
        self.left_y += paddle_motion(session, Player::Alpha) * PADDLE_SPEED * delta;
        self.right_y += paddle_motion(session, Player::Bravo) * PADDLE_SPEED * delta;
        self.left_y = self.left_y.clamp(0.0, max_y);
        self.right_y = self.right_y.clamp(0.0, max_y);

        self.scroll += SCROLL_SPEED * delta;
        // Holding the menu button freezes the ball.
        if !session.input(Player::Alpha, Button::Menu) {
            self.ball_angle += 1.2 * delta;
        }

        self.place_sprites(session);
    }

    fn place_sprites(&self, session: &mut Session) {
        let ball_x = (RESOLUTION_WIDTH / 2) as f32 - 8.0 + self.ball_angle.cos() * 72.0;
        let ball_y = (RESOLUTION_HEIGHT / 2) as f32 - 8.0 + self.ball_angle.sin() * 56.0;
        let pan = (self.scroll % IMAGE_SIZE as f32) as i8;

        let state = session.state_mut();
        let foreground = state.foreground_mut();
        for segment in 0..PADDLE_SEGMENTS {
            let offset = (segment * IMAGE_SIZE) as f32;
            foreground[SPRITE_LEFT_PADDLE + segment].y = (self.left_y + offset) as i16;
            foreground[SPRITE_RIGHT_PADDLE + segment].y = (self.right_y + offset) as i16;
        }
        foreground[SPRITE_BALL].x = ball_x as i16;
        foreground[SPRITE_BALL].y = ball_y as i16;
        state.set_pan(pan, 0);
    }
}

impl Default for Demo {
    fn default() -> Self {
        Self::new()
    }
}

fn paddle_motion(session: &Session, player: Player) -> f32 {
    let mut motion = 0.0;
    if session.input(player, Button::DirUp) {
        motion -= 1.0;
    }
    if session.input(player, Button::DirDown) {
        motion += 1.0;
    }
    motion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InputState;
    use crate::infrastructure::headless::HeadlessDriver;

    fn demo_session(driver: HeadlessDriver) -> Session {
        let (images, palettes) = build_assets();
        Session::initialize(images, palettes, Box::new(driver)).expect("initialize")
    }

    #[test]
    fn layout_fills_the_whole_padded_grid() {
        let mut session = demo_session(HeadlessDriver::new());
        let demo = Demo::new();
        demo.layout(&mut session);

        assert!(
            session
                .state()
                .background()
                .iter()
                .all(|tile| tile.image_id == IMG_CHECKER)
        );
        assert!(!session.state().foreground()[SPRITE_BALL].is_blank());
    }

    #[test]
    fn held_direction_moves_the_paddle() {
        let mut driver = HeadlessDriver::new();
        let mut held = InputState::new();
        held.set_held(Player::Alpha, Button::DirDown, true);
        for _ in 0..10 {
            driver.push_frame(true, held);
        }
        let mut session = demo_session(driver);
        let mut demo = Demo::new();
        demo.layout(&mut session);
        let start = demo.left_y;

        for _ in 0..10 {
            assert!(session.advance_frame());
            demo.update(&mut session);
        }
        assert!(demo.left_y > start);
        // Bravo saw no input, so the right paddle stays put.
        assert_eq!(demo.right_y, (RESOLUTION_HEIGHT as f32 - PADDLE_HEIGHT) / 2.0);
    }

    #[test]
    fn paddles_clamp_to_the_canvas() {
        let mut driver = HeadlessDriver::new();
        let mut held = InputState::new();
        held.set_held(Player::Alpha, Button::DirUp, true);
        for _ in 0..2000 {
            driver.push_frame(true, held);
        }
        let mut session = demo_session(driver);
        let mut demo = Demo::new();
        demo.layout(&mut session);

        for _ in 0..2000 {
            assert!(session.advance_frame());
            demo.update(&mut session);
        }
        assert_eq!(demo.left_y, 0.0);
        let top = session.state().foreground()[SPRITE_LEFT_PADDLE].y;
        assert_eq!(top, 0);
    }

    #[test]
    fn pan_stays_sub_tile() {
        let mut session = demo_session(HeadlessDriver::new());
        let mut demo = Demo::new();
        demo.layout(&mut session);

        for _ in 0..500 {
            assert!(session.advance_frame());
            demo.update(&mut session);
            let (pan_x, pan_y) = session.state().pan();
            assert!((0..16).contains(&pan_x));
            assert_eq!(pan_y, 0);
        }
    }

    #[test]
    fn build_assets_always_fills_every_slot() {
        let (images, palettes) = build_assets();
        // Fully-sized stores: the max indices are always addressable.
        images.get(255);
        palettes.get(15);
        assert_eq!(images.get(IMG_CHECKER).pixel(0, 0), 1);
        assert_eq!(images.get(0).pixel(0, 0), 0);
    }
}
