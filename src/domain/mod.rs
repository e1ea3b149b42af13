pub mod assets;
pub mod console;
pub mod driver;
pub mod framebuffer;
pub mod input;
pub mod renderer;
pub mod session;

pub use assets::{
    IMAGE_PIXEL_COUNT, IMAGE_SIZE, Image, ImageBank, MAX_IMAGES, MAX_PALETTES, PALETTE_COLORS,
    Palette, PaletteBank, is_transparent, pack_rgba, unpack_rgba,
};
pub use console::{
    BACKGROUND_CANVAS_HEIGHT, BACKGROUND_CANVAS_SIZE, BACKGROUND_CANVAS_WIDTH, CANVAS_HEIGHT,
    CANVAS_SIZE, CANVAS_WIDTH, ConsoleState, MAX_SPRITES, RESOLUTION_HEIGHT, RESOLUTION_SIZE,
    RESOLUTION_WIDTH, Sprite, Tile,
};
pub use driver::{FrameDriver, InitError};
pub use framebuffer::{FRAME_CHANNELS, FRAME_SIZE, Framebuffer};
pub use input::{BUTTON_COUNT, Button, InputState, PLAYER_COUNT, Player};
pub use renderer::Renderer;
pub use session::Session;
