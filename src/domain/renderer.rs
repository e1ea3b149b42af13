use super::assets::{
    IMAGE_SIZE, Image, ImageBank, MAX_IMAGES, MAX_PALETTES, Palette, PaletteBank, is_transparent,
    unpack_rgba,
};
use super::console::{
    BACKGROUND_CANVAS_HEIGHT, BACKGROUND_CANVAS_WIDTH, ConsoleState, RESOLUTION_HEIGHT,
    RESOLUTION_WIDTH, Sprite,
};
use super::framebuffer::Framebuffer;

/// Opaque color behind transparent background pixels.
pub const BACKDROP: [u8; 3] = [0x00, 0x00, 0x00];

// Pixel dimensions of the padded background grid; pan samples wrap here.
const GRID_PIXEL_WIDTH: i32 = (BACKGROUND_CANVAS_WIDTH * IMAGE_SIZE) as i32;
const GRID_PIXEL_HEIGHT: i32 = (BACKGROUND_CANVAS_HEIGHT * IMAGE_SIZE) as i32;

/// Software compositor: resolves a console state against the session's
/// image and palette stores into an RGB framebuffer. The state is only
/// read, never mutated.
pub struct Renderer {
    images: Box<[Image; MAX_IMAGES]>,
    palettes: Box<[Palette; MAX_PALETTES]>,
}

impl Renderer {
    pub fn new(images: &ImageBank, palettes: &PaletteBank) -> Self {
        Self {
            images: Box::new(*images.slots()),
            palettes: Box::new(*palettes.slots()),
        }
    }

    pub fn render(&self, state: &ConsoleState, framebuffer: &mut Framebuffer) {
        framebuffer.fill(BACKDROP);
        self.render_background(state, framebuffer);
        self.render_sprites(state, framebuffer);
    }

    /// Samples the padded 18x14 grid through the pan offset. With pan at
    /// the origin the visible window shows the grid's center 16x12 cells;
    /// positive pan moves grid content right/down, pulling the padding
    /// ring into view. Samples wrap at the grid edges.
    fn render_background(&self, state: &ConsoleState, framebuffer: &mut Framebuffer) {
        let (pan_x, pan_y) = state.pan();
        let background = state.background();

        for y in 0..RESOLUTION_HEIGHT {
            let gy = (y as i32 + IMAGE_SIZE as i32 - pan_y as i32).rem_euclid(GRID_PIXEL_HEIGHT);
            let row = gy as usize / IMAGE_SIZE;
            let line = gy as usize % IMAGE_SIZE;
            for x in 0..RESOLUTION_WIDTH {
                let gx =
                    (x as i32 + IMAGE_SIZE as i32 - pan_x as i32).rem_euclid(GRID_PIXEL_WIDTH);
                let col = gx as usize / IMAGE_SIZE;

                let tile = background[row * BACKGROUND_CANVAS_WIDTH + col];
                let image = &self.images[tile.image_id as usize];
                let index = image.pixel(gx as usize % IMAGE_SIZE, line);
                let palette = &self.palettes[(tile.palette_id & 0x0F) as usize];
                let color = palette.color_for(index);
                if is_transparent(color) {
                    continue;
                }
                framebuffer.put(x, y, expand(color));
            }
        }
    }

    /// Composites the 96 sprite slots in ascending order, so a later slot
    /// draws over an earlier one. Blank slots are skipped, alpha-0 colors
    /// leave the pixel untouched, off-canvas parts clip.
    fn render_sprites(&self, state: &ConsoleState, framebuffer: &mut Framebuffer) {
        for sprite in state.foreground() {
            if sprite.is_blank() {
                continue;
            }
            self.render_sprite(sprite, framebuffer);
        }
    }

    fn render_sprite(&self, sprite: &Sprite, framebuffer: &mut Framebuffer) {
        let image = &self.images[sprite.image_id as usize];
        let palette = &self.palettes[sprite.palette_id() as usize];

        for py in 0..IMAGE_SIZE {
            let sy = sprite.y as i32 + py as i32;
            if sy < 0 || sy >= RESOLUTION_HEIGHT as i32 {
                continue;
            }
            let src_y = if sprite.flip_y() { IMAGE_SIZE - 1 - py } else { py };
            for px in 0..IMAGE_SIZE {
                let sx = sprite.x as i32 + px as i32;
                if sx < 0 || sx >= RESOLUTION_WIDTH as i32 {
                    continue;
                }
                let src_x = if sprite.flip_x() { IMAGE_SIZE - 1 - px } else { px };
                let color = palette.color_for(image.pixel(src_x, src_y));
                if is_transparent(color) {
                    continue;
                }
                framebuffer.put(sx as usize, sy as usize, expand(color));
            }
        }
    }
}

fn expand(color: u16) -> [u8; 3] {
    let [r, g, b, _] = unpack_rgba(color);
    [r * 17, g * 17, b * 17]
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::console::{MAX_SPRITES, Tile};
    use proptest::prelude::*;

    fn renderer_with_content() -> Renderer {
        let mut images = [Image::blank(); MAX_IMAGES];
        images[1] = {
            let mut pixels = [0u8; 256];
            for (i, p) in pixels.iter_mut().enumerate() {
                *p = i as u8;
            }
            Image(pixels)
        };
        let mut palettes = [Palette::blank(); MAX_PALETTES];
        palettes[3] = Palette([0x0F0F, 0xF00F, 0x00FF, 0xFFFF]);
        Renderer::new(&ImageBank::new(images), &PaletteBank::new(palettes))
    }

    proptest! {
        #[test]
        fn prop_any_pan_renders_without_panicking(pan_x in any::<i8>(), pan_y in any::<i8>()) {
            let renderer = renderer_with_content();
            let mut state = ConsoleState::new();
            state.set_tile(4, 4, Tile::new(1, 3));
            state.set_pan(pan_x, pan_y);

            let mut framebuffer = Framebuffer::new();
            renderer.render(&state, &mut framebuffer);
        }
    }

    proptest! {
        #[test]
        fn prop_any_sprite_position_clips_without_panicking(
            x in any::<i16>(),
            y in any::<i16>(),
            slot in 0usize..MAX_SPRITES,
            transform in 0u8..64,
        ) {
            let renderer = renderer_with_content();
            let mut state = ConsoleState::new();
            let sprite = Sprite {
                image_id: 1,
                palette_transform: transform,
                x,
                y,
            };
            state.foreground_mut()[slot] = sprite;

            let mut framebuffer = Framebuffer::new();
            renderer.render(&state, &mut framebuffer);
        }
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(pan_x in any::<i8>(), seed in any::<u8>()) {
            let renderer = renderer_with_content();
            let mut state = ConsoleState::new();
            state.set_tile(2, 3, Tile::new(1, 3));
            state.set_sprite(0, Sprite::new(1, 3, seed as i16, 12));
            state.set_pan(pan_x, -5);

            let mut first = Framebuffer::new();
            let mut second = Framebuffer::new();
            renderer.render(&state, &mut first);
            renderer.render(&state, &mut second);
            prop_assert_eq!(first.as_slice(), second.as_slice());
        }
    }
}
