use crate::puzzle::Rect;

/// Decoded RGBA8 image.
#[derive(Debug, Clone)]
pub(crate) struct Sprite {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Clipped drawing over an RGBA8 frame buffer. Every write outside the frame
/// is dropped silently.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    pub(crate) fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let offset = self.byte_offset(x, y)?;
        let mut color = [0u8; 4];
        color.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(color)
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel_offset = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let byte_offset = pixel_offset.checked_mul(4)?;
        (byte_offset.checked_add(4)? <= self.frame.len()).then_some(byte_offset)
    }

    pub(crate) fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.frame[offset..offset + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend using the color's alpha channel.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let alpha = color[3] as u32;
        for channel in 0..3 {
            let dst = self.frame[offset + channel] as u32;
            let src = color[channel] as u32;
            self.frame[offset + channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
        }
        self.frame[offset + 3] = 255;
    }

    pub(crate) fn fill_rect_xywh(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: [u8; 4],
    ) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(width).min(self.width as i32);
        let end_y = y.saturating_add(height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put_pixel(px, py, color);
            }
        }
    }

    pub(crate) fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        self.fill_rect_xywh(rect.x, rect.y, rect.width, rect.height, color);
    }

    pub(crate) fn blend_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let start_x = rect.x.max(0);
        let start_y = rect.y.max(0);
        let end_x = rect.right().min(self.width as i32);
        let end_y = rect.bottom().min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, rect: Rect, thickness: i32, color: [u8; 4]) {
        if rect.width <= 1 || rect.height <= 1 {
            return;
        }
        let t = thickness.clamp(1, rect.width.min(rect.height) / 2 + 1);
        self.fill_rect_xywh(rect.x, rect.y, rect.width, t, color);
        self.fill_rect_xywh(rect.x, rect.bottom() - t, rect.width, t, color);
        self.fill_rect_xywh(rect.x, rect.y, t, rect.height, color);
        self.fill_rect_xywh(rect.right() - t, rect.y, t, rect.height, color);
    }

    /// Nearest-neighbour scale of `sprite` into `dest`. Fully transparent
    /// source pixels are skipped.
    pub(crate) fn blit_sprite(&mut self, sprite: &Sprite, dest: Rect) {
        if sprite.width == 0 || sprite.height == 0 || dest.is_empty() {
            return;
        }
        let expected_len = sprite.width as usize * sprite.height as usize * 4;
        if sprite.rgba.len() < expected_len {
            return;
        }

        let x_ratio = sprite.width as f32 / dest.width as f32;
        let y_ratio = sprite.height as f32 / dest.height as f32;
        for dy in 0..dest.height {
            let src_y = ((dy as f32 * y_ratio) as u32).min(sprite.height - 1) as usize;
            for dx in 0..dest.width {
                let src_x = ((dx as f32 * x_ratio) as u32).min(sprite.width - 1) as usize;
                let src = (src_y * sprite.width as usize + src_x) * 4;
                let color = [
                    sprite.rgba[src],
                    sprite.rgba[src + 1],
                    sprite.rgba[src + 2],
                    sprite.rgba[src + 3],
                ];
                match color[3] {
                    0 => {}
                    255 => self.put_pixel(dest.x + dx, dest.y + dy, color),
                    _ => self.blend_pixel(dest.x + dx, dest.y + dy, color),
                }
            }
        }
    }
}
