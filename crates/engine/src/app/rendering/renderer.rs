use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::walker::Walker;
use crate::puzzle::{GameSession, Vec2, SCREEN_HEIGHT, SCREEN_WIDTH};

use super::canvas::{Canvas, Sprite};
use super::frame::{draw_frame, FrameView, PanelShake};

/// Software renderer. The frame buffer stays at the logical screen size and
/// `pixels` scales it to whatever the window is.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<Sprite>>,
    warned_sprite_keys: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            asset_root,
            sprite_cache: HashMap::new(),
            warned_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, surface)
    }

    /// Maps a physical cursor position to logical screen space. Positions in
    /// the letterbox margins map to `None`.
    pub fn window_to_screen(&self, x: f32, y: f32) -> Option<Vec2> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Vec2::new(px as f32, py as f32))
    }

    pub fn render(
        &mut self,
        session: &GameSession,
        walker: &Walker,
        cursor: Option<Vec2>,
        shake: &PanelShake,
    ) -> Result<(), Error> {
        let sprite_key = walker_sprite_key(walker);
        let walker_sprite = resolve_cached_sprite(
            &mut self.sprite_cache,
            &mut self.warned_sprite_keys,
            &self.asset_root,
            &sprite_key,
        );
        let mut canvas = Canvas::new(
            self.pixels.frame_mut(),
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
        );
        draw_frame(
            &mut canvas,
            &FrameView {
                session,
                walker,
                walker_sprite,
                cursor,
                shake,
            },
        );
        self.pixels.render()
    }
}

fn walker_sprite_key(walker: &Walker) -> String {
    let facing = walker.facing().as_str();
    if walker.is_walking() {
        format!("walker_{facing}_{}", walker.frame())
    } else {
        format!("walker_{facing}_idle")
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<Sprite>>,
    warned_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a Sprite> {
    if !cache.contains_key(key) {
        let path = sprite_image_path(asset_root, key);
        let sprite = match load_sprite_rgba(&path) {
            Ok(sprite) => Some(sprite),
            Err(reason) => {
                warn_sprite_load_once(warned_keys, key, &path, &reason);
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn sprite_image_path(asset_root: &Path, key: &str) -> PathBuf {
    asset_root
        .join("base")
        .join("sprites")
        .join(format!("{key}.png"))
}

fn load_sprite_rgba(path: &Path) -> Result<Sprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(Sprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(warned_keys: &mut HashSet<String>, key: &str, path: &Path, reason: &str) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    warn!(
        sprite_key = key,
        path = %path.display(),
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_png(root: &Path, key: &str) {
        let dir = root.join("base").join("sprites");
        fs::create_dir_all(&dir).expect("sprite dir");
        let mut image = image::RgbaImage::new(3, 6);
        image.put_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        image.save(dir.join(format!("{key}.png"))).expect("save png");
    }

    #[test]
    fn sprite_keys_follow_facing_and_frame() {
        let mut walker = Walker::new(Vec2::new(100.0, 100.0), 2.0);
        assert_eq!(walker_sprite_key(&walker), "walker_right_idle");

        walker.set_target(Vec2::new(100.0, 10.0));
        walker.update(&[]);
        assert_eq!(walker_sprite_key(&walker), "walker_up_0");
    }

    #[test]
    fn existing_png_is_decoded_and_cached() {
        let temp = TempDir::new().expect("temp");
        write_png(temp.path(), "walker_down_idle");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();

        let sprite = resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "walker_down_idle")
            .expect("sprite");
        assert_eq!((sprite.width, sprite.height), (3, 6));
        let offset = (3 + 1) * 4;
        assert_eq!(&sprite.rgba[offset..offset + 4], &[10, 20, 30, 255]);
        assert_eq!(cache.len(), 1);
        assert!(warned.is_empty());
    }

    #[test]
    fn missing_png_falls_back_and_warns_once() {
        let temp = TempDir::new().expect("temp");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();

        for _ in 0..2 {
            let sprite = resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "walker_up_2");
            assert!(sprite.is_none());
        }
        assert_eq!(warned.len(), 1);
        assert!(matches!(cache.get("walker_up_2"), Some(None)));
    }
}
