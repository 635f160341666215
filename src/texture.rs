use std::path::Path;

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use image::GenericImageView;
use log::{info, warn};

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureImage {
    /// Decodes a PNG or JPEG image from memory.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("failed to decode texture image")?;
        let (width, height) = image.dimensions();
        ensure!(width > 0 && height > 0, "texture has invalid dimensions");
        Ok(Self {
            width,
            height,
            rgba: image.to_rgba8().into_raw(),
        })
    }

    /// Reads and decodes the image stored at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("unable to read {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("{} is not a usable texture", path.display()))
    }

    /// Decodes `bytes`, falling back to the built-in checkerboard when they are unusable.
    pub fn decode_or_checker(bytes: Option<&[u8]>) -> Self {
        match bytes.map(Self::decode) {
            Some(Ok(texture)) => texture,
            Some(Err(err)) => {
                warn!("texture could not be decoded, using checkerboard: {err:?}");
                Self::checker()
            }
            None => {
                info!("no texture supplied, using checkerboard");
                Self::checker()
            }
        }
    }

    /// Opens the image at `path`, falling back to the built-in checkerboard.
    pub fn open_or_checker(path: Option<&Path>) -> Self {
        match path.map(Self::open) {
            Some(Ok(texture)) => texture,
            Some(Err(err)) => {
                warn!("texture could not be loaded, using checkerboard: {err:?}");
                Self::checker()
            }
            None => {
                info!("no texture configured, using checkerboard");
                Self::checker()
            }
        }
    }

    /// The default 2x2 grey checker tile.
    pub fn checker() -> Self {
        Self::checkerboard(2, 1, Vec3::splat(0.53), Vec3::splat(0.27))
    }

    /// Square checkerboard of `cells` x `cells` squares, each `cell_size` pixels wide.
    pub fn checkerboard(cells: u32, cell_size: u32, light: Vec3, dark: Vec3) -> Self {
        let cells = cells.max(1);
        let cell_size = cell_size.max(1);
        let size = cells * cell_size;
        let light = to_rgba8(light);
        let dark = to_rgba8(dark);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell_size) + (y / cell_size)) % 2 == 0;
                rgba.extend_from_slice(if even { &light } else { &dark });
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// A single opaque pixel, bound for untextured materials.
    pub fn solid(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: to_rgba8(color).to_vec(),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let start = ((y * self.width + x) * 4) as usize;
        [
            self.rgba[start],
            self.rgba[start + 1],
            self.rgba[start + 2],
            self.rgba[start + 3],
        ]
    }
}

fn to_rgba8(color: Vec3) -> [u8; 4] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use image::{ImageFormat, Rgba, RgbaImage};
    use tempfile::NamedTempFile;

    use super::*;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png_into_rgba() {
        let mut source = RgbaImage::new(3, 2);
        source.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let texture = TextureImage::decode(&encode_png(&source)).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.rgba.len(), 3 * 2 * 4);
        assert_eq!(texture.pixel(2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn opens_texture_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&encode_png(&RgbaImage::new(4, 4))).unwrap();
        let texture = TextureImage::open(file.path()).unwrap();
        assert_eq!(texture.width, 4);
    }

    #[test]
    fn garbage_falls_back_to_checker() {
        assert!(TextureImage::decode(b"not an image").is_err());
        let texture = TextureImage::decode_or_checker(Some(&b"not an image"[..]));
        assert_eq!(texture, TextureImage::checker());
        let missing = TextureImage::open_or_checker(Some(Path::new("/nonexistent/checker.png")));
        assert_eq!(missing, TextureImage::checker());
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let texture = TextureImage::checkerboard(4, 2, Vec3::ONE, Vec3::ZERO);
        assert_eq!((texture.width, texture.height), (8, 8));
        assert_eq!(texture.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(texture.pixel(1, 1), [255, 255, 255, 255]);
        assert_eq!(texture.pixel(2, 0), [0, 0, 0, 255]);
        assert_eq!(texture.pixel(2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn solid_is_one_opaque_pixel() {
        let texture = TextureImage::solid(Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(texture.rgba, vec![255, 0, 128, 255]);
    }
}
