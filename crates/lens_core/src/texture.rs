//! Raster textures decoded from images embedded in a document.
//!
//! Pixels are stored as linear RGBA floats in row-major order.

use thiserror::Error;

/// Errors that can occur during texture decoding.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image decoding error for '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Image '{0}' has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A decoded texture with pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data in RGBA format (linear, 0-1 range), row-major
    pub pixels: Vec<[f32; 4]>,

    /// Name of the source file inside the container
    pub name: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, name: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            name: name.into(),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    ///
    /// The format is sniffed from the payload, not from `name`.
    pub fn decode(bytes: &[u8], name: &str) -> TextureResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::Decode {
            name: name.to_string(),
            source,
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(name.to_string()));
        }

        let pixels = rgba
            .pixels()
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();

        Ok(Self::new(width, height, pixels, name))
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
pub(crate) fn encode_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    use std::io::Cursor;

    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let png = encode_png(3, 2, [255, 255, 255, 128]);
        let tex = Texture::decode(&png, "image.png").unwrap();

        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.pixels.len(), 6);
        assert!((tex.pixels[5][0] - 1.0).abs() < 0.001);
        assert!((tex.pixels[5][3] - 128.0 / 255.0).abs() < 0.001);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = Texture::decode(b"not an image", "broken.png").unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
