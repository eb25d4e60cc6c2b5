//! Color sources in the presentation file.
//!
//! Colors are stored as decimal strings of a packed `0xRRGGBBAA` integer.
//! `ShapeAppearance` points at a separate binary material-list blob.

use thiserror::Error;

use crate::scene::Color;

/// First material-list version that appends image and uuid strings to
/// every material.
const STRINGS_SINCE_VERSION: u32 = 3;

/// Errors raised while decoding appearance data.
#[derive(Error, Debug, PartialEq)]
pub enum AppearanceError {
    #[error("material list truncated at byte {0}")]
    Truncated(usize),

    #[error("invalid packed color '{0}'")]
    InvalidColor(String),
}

pub type AppearanceResult<T> = Result<T, AppearanceError>;

/// One entry of a material list. Colors are packed `0xRRGGBBAA`.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub ambient: u32,
    pub diffuse: u32,
    pub specular: u32,
    pub emissive: u32,
    pub shininess: f32,
    pub transparency: f32,
}

impl Material {
    pub fn specular_color(&self) -> Color {
        Color::from_packed(self.specular)
    }
}

/// Parse a packed color attribute. Values that overflow 32 bits are
/// rejected rather than wrapped.
pub fn parse_packed_color(value: &str) -> AppearanceResult<Color> {
    value
        .trim()
        .parse::<u32>()
        .map(Color::from_packed)
        .map_err(|_| AppearanceError::InvalidColor(value.to_string()))
}

/// Little-endian cursor over a blob.
struct BlobReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> BlobReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> AppearanceResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(AppearanceError::Truncated(self.offset))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u32(&mut self) -> AppearanceResult<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    fn f32(&mut self) -> AppearanceResult<f32> {
        self.u32().map(f32::from_bits)
    }

    fn skip_string(&mut self) -> AppearanceResult<()> {
        let len = self.u32()? as usize;
        self.take(len).map(|_| ())
    }
}

/// Decode a material-list blob.
pub fn read_material_list(bytes: &[u8], version: u32) -> AppearanceResult<Vec<Material>> {
    let mut reader = BlobReader::new(bytes);
    let count = reader.u32()? as usize;

    // Each material is at least 24 bytes; don't trust the count for capacity.
    let mut materials = Vec::with_capacity(count.min(bytes.len() / 24));
    for _ in 0..count {
        let material = Material {
            ambient: reader.u32()?,
            diffuse: reader.u32()?,
            specular: reader.u32()?,
            emissive: reader.u32()?,
            shininess: reader.f32()?,
            transparency: reader.f32()?,
        };
        if version >= STRINGS_SINCE_VERSION {
            for _ in 0..3 {
                reader.skip_string()?;
            }
        }
        materials.push(material);
    }

    Ok(materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fcstd::test_support::material_list_blob;

    #[test]
    fn test_parse_packed_color() {
        let red = parse_packed_color("4278190335").unwrap();
        assert_eq!(red, Color { r: 1.0, g: 0.0, b: 0.0, a: 1.0 });

        let blue = parse_packed_color(" 65535 ").unwrap();
        assert_eq!(blue, Color { r: 0.0, g: 0.0, b: 1.0, a: 1.0 });
    }

    #[test]
    fn test_parse_packed_color_rejects_garbage() {
        assert!(parse_packed_color("red").is_err());
        assert!(parse_packed_color("").is_err());
        assert!(parse_packed_color("99999999999").is_err());
    }

    #[test]
    fn test_read_material_list_v3() {
        let blob = material_list_blob(3, &[0x00ff00ff, 0xff0000ff]);
        let materials = read_material_list(&blob, 3).unwrap();

        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].specular, 0x00ff00ff);
        assert_eq!(materials[1].specular, 0xff0000ff);
        assert_eq!(materials[0].diffuse, 0xccccccff);
        assert!((materials[0].shininess - 0.2).abs() < 1e-6);
        assert_eq!(materials[0].specular_color(), Color { r: 0.0, g: 1.0, b: 0.0, a: 1.0 });
    }

    #[test]
    fn test_read_material_list_v2_has_no_strings() {
        let blob = material_list_blob(2, &[0x0000ffff]);
        assert_eq!(blob.len(), 4 + 24);

        let materials = read_material_list(&blob, 2).unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].specular, 0x0000ffff);
    }

    #[test]
    fn test_truncated_material_list() {
        let blob = material_list_blob(3, &[0x00ff00ff]);
        let err = read_material_list(&blob[..blob.len() - 2], 3).unwrap_err();

        assert!(matches!(err, AppearanceError::Truncated(_)));
        assert!(read_material_list(&[], 3).is_err());
    }

    #[test]
    fn test_huge_count_fails_cleanly() {
        let blob = u32::MAX.to_le_bytes();
        assert!(matches!(
            read_material_list(&blob, 3),
            Err(AppearanceError::Truncated(4))
        ));
    }
}
