use std::{fmt, str::FromStr};

use crate::foundation::error::{AvatarError, AvatarResult};

/// Default width and height of an avatar surface.
pub const DEFAULT_AVATAR_SIZE: u32 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> AvatarResult<Self> {
        if width == 0 || height == 0 {
            return Err(AvatarError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn square(size: u32) -> AvatarResult<Self> {
        Self::new(size, size)
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_AVATAR_SIZE,
            height: DEFAULT_AVATAR_SIZE,
        }
    }
}

/// Opaque straight RGB color used to tint fill layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb8 {
    type Err = AvatarError;

    /// Accepts any SVG/CSS color: hex, `rgb()`/`rgba()`, `hsl()` or a named color.
    /// Fills are opaque, so a translucent color is rejected.
    fn from_str(s: &str) -> AvatarResult<Self> {
        let color = svgtypes::Color::from_str(s.trim())
            .map_err(|e| AvatarError::validation(format!("unrecognized color '{s}': {e}")))?;
        if color.alpha != u8::MAX {
            return Err(AvatarError::validation(format!(
                "fill color '{s}' must be opaque"
            )));
        }
        Ok(Self::new(color.red, color.green, color.blue))
    }
}

impl serde::Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
