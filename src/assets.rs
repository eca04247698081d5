use std::sync::Arc;

use crate::foundation::error::{AvatarError, AvatarResult};

pub mod decode;
pub mod loader;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        debug_assert_eq!(rgba8_premul.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }

    /// Like [`Self::new`], but rejects a buffer that does not hold `width * height` pixels.
    pub fn try_new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> AvatarResult<Self> {
        let image = Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        };
        image.check()?;
        Ok(image)
    }

    /// The buffer must hold exactly `width * height` RGBA8 pixels.
    pub fn check(&self) -> AvatarResult<()> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.rgba8_premul.len() != expected {
            return Err(AvatarError::asset(format!(
                "{}x{} image expects {expected} rgba8 bytes, got {}",
                self.width,
                self.height,
                self.rgba8_premul.len()
            )));
        }
        Ok(())
    }

    /// Alpha channel only, row-major.
    pub fn alpha_mask(&self) -> Vec<u8> {
        self.rgba8_premul.chunks_exact(4).map(|px| px[3]).collect()
    }
}
