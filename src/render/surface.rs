use crate::{
    assets::PreparedImage,
    foundation::{core::Canvas, error::AvatarResult},
    render::composite::{PremulRgba8, over, unpremultiply_rgba8_in_place},
};

/// Caller-owned drawing target. Pixels are premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    canvas: Canvas,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            data: vec![0; canvas.byte_len()],
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.canvas.width || y >= self.canvas.height {
            return None;
        }
        let idx = (y as usize * self.canvas.width as usize + x as usize) * 4;
        let px = &self.data[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Source-over `image` with its top-left corner at the origin, clipped to the surface.
    ///
    /// A malformed image is rejected before any pixel is written.
    pub fn draw_image(&mut self, image: &PreparedImage) -> AvatarResult<()> {
        image.check()?;
        let w = self.canvas.width.min(image.width) as usize;
        let h = self.canvas.height.min(image.height) as usize;
        let dst_stride = self.canvas.width as usize * 4;
        let src_stride = image.width as usize * 4;

        for y in 0..h {
            let dst_row = &mut self.data[y * dst_stride..y * dst_stride + w * 4];
            let src_row = &image.rgba8_premul[y * src_stride..y * src_stride + w * 4];
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        }
        Ok(())
    }

    /// Straight-alpha copy suitable for encoding to PNG.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.canvas.width, self.canvas.height, straight)
            .unwrap_or_else(|| image::RgbaImage::new(self.canvas.width, self.canvas.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, px: PremulRgba8) -> PreparedImage {
        let data = px.repeat((width * height) as usize);
        PreparedImage::new(width, height, data)
    }

    #[test]
    fn new_surface_is_blank() {
        let s = Surface::new(Canvas::square(3).unwrap());
        assert!(s.is_blank());
        assert_eq!(s.data().len(), 36);
        assert_eq!(s.pixel(3, 0), None);
    }

    #[test]
    fn draw_image_clips_to_surface() {
        let mut s = Surface::new(Canvas::new(2, 2).unwrap());
        s.draw_image(&solid(4, 1, [255, 0, 0, 255])).unwrap();
        assert_eq!(s.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(s.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn later_draws_sit_on_top() {
        let mut s = Surface::new(Canvas::square(1).unwrap());
        s.draw_image(&solid(1, 1, [255, 0, 0, 255])).unwrap();
        s.draw_image(&solid(1, 1, [0, 255, 0, 255])).unwrap();
        assert_eq!(s.pixel(0, 0), Some([0, 255, 0, 255]));
        s.clear();
        assert!(s.is_blank());
    }

    #[test]
    fn short_buffer_is_rejected_untouched() {
        let mut s = Surface::new(Canvas::new(2, 2).unwrap());
        let bad = PreparedImage {
            width: 2,
            height: 2,
            rgba8_premul: std::sync::Arc::new(vec![255; 4]),
        };
        let err = s.draw_image(&bad).unwrap_err();
        assert!(err.to_string().starts_with("asset error:"), "{err}");
        assert!(s.is_blank());
    }

    #[test]
    fn to_rgba_image_unpremultiplies() {
        let mut s = Surface::new(Canvas::square(1).unwrap());
        s.draw_image(&solid(1, 1, [128, 0, 0, 128])).unwrap();
        let img = s.to_rgba_image();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 128]);
    }
}
