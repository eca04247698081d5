use crate::{
    assets::PreparedImage,
    foundation::{
        core::{Canvas, Rgb8},
        error::AvatarResult,
    },
    render::{composite::source_in_solid_in_place, surface::Surface},
};

/// Fill `image`'s alpha silhouette with a single solid `color`.
///
/// The image is first drawn at the origin of an offscreen surface of `canvas`
/// size, then the whole surface is filled with `color` using source-in. The
/// result therefore has `canvas` dimensions, and artwork outside it is clipped.
/// Fails only if `image`'s buffer does not match its dimensions.
pub fn recolor(
    image: &PreparedImage,
    color: Rgb8,
    canvas: Canvas,
) -> AvatarResult<PreparedImage> {
    let mut offscreen = Surface::new(canvas);
    offscreen.draw_image(image)?;

    let mut pixels = offscreen.data().to_vec();
    source_in_solid_in_place(&mut pixels, color);
    Ok(PreparedImage::new(canvas.width, canvas.height, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask() -> PreparedImage {
        // 3x1: opaque grey, half-transparent blue, fully transparent
        PreparedImage::new(3, 1, vec![80, 80, 80, 255, 0, 0, 128, 128, 0, 0, 0, 0])
    }

    #[test]
    fn recolor_preserves_silhouette_and_applies_color() {
        let canvas = Canvas::new(3, 1).unwrap();
        let red = recolor(&mask(), Rgb8::new(255, 0, 0), canvas).unwrap();
        let green = recolor(&mask(), Rgb8::new(0, 255, 0), canvas).unwrap();

        assert_eq!(red.alpha_mask(), mask().alpha_mask());
        assert_eq!(green.alpha_mask(), mask().alpha_mask());
        assert_eq!(&red.rgba8_premul[..4], &[255, 0, 0, 255]);
        assert_eq!(&green.rgba8_premul[..4], &[0, 255, 0, 255]);
        assert_eq!(&red.rgba8_premul[4..8], &[128, 0, 0, 128]);
        assert_eq!(&red.rgba8_premul[8..], &[0, 0, 0, 0]);
    }

    #[test]
    fn recolor_is_deterministic() {
        let canvas = Canvas::new(3, 1).unwrap();
        let color = Rgb8::new(12, 200, 99);
        let a = recolor(&mask(), color, canvas).unwrap();
        let b = recolor(&mask(), color, canvas).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn recolor_output_has_canvas_size() {
        let canvas = Canvas::new(2, 2).unwrap();
        let out = recolor(&mask(), Rgb8::new(1, 1, 1), canvas).unwrap();
        assert_eq!((out.width, out.height), (2, 2));
        assert_eq!(out.alpha_mask(), vec![255, 128, 0, 0]);
    }

    #[test]
    fn recolor_leaves_input_untouched() {
        let input = mask();
        let before = input.clone();
        let _ = recolor(&input, Rgb8::new(9, 9, 9), Canvas::new(3, 1).unwrap());
        assert_eq!(input, before);
    }

    #[test]
    fn recolor_rejects_truncated_mask() {
        let truncated = PreparedImage {
            width: 3,
            height: 1,
            rgba8_premul: std::sync::Arc::new(vec![0; 4]),
        };
        assert!(recolor(&truncated, Rgb8::new(1, 2, 3), Canvas::new(3, 1).unwrap()).is_err());
    }
}
