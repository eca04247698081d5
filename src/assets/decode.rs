use anyhow::Context;

use crate::{
    assets::PreparedImage,
    foundation::error::{AvatarError, AvatarResult},
    render::composite::premultiply_rgba8_in_place,
};

// Avoid pathological allocations from hostile SVG documents.
const MAX_SVG_DIM: u32 = 16_384;
const SNIFF_LEN: usize = 1024;
const DOCTYPE: &str = "<!doctype";

pub fn decode_image(bytes: &[u8]) -> AvatarResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    PreparedImage::try_new(width, height, rgba8_premul)
}

pub fn parse_svg(bytes: &[u8]) -> AvatarResult<usvg::Tree> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(tree)
}

/// Rasterize `tree` at its intrinsic size into premultiplied RGBA8.
pub fn rasterize_svg(tree: &usvg::Tree) -> AvatarResult<PreparedImage> {
    fn to_px(v: f32) -> AvatarResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(AvatarError::asset("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;
    if width > MAX_SVG_DIM || height > MAX_SVG_DIM {
        return Err(AvatarError::asset(format!(
            "svg raster size too large: {width}x{height} (max {MAX_SVG_DIM}x{MAX_SVG_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| AvatarError::asset("failed to allocate svg pixmap"))?;
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    PreparedImage::try_new(width, height, pixmap.take())
}

/// Decode raster or SVG bytes. `name` is the resource path or URL, used as a format hint;
/// any query or fragment is ignored.
pub fn decode_any(name: &str, bytes: &[u8]) -> AvatarResult<PreparedImage> {
    if is_svg(name, bytes) {
        let tree = parse_svg(bytes)?;
        return rasterize_svg(&tree);
    }
    decode_image(bytes)
}

fn is_svg(name: &str, bytes: &[u8]) -> bool {
    let path = name.split(['?', '#']).next().unwrap_or_default();
    if path.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(SNIFF_LEN)]);
    let mut rest = head.trim_start_matches('\u{feff}').trim_start();
    loop {
        if rest.starts_with("<svg") {
            return true;
        }
        if let Some(decl) = rest
            .get(..DOCTYPE.len())
            .filter(|p| p.eq_ignore_ascii_case(DOCTYPE))
            .map(|_| &rest[DOCTYPE.len()..])
        {
            let decl = decl.split('>').next().unwrap_or_default();
            return decl.trim_start().to_ascii_lowercase().starts_with("svg");
        }
        let end = if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<?") {
            "?>"
        } else {
            return false;
        };
        match rest.find(end) {
            Some(i) => rest = rest[i + end.len()..].trim_start(),
            None => return false,
        }
    }
}
