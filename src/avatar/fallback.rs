use crate::{
    assets::loader::ImageLoader, foundation::error::AvatarResult, render::surface::Surface,
};

/// Well-known placeholder shown when a subject's appearance cannot be resolved.
pub const PRIVATE_AVATAR: &str = "/img/avatar/private.svg";

/// Clear `surface` and draw the placeholder at `placeholder_url`.
///
/// If the placeholder itself fails to load the surface is left cleared and the
/// error is returned.
#[tracing::instrument(skip(loader, surface))]
pub async fn draw_fallback(
    loader: &dyn ImageLoader,
    placeholder_url: &str,
    surface: &mut Surface,
) -> AvatarResult<()> {
    surface.clear();
    let image = loader.load(placeholder_url).await?;
    surface.draw_image(&image)
}
