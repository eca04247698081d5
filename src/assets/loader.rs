use std::path::{Path, PathBuf};

use futures::future::LocalBoxFuture;

use crate::{
    assets::{PreparedImage, decode::decode_any},
    foundation::error::{AvatarError, AvatarResult},
};

/// Resolves a URL into a decoded, drawable image.
///
/// Every call is an independent load; implementations must not cache across calls.
pub trait ImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, AvatarResult<PreparedImage>>;
}

impl<T: ImageLoader + ?Sized> ImageLoader for &T {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, AvatarResult<PreparedImage>> {
        (**self).load(url)
    }
}

/// Loads image URLs from a local directory that mirrors the site's static root.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, url: &str) -> AvatarResult<PathBuf> {
        let rel = normalize_url_path(url)?;
        Ok(self.root.join(rel))
    }

    fn load_sync(&self, url: &str) -> AvatarResult<PreparedImage> {
        let path = self.resolve(url)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            AvatarError::asset(format!("read '{}' for '{url}': {e}", path.display()))
        })?;
        decode_any(&path.to_string_lossy(), &bytes)
            .map_err(|e| AvatarError::asset(format!("decode '{url}': {e}")))
    }
}

impl ImageLoader for FsImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, AvatarResult<PreparedImage>> {
        Box::pin(async move {
            let image = self.load_sync(url)?;
            tracing::trace!(url, width = image.width, height = image.height, "image loaded");
            Ok(image)
        })
    }
}

/// Reduce an image URL to a normalized relative path.
///
/// Accepts site-absolute paths (`/img/a.png`), relative paths and absolute
/// `http(s)://` or `file://` URLs, of which only the path is kept.
pub fn normalize_url_path(source: &str) -> AvatarResult<String> {
    let raw = if source.contains("://") {
        let parsed = url::Url::parse(source)
            .map_err(|e| AvatarError::validation(format!("invalid image url '{source}': {e}")))?;
        parsed.path().to_string()
    } else {
        let without_query = source.split(['?', '#']).next().unwrap_or_default();
        without_query.to_string()
    };

    let s = raw.replace('\\', "/");
    if s.is_empty() {
        return Err(AvatarError::validation("image path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(AvatarError::validation("image paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(AvatarError::validation(
            "image path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}
