//! Dnavatar renders layered avatars.
//!
//! An avatar is six body parts, each described by a remote descriptor naming an
//! outline image and an optional tintable fill. The pipeline:
//!
//! 1. **Fetch**: one [`PartDescriptor`] per [`BodyPart`] from a [`DescriptorSource`], all concurrently
//! 2. **Resolve**: each descriptor becomes a [`LayerSet`] (recolored fill beneath border)
//! 3. **Composite**: once every part has settled, layer sets are blitted onto a
//!    [`Surface`] in [`BodyPart::ALL`] order, regardless of completion order
//! 4. **Fallback**: if any descriptor fails, the surface shows only the placeholder
//!
//! Pixels are premultiplied RGBA8 end-to-end. `unsafe` is forbidden.
#![forbid(unsafe_code)]

mod assets;
mod avatar;
mod config;
mod foundation;
mod recent;
mod render;

pub use assets::PreparedImage;
pub use assets::decode::{decode_any, decode_image, parse_svg, rasterize_svg};
pub use assets::loader::{FsImageLoader, ImageLoader, normalize_url_path};
pub use avatar::compositor::{AvatarCompositor, CompositorSettings, DrawOutcome, DrawSlot};
pub use avatar::descriptor::{CatalogDescriptorSource, DescriptorSource};
pub use avatar::fallback::{PRIVATE_AVATAR, draw_fallback};
pub use avatar::layers::{LayerKind, LayerSet, ResolvedLayer, resolve_layers};
pub use avatar::model::{BodyPart, ColorFill, DescriptorResponse, PartDescriptor, Subject};
pub use avatar::recolor::recolor;
pub use config::AvatarConfig;
pub use foundation::core::{Canvas, DEFAULT_AVATAR_SIZE, Rgb8};
pub use foundation::error::{AvatarError, AvatarResult};
pub use recent::{
    DEFAULT_RECENT_CAPACITY, JsonFileStore, KeyValueStore, MemoryStore, RECENT_USERS_KEY,
    RecentSubjectEntry, RecentSubjects,
};
pub use render::composite::{PremulRgba8, over, source_in_solid};
pub use render::surface::Surface;
