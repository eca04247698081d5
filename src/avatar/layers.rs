use crate::{
    assets::{PreparedImage, loader::ImageLoader},
    avatar::{
        model::{ColorFill, PartDescriptor},
        recolor::recolor,
    },
    foundation::{core::Canvas, error::AvatarResult},
    render::surface::Surface,
};

/// Role of a layer within its part. Declaration order is draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    /// Recolored fill establishing the part's color.
    Fill,
    /// Line art drawn over the fill.
    Border,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub kind: LayerKind,
    pub image: PreparedImage,
}

/// Drawable layers of one part, already in draw order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerSet {
    pub layers: Vec<ResolvedLayer>,
    /// Sub-layers the descriptor asked for that failed to load.
    pub missing: Vec<LayerKind>,
}

impl LayerSet {
    pub fn draw_onto(&self, surface: &mut Surface) -> AvatarResult<()> {
        for layer in &self.layers {
            surface.draw_image(&layer.image)?;
        }
        Ok(())
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|l| l.kind).collect()
    }
}

/// Load a descriptor's border and optional fill concurrently.
///
/// Both sub-layers settle before this returns. A sub-layer that fails to load,
/// or loads with a buffer that does not match its dimensions, is logged and
/// recorded in [`LayerSet::missing`]; it never fails the part.
pub async fn resolve_layers(
    loader: &dyn ImageLoader,
    canvas: Canvas,
    descriptor: &PartDescriptor,
) -> LayerSet {
    let border = load_border(loader, &descriptor.border_image);
    let fill = async {
        match &descriptor.color_fill {
            Some(fill) => Some(load_fill(loader, fill, canvas).await),
            None => None,
        }
    };

    let (border, fill) = futures::join!(border, fill);

    let mut set = LayerSet::default();
    match fill {
        Some(Ok(image)) => set.layers.push(ResolvedLayer {
            kind: LayerKind::Fill,
            image,
        }),
        Some(Err(err)) => {
            tracing::warn!(%err, "fill layer dropped");
            set.missing.push(LayerKind::Fill);
        }
        None => {}
    }
    match border {
        Ok(image) => set.layers.push(ResolvedLayer {
            kind: LayerKind::Border,
            image,
        }),
        Err(err) => {
            tracing::warn!(url = %descriptor.border_image, %err, "border layer dropped");
            set.missing.push(LayerKind::Border);
        }
    }
    set
}

async fn load_border(loader: &dyn ImageLoader, url: &str) -> AvatarResult<PreparedImage> {
    let image = loader.load(url).await?;
    image.check()?;
    Ok(image)
}

async fn load_fill(
    loader: &dyn ImageLoader,
    fill: &ColorFill,
    canvas: Canvas,
) -> AvatarResult<PreparedImage> {
    let image = loader.load(&fill.image).await?;
    recolor(&image, fill.rgb, canvas)
}
