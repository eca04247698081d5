use futures::future::{AbortHandle, AbortRegistration, Abortable, join_all};

use crate::{
    assets::loader::ImageLoader,
    avatar::{
        descriptor::DescriptorSource,
        fallback::{PRIVATE_AVATAR, draw_fallback},
        layers::{LayerSet, resolve_layers},
        model::{BodyPart, Subject},
    },
    foundation::{core::Canvas, error::AvatarResult},
    render::surface::Surface,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositorSettings {
    /// Size of every offscreen layer; recolored fills are allocated at this size.
    pub canvas: Canvas,
    /// Image drawn instead of the avatar when any part descriptor fails.
    pub placeholder: String,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            placeholder: PRIVATE_AVATAR.to_string(),
        }
    }
}

/// How a draw request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Every part resolved and was blitted in z-order.
    Rendered {
        layers_drawn: usize,
        /// Sub-layers dropped because their image failed to load.
        layers_missing: usize,
    },
    /// A part descriptor failed; the surface shows only the placeholder.
    Placeholder { part: BodyPart, reason: String },
    /// Superseded before anything was blitted.
    Cancelled,
}

/// Draws avatars by resolving every body part concurrently and blitting once.
pub struct AvatarCompositor<'a> {
    descriptors: &'a dyn DescriptorSource,
    loader: &'a dyn ImageLoader,
    settings: CompositorSettings,
}

impl std::fmt::Debug for AvatarCompositor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarCompositor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<'a> AvatarCompositor<'a> {
    pub fn new(
        descriptors: &'a dyn DescriptorSource,
        loader: &'a dyn ImageLoader,
        settings: CompositorSettings,
    ) -> Self {
        Self {
            descriptors,
            loader,
            settings,
        }
    }

    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// A blank surface matching the configured canvas.
    pub fn new_surface(&self) -> Surface {
        Surface::new(self.settings.canvas)
    }

    /// Draw `subject` onto `surface`.
    ///
    /// The surface is cleared first and stays blank until every part has
    /// settled. Parts are then blitted in [`BodyPart::ALL`] order, never in
    /// completion order. A failed descriptor for any part replaces the whole
    /// avatar with the placeholder.
    #[tracing::instrument(skip(self, subject, surface), fields(subject = %subject))]
    pub async fn draw_avatar(
        &self,
        subject: &Subject,
        surface: &mut Surface,
    ) -> AvatarResult<DrawOutcome> {
        surface.clear();
        let parts = self.resolve_parts(subject).await;

        let mut sets = Vec::with_capacity(parts.len());
        for (part, result) in parts {
            match result {
                Ok(set) => sets.push(set),
                Err(err) => {
                    tracing::warn!(%part, %err, "part descriptor failed, drawing placeholder");
                    draw_fallback(self.loader, &self.settings.placeholder, surface).await?;
                    return Ok(DrawOutcome::Placeholder {
                        part,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let mut layers_drawn = 0;
        let mut layers_missing = 0;
        for set in &sets {
            set.draw_onto(surface)?;
            layers_drawn += set.layers.len();
            layers_missing += set.missing.len();
        }
        tracing::debug!(layers_drawn, layers_missing, "avatar blitted");
        Ok(DrawOutcome::Rendered {
            layers_drawn,
            layers_missing,
        })
    }

    /// Like [`Self::draw_avatar`], but gives up once `registration`'s handle is aborted.
    ///
    /// Aborting is observed only while waiting on I/O, so a cancelled draw never
    /// leaves part artwork on the surface.
    pub async fn draw_avatar_abortable(
        &self,
        subject: &Subject,
        surface: &mut Surface,
        registration: AbortRegistration,
    ) -> AvatarResult<DrawOutcome> {
        match Abortable::new(self.draw_avatar(subject, surface), registration).await {
            Ok(outcome) => outcome,
            Err(_aborted) => {
                tracing::debug!(%subject, "draw superseded");
                Ok(DrawOutcome::Cancelled)
            }
        }
    }

    /// Resolve every part concurrently, returned in part order once all have settled.
    pub async fn resolve_parts(
        &self,
        subject: &Subject,
    ) -> Vec<(BodyPart, AvatarResult<LayerSet>)> {
        let pending = BodyPart::ALL.map(|part| async move {
            let result = self.resolve_part(subject, part).await;
            (part, result)
        });
        join_all(pending).await
    }

    async fn resolve_part(&self, subject: &Subject, part: BodyPart) -> AvatarResult<LayerSet> {
        let descriptor = self.descriptors.fetch_part(subject, part).await?;
        let set = resolve_layers(self.loader, self.settings.canvas, &descriptor).await;
        tracing::debug!(
            %part,
            layers = set.layers.len(),
            missing = set.missing.len(),
            "part resolved"
        );
        Ok(set)
    }
}

/// Tracks the in-flight draw for one surface so a newer request can supersede it.
#[derive(Debug, Default)]
pub struct DrawSlot {
    current: Option<AbortHandle>,
}

impl DrawSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the previous draw, if any, and register a new one.
    pub fn begin(&mut self) -> AbortRegistration {
        self.cancel();
        let (handle, registration) = AbortHandle::new_pair();
        self.current = Some(handle);
        registration
    }

    pub fn cancel(&mut self) {
        if let Some(prev) = self.current.take() {
            prev.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_aborted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_500px_and_private_placeholder() {
        let s = CompositorSettings::default();
        assert_eq!(s.canvas, Canvas::square(500).unwrap());
        assert_eq!(s.placeholder, "/img/avatar/private.svg");
    }

    #[test]
    fn draw_slot_aborts_previous_registration() {
        let mut slot = DrawSlot::new();
        assert!(!slot.is_active());

        let first = slot.begin();
        assert!(slot.is_active());
        let _second = slot.begin();

        let res = pollster::block_on(Abortable::new(async { 1 }, first));
        assert!(res.is_err(), "first registration should be aborted");
        assert!(slot.is_active());

        slot.cancel();
        assert!(!slot.is_active());
    }
}
