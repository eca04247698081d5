use std::{fmt, str::FromStr};

use crate::foundation::{
    core::Rgb8,
    error::{AvatarError, AvatarResult},
};

/// Body parts in compositing order: earlier parts are drawn beneath later ones.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Body,
    Ears,
    Head,
    Mouth,
    Eyes,
    Nose,
}

impl BodyPart {
    /// The z-order contract. Adding a part means redefining the visual stack.
    pub const ALL: [Self; 6] = [
        Self::Body,
        Self::Ears,
        Self::Head,
        Self::Mouth,
        Self::Eyes,
        Self::Nose,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Ears => "ears",
            Self::Head => "head",
            Self::Mouth => "mouth",
            Self::Eyes => "eyes",
            Self::Nose => "nose",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyPart {
    type Err = AvatarError;

    fn from_str(s: &str) -> AvatarResult<Self> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| AvatarError::validation(format!("unknown body part '{s}'")))
    }
}

/// Whose appearance is being drawn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subject {
    /// Procedurally specified appearance.
    Dna(String),
    /// Stored, possibly access-restricted appearance.
    User(String),
}

impl Subject {
    pub fn id(&self) -> &str {
        match self {
            Self::Dna(s) | Self::User(s) => s,
        }
    }

    /// Descriptor service endpoint for this subject kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Dna(_) => "/api/part_from_dna",
            Self::User(_) => "/api/part_from_user",
        }
    }

    /// Form fields of a descriptor request for `part`.
    pub fn request_fields(&self, part: BodyPart) -> [(&'static str, String); 2] {
        match self {
            Self::Dna(dna) => [("dna", dna.clone()), ("part", part.name().to_string())],
            Self::User(id) => [("id", id.clone()), ("part", part.name().to_string())],
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dna(dna) => write!(f, "dna:{dna}"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Server-supplied artwork for one body part.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartDescriptor {
    #[serde(rename = "border_image", alias = "borderImage")]
    pub border_image: String,
    #[serde(rename = "color_image", alias = "colorFill", default)]
    pub color_fill: Option<ColorFill>,
}

impl PartDescriptor {
    pub fn validate(&self) -> AvatarResult<()> {
        if self.border_image.trim().is_empty() {
            return Err(AvatarError::descriptor("border_image must be non-empty"));
        }
        if let Some(fill) = &self.color_fill
            && fill.image.trim().is_empty()
        {
            return Err(AvatarError::descriptor("color_image.image must be non-empty"));
        }
        Ok(())
    }
}

/// Tintable fill artwork; both fields are required together.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorFill {
    pub image: String,
    pub rgb: Rgb8,
}

/// Envelope returned by both descriptor endpoints.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DescriptorResponse {
    pub status: String,
    pub content: serde_json::Value,
}

impl DescriptorResponse {
    pub const SUCCESS: &'static str = "success";

    pub fn success(descriptor: &PartDescriptor) -> AvatarResult<Self> {
        Ok(Self {
            status: Self::SUCCESS.to_string(),
            content: serde_json::to_value(descriptor)?,
        })
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            content: serde_json::Value::String(message.into()),
        }
    }

    /// Unwrap the envelope. Any status other than `success` is a descriptor failure.
    pub fn into_descriptor(self) -> AvatarResult<PartDescriptor> {
        if self.status != Self::SUCCESS {
            let message = match self.content {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(AvatarError::descriptor(message));
        }
        let descriptor: PartDescriptor = serde_json::from_value(self.content)
            .map_err(|e| AvatarError::descriptor(format!("malformed part descriptor: {e}")))?;
        descriptor.validate()?;
        Ok(descriptor)
    }
}
