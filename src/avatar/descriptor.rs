use std::{collections::BTreeMap, path::Path};

use anyhow::Context;
use futures::future::LocalBoxFuture;

use crate::{
    avatar::model::{BodyPart, DescriptorResponse, PartDescriptor, Subject},
    foundation::error::{AvatarError, AvatarResult},
};

/// Maps a subject and a body part to that part's descriptor.
///
/// This is the boundary to the descriptor service. A returned error is fatal to
/// the whole avatar.
pub trait DescriptorSource {
    fn fetch_part<'a>(
        &'a self,
        subject: &'a Subject,
        part: BodyPart,
    ) -> LocalBoxFuture<'a, AvatarResult<PartDescriptor>>;
}

impl<T: DescriptorSource + ?Sized> DescriptorSource for &T {
    fn fetch_part<'a>(
        &'a self,
        subject: &'a Subject,
        part: BodyPart,
    ) -> LocalBoxFuture<'a, AvatarResult<PartDescriptor>> {
        (**self).fetch_part(subject, part)
    }
}

type PartTable = BTreeMap<BodyPart, DescriptorResponse>;

/// Descriptor responses recorded in a JSON file, keyed by subject then part.
///
/// ```json
/// { "dna":   { "CGAT...": { "body": { "status": "success", "content": { ... } } } },
///   "users": { "42":      { "body": { "status": "fail", "content": "private" } } } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogDescriptorSource {
    #[serde(default)]
    pub dna: BTreeMap<String, PartTable>,
    #[serde(default)]
    pub users: BTreeMap<String, PartTable>,
}

impl CatalogDescriptorSource {
    pub fn from_json_str(json: &str) -> AvatarResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> AvatarResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read descriptor catalog '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, subject: &Subject, part: BodyPart, response: DescriptorResponse) {
        let table = match subject {
            Subject::Dna(_) => &mut self.dna,
            Subject::User(_) => &mut self.users,
        };
        table
            .entry(subject.id().to_string())
            .or_default()
            .insert(part, response);
    }

    fn lookup(&self, subject: &Subject, part: BodyPart) -> AvatarResult<PartDescriptor> {
        let table = match subject {
            Subject::Dna(_) => &self.dna,
            Subject::User(_) => &self.users,
        };
        let response = table
            .get(subject.id())
            .ok_or_else(|| AvatarError::descriptor(format!("unknown subject {subject}")))?
            .get(&part)
            .ok_or_else(|| AvatarError::descriptor(format!("{subject} has no part '{part}'")))?;
        response.clone().into_descriptor()
    }
}

impl DescriptorSource for CatalogDescriptorSource {
    fn fetch_part<'a>(
        &'a self,
        subject: &'a Subject,
        part: BodyPart,
    ) -> LocalBoxFuture<'a, AvatarResult<PartDescriptor>> {
        Box::pin(async move { self.lookup(subject, part) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "dna": {
            "CGAT": {
                "nose": {"status": "success", "content": {"border_image": "/n.png", "color_image": null}}
            }
        },
        "users": {
            "9": {
                "nose": {"status": "fail", "content": "You are not allowed to view this user"}
            }
        }
    }"#;

    #[test]
    fn catalog_resolves_known_parts() {
        let catalog = CatalogDescriptorSource::from_json_str(CATALOG).unwrap();
        let subject = Subject::Dna("CGAT".into());
        let d = pollster::block_on(catalog.fetch_part(&subject, BodyPart::Nose)).unwrap();
        assert_eq!(d.border_image, "/n.png");
    }

    #[test]
    fn catalog_failures_are_descriptor_errors() {
        let catalog = CatalogDescriptorSource::from_json_str(CATALOG).unwrap();

        let private = Subject::User("9".into());
        let err = pollster::block_on(catalog.fetch_part(&private, BodyPart::Nose)).unwrap_err();
        assert!(err.to_string().contains("not allowed"));

        let unknown = Subject::User("CGAT".into());
        let err = pollster::block_on(catalog.fetch_part(&unknown, BodyPart::Nose)).unwrap_err();
        assert!(matches!(err, AvatarError::Descriptor(_)));

        let missing_part = Subject::Dna("CGAT".into());
        assert!(pollster::block_on(catalog.fetch_part(&missing_part, BodyPart::Body)).is_err());
    }

    #[test]
    fn insert_then_lookup() {
        let mut catalog = CatalogDescriptorSource::default();
        let subject = Subject::User("1".into());
        let d = PartDescriptor {
            border_image: "/b.png".into(),
            color_fill: None,
        };
        catalog.insert(
            &subject,
            BodyPart::Body,
            DescriptorResponse::success(&d).unwrap(),
        );
        assert_eq!(catalog.lookup(&subject, BodyPart::Body).unwrap(), d);
    }
}
