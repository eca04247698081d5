use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    avatar::{compositor::CompositorSettings, fallback::PRIVATE_AVATAR},
    foundation::{
        core::{Canvas, DEFAULT_AVATAR_SIZE},
        error::{AvatarError, AvatarResult},
    },
    recent::DEFAULT_RECENT_CAPACITY,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AvatarConfig {
    /// Surface width and height in pixels.
    pub size: u32,
    pub placeholder: String,
    /// Directory that image URLs are resolved against.
    pub assets_root: PathBuf,
    /// Descriptor catalog JSON.
    pub catalog: Option<PathBuf>,
    pub recent_store: Option<PathBuf>,
    pub recent_capacity: usize,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_AVATAR_SIZE,
            placeholder: PRIVATE_AVATAR.to_string(),
            assets_root: PathBuf::from("."),
            catalog: None,
            recent_store: None,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

impl AvatarConfig {
    pub fn from_json_str(json: &str) -> AvatarResult<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> AvatarResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> AvatarResult<()> {
        if self.size == 0 {
            return Err(AvatarError::validation("size must be > 0"));
        }
        if self.recent_capacity == 0 {
            return Err(AvatarError::validation("recent_capacity must be > 0"));
        }
        if self.placeholder.trim().is_empty() {
            return Err(AvatarError::validation("placeholder must be non-empty"));
        }
        Ok(())
    }

    pub fn canvas(&self) -> AvatarResult<Canvas> {
        Canvas::square(self.size)
    }

    pub fn compositor_settings(&self) -> AvatarResult<CompositorSettings> {
        Ok(CompositorSettings {
            canvas: self.canvas()?,
            placeholder: self.placeholder.clone(),
        })
    }

    /// Configured store path, else `<data dir>/dnavatar/recent.json`.
    pub fn recent_store_path(&self) -> PathBuf {
        if let Some(p) = &self.recent_store {
            return p.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dnavatar")
            .join("recent.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = AvatarConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, AvatarConfig::default());
        assert_eq!(cfg.canvas().unwrap(), Canvas::square(500).unwrap());
        assert_eq!(cfg.compositor_settings().unwrap(), CompositorSettings::default());
    }

    #[test]
    fn fields_override_defaults() {
        let cfg = AvatarConfig::from_json_str(
            r#"{"size": 64, "assets_root": "static", "recent_capacity": 5,
                "recent_store": "/tmp/r.json"}"#,
        )
        .unwrap();
        assert_eq!(cfg.size, 64);
        assert_eq!(cfg.assets_root, PathBuf::from("static"));
        assert_eq!(cfg.recent_capacity, 5);
        assert_eq!(cfg.recent_store_path(), PathBuf::from("/tmp/r.json"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AvatarConfig::from_json_str(r#"{"size": 0}"#).is_err());
        assert!(AvatarConfig::from_json_str(r#"{"recent_capacity": 0}"#).is_err());
        assert!(AvatarConfig::from_json_str(r#"{"placeholder": " "}"#).is_err());
        assert!(AvatarConfig::from_json_str(r#"{"colour": "red"}"#).is_err());
    }

    #[test]
    fn default_store_path_ends_with_app_file() {
        let p = AvatarConfig::default().recent_store_path();
        assert!(p.ends_with("dnavatar/recent.json"));
    }
}
