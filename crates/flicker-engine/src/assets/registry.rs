use crate::assets::manifest::StoryManifest;
use crate::components::sprite::AtlasId;
use glam::Vec2;
use std::collections::HashMap;

/// A resolved background: which atlas the host loaded it into, and its
/// pixel size (needed for aspect-fit placement and letter mapping).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundInfo {
    pub atlas: AtlasId,
    pub size: Vec2,
}

impl BackgroundInfo {
    /// The neutral stand-in for a background that failed to resolve.
    /// The host draws [`AtlasId::PLACEHOLDER`] as a flat surface.
    pub fn placeholder() -> Self {
        Self {
            atlas: AtlasId::PLACEHOLDER,
            size: Vec2::new(800.0, 600.0),
        }
    }
}

/// Registry of named backgrounds, built from a StoryManifest.
///
/// Atlas slots follow the manifest: slot 0 is reserved for the caption
/// font, backgrounds occupy 1..=N in manifest order.
pub struct BackgroundRegistry {
    backgrounds: HashMap<String, BackgroundInfo>,
    count: u32,
}

impl BackgroundRegistry {
    pub fn new() -> Self {
        Self {
            backgrounds: HashMap::new(),
            count: 0,
        }
    }

    /// Build a registry from a parsed StoryManifest.
    pub fn from_manifest(manifest: &StoryManifest) -> Self {
        let mut backgrounds = HashMap::with_capacity(manifest.backgrounds.len());
        for (idx, desc) in manifest.backgrounds.iter().enumerate() {
            backgrounds.insert(
                desc.name.clone(),
                BackgroundInfo {
                    atlas: AtlasId(1 + idx as u32),
                    size: Vec2::new(desc.width, desc.height),
                },
            );
        }
        Self {
            count: manifest.backgrounds.len() as u32,
            backgrounds,
        }
    }

    /// Look up a background by name. Returns None if not found.
    pub fn get(&self, name: &str) -> Option<&BackgroundInfo> {
        self.backgrounds.get(name)
    }

    /// Look up a background, substituting a placeholder when missing.
    /// A missing asset is recoverable: the story continues on a flat
    /// surface and the gap is logged.
    pub fn resolve(&self, name: &str) -> BackgroundInfo {
        match self.backgrounds.get(name) {
            Some(info) => *info,
            None => {
                log::warn!("background '{name}' missing from manifest, using placeholder");
                BackgroundInfo::placeholder()
            }
        }
    }

    /// Number of registered backgrounds. The next free atlas slot for
    /// host-managed textures (e.g. media frames) is `1 + background_count`.
    pub fn background_count(&self) -> u32 {
        self.count
    }
}

impl Default for BackgroundRegistry {
    fn default() -> Self {
        Self::new()
    }
}
