//! Cover image loading and per-size protocol caching.
//!
//! Remote URLs are never fetched; they render as a broken cover just like a
//! missing file does.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use ratatui::layout::Rect;
use ratatui_image::Resize;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol as ImageProtocol;
use tracing::debug;

const BLUR_SIGMA: f32 = 6.0;
const BLUR_SOURCE_SIZE: (u32, u32) = (96, 144);
const MAX_CACHED_PROTOCOLS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CoverSource {
    File(PathBuf),
    Remote,
    Missing,
}

/// Where a book's `image` value points. Relative paths resolve against
/// `base_dir` (the catalog file's directory) when one is known.
pub(crate) fn classify(image: &str, base_dir: Option<&Path>) -> CoverSource {
    let image = image.trim();
    if image.is_empty() {
        return CoverSource::Missing;
    }
    if let Some(path) = image.strip_prefix("file://") {
        return CoverSource::File(PathBuf::from(path));
    }
    if image.contains("://") || image.starts_with("data:") {
        return CoverSource::Remote;
    }

    let path = PathBuf::from(image);
    if path.is_absolute() {
        return CoverSource::File(path);
    }
    match base_dir {
        Some(base) => CoverSource::File(base.join(path)),
        None => CoverSource::File(path),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum CoverVariant {
    Thumbnail,
    Full,
    Blurred,
}

#[derive(Clone)]
enum CoverState {
    Loaded(Arc<DynamicImage>),
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProtocolKey {
    image: String,
    variant: CoverVariant,
    width: u16,
    height: u16,
}

pub(crate) struct CoverStore {
    base_dir: Option<PathBuf>,
    covers: HashMap<String, CoverState>,
    blurred: HashMap<String, Arc<DynamicImage>>,
    protocols: HashMap<ProtocolKey, ImageProtocol>,
}

impl CoverStore {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir,
            covers: HashMap::new(),
            blurred: HashMap::new(),
            protocols: HashMap::new(),
        }
    }

    fn load(&mut self, image: &str) -> Option<Arc<DynamicImage>> {
        if let Some(state) = self.covers.get(image) {
            return match state {
                CoverState::Loaded(decoded) => Some(Arc::clone(decoded)),
                CoverState::Broken => None,
            };
        }

        let state = match classify(image, self.base_dir.as_deref()) {
            CoverSource::File(path) => match image::open(&path) {
                Ok(decoded) => {
                    debug!(path = %path.display(), "cover decoded");
                    CoverState::Loaded(Arc::new(decoded))
                }
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "cover unavailable");
                    CoverState::Broken
                }
            },
            CoverSource::Remote | CoverSource::Missing => CoverState::Broken,
        };
        self.covers.insert(image.to_string(), state.clone());
        match state {
            CoverState::Loaded(decoded) => Some(decoded),
            CoverState::Broken => None,
        }
    }

    fn load_blurred(&mut self, image: &str) -> Option<Arc<DynamicImage>> {
        if let Some(blurred) = self.blurred.get(image) {
            return Some(Arc::clone(blurred));
        }
        let source = self.load(image)?;
        let (w, h) = BLUR_SOURCE_SIZE;
        let blurred = Arc::new(source.thumbnail(w, h).blur(BLUR_SIGMA));
        self.blurred.insert(image.to_string(), Arc::clone(&blurred));
        Some(blurred)
    }

    /// A render-ready protocol sized for `area`, or `None` for a broken cover.
    pub fn protocol(
        &mut self,
        picker: &Picker,
        image: &str,
        variant: CoverVariant,
        area: Rect,
    ) -> Option<&ImageProtocol> {
        if area.width == 0 || area.height == 0 {
            return None;
        }

        let key = ProtocolKey {
            image: image.to_string(),
            variant,
            width: area.width,
            height: area.height,
        };
        if !self.protocols.contains_key(&key) {
            let source = match variant {
                CoverVariant::Blurred => self.load_blurred(image)?,
                CoverVariant::Thumbnail | CoverVariant::Full => self.load(image)?,
            };
            let size = Rect::new(0, 0, area.width, area.height);
            let resize = Resize::Fit(Some(FilterType::Triangle));
            match picker.new_protocol((*source).clone(), size, resize) {
                Ok(protocol) => {
                    if self.protocols.len() >= MAX_CACHED_PROTOCOLS {
                        self.protocols.clear();
                    }
                    self.protocols.insert(key.clone(), protocol);
                }
                Err(err) => {
                    debug!(image, error = %err, "cover protocol failed");
                    return None;
                }
            }
        }
        self.protocols.get(&key)
    }

    /// Drops every encoded protocol. Decoded covers stay cached; protocols
    /// are re-encoded on the next draw with the picker's current settings.
    pub fn clear_protocols(&mut self) {
        self.protocols.clear();
    }

    #[cfg(test)]
    fn protocol_count(&self) -> usize {
        self.protocols.len()
    }
}
