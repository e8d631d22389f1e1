//! # Font Resolution
//!
//! Maps a font identifier from label source (`0`, `A`, `E:ARIAL.TTF`, ...) to
//! a font file on disk.
//!
//! ## Fallback Chain
//!
//! ```text
//! identifier ──exists?──► use it
//!     │ no
//!     ▼
//! "DEFAULT" ──exists?──► use it
//!     │ no
//!     ▼
//! ultimate fallback ──exists?──► use it
//!     │ no
//!     ▼
//!   None (caller skips the draw)
//! ```
//!
//! Every candidate is checked through a [`FileProbe`] at lookup time; a map
//! entry is never trusted just because it is present.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use serde::Deserialize;

/// Map key consulted when an identifier does not resolve.
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Resident font letters mapped to a monospace face.
const MONOSPACE_IDS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

// ============================================================================
// FONT SOURCE
// ============================================================================

/// A font file path plus the face index inside a font collection.
///
/// Map values use the `path,index` form for collections, e.g.
/// `/System/Library/Fonts/Helvetica.ttc,1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSource {
    pub path: PathBuf,
    pub index: u32,
}

impl FontSource {
    /// Parse a map value, splitting off a trailing `,index` when present.
    ///
    /// ```
    /// use etiqueta::fonts::FontSource;
    ///
    /// let src = FontSource::parse("/fonts/a.ttc,2");
    /// assert_eq!(src.index, 2);
    /// assert_eq!(FontSource::parse("/fonts/b.ttf").index, 0);
    /// ```
    pub fn parse(value: &str) -> Self {
        if let Some((path, index)) = value.rsplit_once(',') {
            if let Ok(index) = index.trim().parse::<u32>() {
                return Self {
                    path: PathBuf::from(path.trim()),
                    index,
                };
            }
        }
        Self {
            path: PathBuf::from(value.trim()),
            index: 0,
        }
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{},{}", self.path.display(), self.index)
        }
    }
}

// ============================================================================
// FILE PROBE
// ============================================================================

/// Existence check used by every resolution step.
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Checks the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileProbe;

impl FileProbe for StdFileProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

// ============================================================================
// PLATFORM CANDIDATES
// ============================================================================

/// Operating system family, used to pick font candidate lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }
}

/// Ordered candidates for the ultimate fallback font.
pub fn probe_candidates(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[
            r"C:\Windows\Fonts\arial.ttf",
            r"C:\Windows\Fonts\segoeui.ttf",
            r"C:\Windows\Fonts\tahoma.ttf",
        ],
        Platform::MacOs => &[
            "/System/Library/Fonts/Helvetica.ttc,0",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
        ],
        Platform::Linux | Platform::Other => &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        ],
    }
}

/// Ordered candidates for the `DEFAULT` entry and scalable font `0`
/// (a bold, preferably condensed sans).
pub fn default_candidates(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[
            r"C:\Windows\Fonts\arialnb.ttf",
            r"C:\Windows\Fonts\arialbd.ttf",
        ],
        Platform::MacOs => &[
            "/System/Library/Fonts/Supplemental/Arial Narrow Bold.ttf",
            "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
            "/System/Library/Fonts/Helvetica.ttc,1",
        ],
        Platform::Linux | Platform::Other => &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSansCondensed-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSansNarrow-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ],
    }
}

/// Ordered candidates for the fixed-width resident fonts `A`–`H`.
pub fn monospace_candidates(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &[r"C:\Windows\Fonts\consola.ttf", r"C:\Windows\Fonts\cour.ttf"],
        Platform::MacOs => &[
            "/System/Library/Fonts/Menlo.ttc,0",
            "/System/Library/Fonts/Supplemental/Courier New.ttf",
        ],
        Platform::Linux | Platform::Other => &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        ],
    }
}

/// The first candidate whose file exists.
pub fn first_existing(candidates: &[&str], probe: &dyn FileProbe) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| probe.exists(&FontSource::parse(candidate).path))
        .map(|candidate| candidate.to_string())
}

// ============================================================================
// FONT MAP
// ============================================================================

/// Case-insensitive map from font identifier to font file (`path[,index]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, String>")]
pub struct FontMap {
    entries: HashMap<String, String>,
}

impl FontMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. Keys are matched case-insensitively.
    pub fn insert(&mut self, id: impl AsRef<str>, value: impl Into<String>) {
        self.entries.insert(id.as_ref().to_uppercase(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(&id.to_uppercase()).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(&id.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by identifier.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort();
        entries
    }

    /// Copy every entry of `other` over this map.
    pub fn extend(&mut self, other: &FontMap) {
        for (id, value) in &other.entries {
            self.entries.insert(id.clone(), value.clone());
        }
    }
}

impl From<HashMap<String, String>> for FontMap {
    fn from(raw: HashMap<String, String>) -> Self {
        let mut map = FontMap::new();
        for (id, value) in raw {
            map.insert(id, value);
        }
        map
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves font identifiers through the fallback chain.
///
/// Built once per render: the platform candidate lists are probed a single
/// time to fill the `DEFAULT` entry and the ultimate fallback.
pub struct FontResolver {
    map: FontMap,
    fallback: Option<String>,
    probe: Arc<dyn FileProbe>,
}

impl fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontResolver")
            .field("map", &self.map)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl FontResolver {
    /// Probe the platform candidates, then layer `overrides` on top.
    pub fn probe(platform: Platform, overrides: Option<&FontMap>, probe: Arc<dyn FileProbe>) -> Self {
        let mut map = FontMap::new();

        let default = first_existing(default_candidates(platform), probe.as_ref());
        if let Some(path) = &default {
            map.insert("0", path.clone());
        }
        if let Some(mono) = first_existing(monospace_candidates(platform), probe.as_ref()) {
            for id in MONOSPACE_IDS {
                map.insert(id, mono.clone());
            }
        }

        if let Some(overrides) = overrides {
            map.extend(overrides);
        }

        if !map.contains(DEFAULT_KEY) {
            if let Some(path) = default {
                map.insert(DEFAULT_KEY, path);
            }
        }

        let fallback = first_existing(probe_candidates(platform), probe.as_ref());
        if fallback.is_none() {
            warn!("No fallback font found among {:?} candidates", platform);
        }

        Self {
            map,
            fallback,
            probe,
        }
    }

    /// Build from an explicit map and fallback, without platform probing.
    pub fn with_map(map: FontMap, fallback: Option<String>, probe: Arc<dyn FileProbe>) -> Self {
        Self {
            map,
            fallback,
            probe,
        }
    }

    pub fn map(&self) -> &FontMap {
        &self.map
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Resolve an identifier to a font file that exists right now.
    pub fn resolve(&self, identifier: &str) -> Option<FontSource> {
        if let Some(source) = self.live_entry(identifier) {
            return Some(source);
        }

        if !identifier.eq_ignore_ascii_case(DEFAULT_KEY) {
            if let Some(source) = self.live_entry(DEFAULT_KEY) {
                debug!("Font {:?} unavailable, using DEFAULT", identifier);
                return Some(source);
            }
        }

        if let Some(source) = self.fallback.as_deref().and_then(|v| self.live(v)) {
            debug!("Font {:?} unavailable, using fallback {}", identifier, source);
            return Some(source);
        }

        None
    }

    fn live_entry(&self, id: &str) -> Option<FontSource> {
        self.map.get(id).and_then(|value| self.live(value))
    }

    fn live(&self, value: &str) -> Option<FontSource> {
        let source = FontSource::parse(value);
        self.probe.exists(&source.path).then_some(source)
    }
}

// ============================================================================
// TESTS
// ============================================================================
