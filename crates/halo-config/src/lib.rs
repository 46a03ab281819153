//! Bounds-check configuration.
//!
//! spec.md §6 describes two build-time toggles ("two boolean toggles
//! controlling runtime bounds checks on Tile element access and Layout
//! dimension arguments respectively. Default off in release"). §9's design
//! notes rule out mutable process-wide state for these: they're modeled here
//! as a plain struct consulted at construction, the same way
//! `core-config::Config` is loaded once and then handed around by value/ref
//! rather than read from a global.
//!
//! The compiled-in default is driven by the `check-bounds-tile` /
//! `check-bounds-layout` Cargo features (both off by default); callers can
//! always override it explicitly, and [`BoundsCheck::load_from`] layers an
//! optional `halo.toml` file on top, mirroring `core-config`'s
//! discover-then-load flow.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether element-access / dimension-argument bounds checks are enabled.
///
/// Consulted once at `Layout`/`Tile` construction time; never mutated
/// afterward, and never read from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsCheck {
    /// Check `Tile` element-access indices against the halo-inclusive range.
    pub tile: bool,
    /// Check `Layout` dimension arguments against `0..N`.
    pub layout: bool,
}

impl Default for BoundsCheck {
    fn default() -> Self {
        Self {
            tile: cfg!(feature = "check-bounds-tile"),
            layout: cfg!(feature = "check-bounds-layout"),
        }
    }
}

impl BoundsCheck {
    pub const fn new(tile: bool, layout: bool) -> Self {
        Self { tile, layout }
    }

    pub const fn disabled() -> Self {
        Self::new(false, false)
    }

    pub const fn enabled() -> Self {
        Self::new(true, true)
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
struct BoundsCheckTable {
    #[serde(default)]
    tile: bool,
    #[serde(default)]
    layout: bool,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
struct ConfigFile {
    #[serde(default)]
    bounds_check: BoundsCheckTable,
}

/// Best-effort `halo.toml` discovery: prefer the current working directory.
pub fn discover() -> PathBuf {
    PathBuf::from("halo.toml")
}

/// Load `BoundsCheck` from an optional `halo.toml` path, falling back to
/// `path`'s absence or a parse failure to the compiled-in
/// [`BoundsCheck::default`]. Never errors: a missing or malformed config file
/// is not a reason to fail construction.
pub fn load_from(path: Option<&Path>) -> BoundsCheck {
    let default = BoundsCheck::default();
    let path = path.map(Path::to_path_buf).unwrap_or_else(discover);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return default;
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let resolved = BoundsCheck::new(file.bounds_check.tile, file.bounds_check.layout);
            debug!(
                target: "halo_config",
                path = %path.display(),
                tile = resolved.tile,
                layout = resolved.layout,
                "bounds_check_loaded"
            );
            resolved
        }
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_compiled_features() {
        let d = BoundsCheck::default();
        assert_eq!(d.tile, cfg!(feature = "check-bounds-tile"));
        assert_eq!(d.layout, cfg!(feature = "check-bounds-layout"));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let resolved = load_from(Some(Path::new("__does_not_exist_halo__.toml")));
        assert_eq!(resolved, BoundsCheck::default());
    }

    #[test]
    fn parses_bounds_check_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[bounds_check]\ntile = true\nlayout = false\n").unwrap();
        let resolved = load_from(Some(tmp.path()));
        assert_eq!(resolved, BoundsCheck::new(true, false));
    }

    #[test]
    fn malformed_file_falls_back_to_default() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not valid toml [[[").unwrap();
        let resolved = load_from(Some(tmp.path()));
        assert_eq!(resolved, BoundsCheck::default());
    }

    #[test]
    fn explicit_construction_overrides_defaults() {
        let explicit = BoundsCheck::enabled();
        assert!(explicit.tile);
        assert!(explicit.layout);
    }
}
