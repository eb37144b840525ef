use std::path::Path;
use std::path::PathBuf;

use eyre::eyre;
use eyre::WrapErr;
use tracing::warn;

use crate::error::Result;

/// Finds an asset next to the executable, falling back to the crate's
/// `assets/` directory (useful when running through cargo).
pub fn asset_path(name: &str) -> Result<PathBuf> {
    let exe_path = std::env::current_exe().wrap_err("Failed to get executable path")?;
    let exe_dir = exe_path
        .parent()
        .ok_or_else(|| eyre!("Executable path {exe_path:?} has no parent directory"))?;
    let development_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
    find_asset(name, &[exe_dir, development_dir.as_path()])
}

pub(crate) fn find_asset(name: &str, search_dirs: &[&Path]) -> Result<PathBuf> {
    for (i, dir) in search_dirs.iter().enumerate() {
        let candidate = dir.join(name);
        if candidate.exists() {
            if i > 0 {
                warn!("{name} not found next to executable, using {candidate:?}");
            }
            return Ok(candidate);
        }
    }
    Err(eyre!("{name} not found in any of {search_dirs:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_bundled_assets() {
        let path = asset_path("shaders.hlsl").unwrap();
        assert!(path.ends_with("shaders.hlsl"));
        assert!(path.exists());
    }

    #[test]
    fn falls_back_to_later_directories() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let src = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
        let path = find_asset("scene.obj", &[src.as_path(), assets.as_path()]).unwrap();
        assert_eq!(path, assets.join("scene.obj"));
    }

    #[test]
    fn reports_missing_assets() {
        let assets = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        assert!(find_asset("does-not-exist.hlsl", &[assets.as_path()]).is_err());
    }
}
