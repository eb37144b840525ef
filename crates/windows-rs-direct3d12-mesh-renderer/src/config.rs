use std::path::PathBuf;

use tracing::warn;

use crate::error::RendererError;
use crate::error::Result;
use crate::pipeline::FillMode;

pub const DEFAULT_SCENE_FILE: &str = "scene.obj";

/// Settings gathered from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererConfig {
    pub use_warp_device: bool,
    pub fill_mode: FillMode,
    /// Sync interval handed to `Present`; 0 presents immediately.
    pub vsync_interval: u32,
    /// `None` means `scene.obj` from the asset directory.
    pub scene_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            fill_mode: FillMode::Solid,
            vsync_interval: 1,
            scene_path: None,
            width: 1280,
            height: 720,
        }
    }
}

impl RendererConfig {
    /// Parses `-flag` / `/flag` style arguments, flags are case insensitive.
    /// The iterator should not include the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let Some(flag) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('/')) else {
                warn!("Ignoring unexpected argument {arg:?}");
                continue;
            };

            match flag.to_ascii_lowercase().as_str() {
                "warp" => config.use_warp_device = true,
                "wireframe" => config.fill_mode = FillMode::Wireframe,
                "vsync" => {
                    let value = expect_value(&mut args, "-vsync")?;
                    config.vsync_interval = parse_vsync(&value)?;
                }
                "scene" => {
                    config.scene_path = Some(PathBuf::from(expect_value(&mut args, "-scene")?));
                }
                "size" => {
                    let value = expect_value(&mut args, "-size")?;
                    (config.width, config.height) = parse_size(&value)?;
                }
                _ => warn!("Ignoring unknown flag {arg:?}"),
            }
        }

        Ok(config)
    }

    pub fn title(&self) -> String {
        let mut title = String::from("D3D12 Mesh Renderer");
        if self.use_warp_device {
            title.push_str(" (WARP)");
        }
        title
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| RendererError::InvalidArgument(format!("{flag} expects a value")).into())
}

fn parse_vsync(value: &str) -> Result<u32> {
    match value.parse::<u32>() {
        // DXGI accepts sync intervals 0 through 4.
        Ok(interval) if interval <= 4 => Ok(interval),
        _ => Err(RendererError::InvalidArgument(format!(
            "-vsync expects an interval between 0 and 4, got {value:?}"
        ))
        .into()),
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let invalid =
        || RendererError::InvalidArgument(format!("-size expects WIDTHxHEIGHT, got {value:?}"));
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width = width.parse::<u32>().map_err(|_| invalid())?;
    let height = height.parse::<u32>().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid().into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let config = RendererConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, RendererConfig::default());
        assert_eq!(config.vsync_interval, 1);
        assert_eq!(config.fill_mode, FillMode::Solid);
    }

    #[test]
    fn accepts_dash_and_slash_flags_in_any_case() {
        let config = RendererConfig::from_args(["/WARP", "-Wireframe"]).unwrap();
        assert!(config.use_warp_device);
        assert_eq!(config.fill_mode, FillMode::Wireframe);
        assert_eq!(config.title(), "D3D12 Mesh Renderer (WARP)");
    }

    #[test]
    fn parses_valued_flags() {
        let config =
            RendererConfig::from_args(["-vsync", "0", "-scene", "cube.obj", "-size", "800x600"])
                .unwrap();
        assert_eq!(config.vsync_interval, 0);
        assert_eq!(config.scene_path, Some(PathBuf::from("cube.obj")));
        assert_eq!((config.width, config.height), (800, 600));
    }

    #[test]
    fn rejects_out_of_range_vsync() {
        let error = RendererConfig::from_args(["-vsync", "9"]).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RendererError>(),
            Some(RendererError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_missing_values() {
        assert!(RendererConfig::from_args(["-scene"]).is_err());
        assert!(RendererConfig::from_args(["-size", "0x600"]).is_err());
        assert!(RendererConfig::from_args(["-size", "wide"]).is_err());
    }

    #[test]
    fn ignores_unknown_flags() {
        let config = RendererConfig::from_args(["-fullscreen", "stray"]).unwrap();
        assert_eq!(config, RendererConfig::default());
    }
}
