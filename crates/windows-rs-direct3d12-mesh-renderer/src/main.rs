#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use direct3d12_mesh_renderer::assets::asset_path;
use direct3d12_mesh_renderer::config::RendererConfig;
use direct3d12_mesh_renderer::config::DEFAULT_SCENE_FILE;
use direct3d12_mesh_renderer::error::Result;
use direct3d12_mesh_renderer::mesh::load_scene;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .init();

    let config = RendererConfig::from_args(std::env::args().skip(1))?;
    info!("Starting with {config:?}");

    let scene_path = match &config.scene_path {
        Some(path) => path.clone(),
        None => asset_path(DEFAULT_SCENE_FILE)?,
    };
    let vertices = load_scene(&scene_path)?;

    run(&config, &vertices)
}

#[cfg(windows)]
fn run(config: &RendererConfig, vertices: &[direct3d12_mesh_renderer::vertex::Vertex]) -> Result<()> {
    let exit_code = direct3d12_mesh_renderer::win32::run(config, vertices)?;
    info!("Exiting with code {exit_code}");
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: &RendererConfig, vertices: &[direct3d12_mesh_renderer::vertex::Vertex]) -> Result<()> {
    eyre::bail!(
        "Direct3D 12 is only available on Windows (scene loaded {} vertices)",
        vertices.len()
    )
}
