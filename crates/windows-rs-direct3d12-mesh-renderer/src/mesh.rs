use std::io::BufRead;
use std::path::Path;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::RendererError;
use crate::error::Result;
use crate::vertex::Vertex;

/// Color for faces that reference no material, or a material without a
/// diffuse term.
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Loads an OBJ scene (and the MTL libraries it references) into a flat,
/// non-indexed vertex list: three vertices per triangle, each colored with
/// its face's diffuse material color.
pub fn load_scene(path: &Path) -> Result<Vec<Vertex>> {
    let (models, materials) = tobj::load_obj(path, &load_options())
        .map_err(|e| scene_error(path, e.to_string()))?;
    finish_load(path, &models, materials)
}

/// Same as [`load_scene`], reading the OBJ text from `reader` and resolving
/// material libraries through `material_loader`.
pub fn load_scene_from_reader<B, ML>(
    path: &Path,
    reader: &mut B,
    material_loader: ML,
) -> Result<Vec<Vertex>>
where
    B: BufRead,
    ML: Fn(&Path) -> tobj::MTLLoadResult,
{
    let (models, materials) = tobj::load_obj_buf(reader, &load_options(), material_loader)
        .map_err(|e| scene_error(path, e.to_string()))?;
    finish_load(path, &models, materials)
}

fn finish_load(
    path: &Path,
    models: &[tobj::Model],
    materials: std::result::Result<Vec<tobj::Material>, tobj::LoadError>,
) -> Result<Vec<Vertex>> {
    let materials = materials.unwrap_or_else(|e| {
        warn!("No usable materials for {path:?} ({e}), faces will use the default color");
        Vec::new()
    });

    let vertices = flatten_models(models, &materials);
    if vertices.is_empty() {
        error!("Scene {path:?} contains no triangles");
        return Err(RendererError::EmptyMesh.into());
    }

    info!(
        "Loaded {:?}: {} models, {} materials, {} triangles",
        path,
        models.len(),
        materials.len(),
        vertices.len() / 3
    );
    Ok(vertices)
}

fn scene_error(path: &Path, message: String) -> eyre::Report {
    error!("Failed to load scene {path:?}: {message}");
    RendererError::SceneLoad {
        path: path.to_path_buf(),
        message,
    }
    .into()
}

/// Expands indexed models into one vertex per face corner.
pub fn flatten_models(models: &[tobj::Model], materials: &[tobj::Material]) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for model in models {
        let mesh = &model.mesh;
        let color = face_color(mesh.material_id, materials, &model.name);

        // Drop any trailing partial face.
        let corner_count = mesh.indices.len() - mesh.indices.len() % 3;
        vertices.reserve(corner_count);
        for &index in &mesh.indices[..corner_count] {
            let offset = 3 * index as usize;
            vertices.push(Vertex::new(
                [
                    mesh.positions[offset],
                    mesh.positions[offset + 1],
                    mesh.positions[offset + 2],
                ],
                color,
            ));
        }
    }
    vertices
}

fn face_color(material_id: Option<usize>, materials: &[tobj::Material], model: &str) -> [f32; 4] {
    let Some(id) = material_id else {
        return DEFAULT_COLOR;
    };
    match materials.get(id).and_then(|material| material.diffuse) {
        Some([r, g, b]) => [r, g, b, 1.0],
        None => {
            warn!("Model {model:?} references material {id} without a diffuse color");
            DEFAULT_COLOR
        }
    }
}
