use serde::{Deserialize, Serialize};

/// A triangle surface mesh in physical units, the 3D counterpart of a 2D
/// contour.
///
/// Triangles index into the shared vertex list. Meshes produced by the
/// detection extractor are closed surfaces built from the exposed faces of a
/// voxel region.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Mesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[usize; 3]>) -> Self {
        Mesh {
            vertices,
            triangles,
        }
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
}
