use std::collections::{HashMap, HashSet};

use crate::annotations::mesh::Mesh;
use crate::image_utils::interval::Interval;

/// Offsets of the four corners of each exposed face, per face direction.
/// A voxel at (x, y, z) occupies the unit cube [x, x+1] x [y, y+1] x [z, z+1].
const FACES: [([i64; 3], [[i64; 3]; 4]); 6] = [
    // -x
    ([-1, 0, 0], [[0, 0, 0], [0, 1, 0], [0, 1, 1], [0, 0, 1]]),
    // +x
    ([1, 0, 0], [[1, 0, 0], [1, 0, 1], [1, 1, 1], [1, 1, 0]]),
    // -y
    ([0, -1, 0], [[0, 0, 0], [0, 0, 1], [1, 0, 1], [1, 0, 0]]),
    // +y
    ([0, 1, 0], [[0, 1, 0], [1, 1, 0], [1, 1, 1], [0, 1, 1]]),
    // -z
    ([0, 0, -1], [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]),
    // +z
    ([0, 0, 1], [[0, 0, 1], [0, 1, 1], [1, 1, 1], [1, 0, 1]]),
];

/// Builds the surface mesh of a voxel region from its exposed faces: every
/// face whose neighboring voxel is outside the region contributes two
/// triangles. Vertices land on the integer corner grid, converted to physical
/// units through the volume's interval and calibration, and are shared
/// between adjacent faces.
pub(crate) fn mesh_from_voxels(
    pixels: &[[usize; 3]],
    interval: &Interval,
    calibration: &[f64],
) -> Mesh {
    let occupied: HashSet<[i64; 3]> = pixels
        .iter()
        .map(|p| [p[0] as i64, p[1] as i64, p[2] as i64])
        .collect();
    let mut ordered: Vec<[i64; 3]> = occupied.iter().copied().collect();
    ordered.sort_unstable();

    let mut vertex_index: HashMap<[i64; 3], usize> = HashMap::new();
    let mut vertices: Vec<[f64; 3]> = Vec::new();
    let mut triangles: Vec<[usize; 3]> = Vec::new();

    for voxel in ordered {
        for (offset, corners) in FACES {
            let neighbor = [
                voxel[0] + offset[0],
                voxel[1] + offset[1],
                voxel[2] + offset[2],
            ];
            if occupied.contains(&neighbor) {
                continue;
            }
            let mut face = [0usize; 4];
            for (slot, corner) in corners.iter().enumerate() {
                let grid = [
                    voxel[0] + corner[0],
                    voxel[1] + corner[1],
                    voxel[2] + corner[2],
                ];
                let index = *vertex_index.entry(grid).or_insert_with(|| {
                    vertices.push([
                        (interval.min(0) + grid[0]) as f64 * calibration[0],
                        (interval.min(1) + grid[1]) as f64 * calibration[1],
                        (interval.min(2) + grid[2]) as f64 * calibration[2],
                    ]);
                    vertices.len() - 1
                });
                face[slot] = index;
            }
            triangles.push([face[0], face[1], face[2]]);
            triangles.push([face[0], face[2], face[3]]);
        }
    }
    Mesh::new(vertices, triangles)
}
