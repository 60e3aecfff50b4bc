use std::collections::{BTreeMap, VecDeque};

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use ndarray::Array3;

/// One connected foreground region of a thresholded volume.
///
/// Pixel coordinates are (x, y, z), zero-based within the volume (z is 0 for
/// 2D). Regions are returned ordered by label, and labels follow scan order,
/// so downstream processing is deterministic.
#[derive(Debug, Clone)]
pub(crate) struct Region {
    pub label: u32,
    pub pixels: Vec<[usize; 3]>,
}

/// Labels 4-connected foreground regions of a 2D mask (non-zero pixels).
pub(crate) fn label_regions_2d(mask: &GrayImage) -> Vec<Region> {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));
    let mut buckets: BTreeMap<u32, Vec<[usize; 3]>> = BTreeMap::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel.0[0];
        if label != 0 {
            buckets
                .entry(label)
                .or_default()
                .push([x as usize, y as usize, 0]);
        }
    }
    buckets
        .into_iter()
        .map(|(label, pixels)| Region { label, pixels })
        .collect()
}

/// Labels 6-connected foreground regions of a 3D mask by flood fill,
/// axes (z, y, x).
pub(crate) fn label_regions_3d(mask: &Array3<bool>) -> Vec<Region> {
    let (depth, height, width) = mask.dim();
    let mut labels = Array3::<u32>::zeros((depth, height, width));
    let mut regions = Vec::new();
    let mut next_label = 1u32;

    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                if !mask[[z, y, x]] || labels[[z, y, x]] != 0 {
                    continue;
                }
                let label = next_label;
                next_label += 1;
                let mut pixels = Vec::new();
                let mut queue = VecDeque::new();
                labels[[z, y, x]] = label;
                queue.push_back([z, y, x]);
                while let Some([cz, cy, cx]) = queue.pop_front() {
                    pixels.push([cx, cy, cz]);
                    let mut visit = |nz: usize, ny: usize, nx: usize| {
                        if mask[[nz, ny, nx]] && labels[[nz, ny, nx]] == 0 {
                            labels[[nz, ny, nx]] = label;
                            queue.push_back([nz, ny, nx]);
                        }
                    };
                    if cz > 0 {
                        visit(cz - 1, cy, cx);
                    }
                    if cz + 1 < depth {
                        visit(cz + 1, cy, cx);
                    }
                    if cy > 0 {
                        visit(cz, cy - 1, cx);
                    }
                    if cy + 1 < height {
                        visit(cz, cy + 1, cx);
                    }
                    if cx > 0 {
                        visit(cz, cy, cx - 1);
                    }
                    if cx + 1 < width {
                        visit(cz, cy, cx + 1);
                    }
                }
                pixels.sort_unstable();
                regions.push(Region { label, pixels });
            }
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_diagonal_pixels_are_separate_in_2d() {
        // Diagonal neighbors are not 4-connected.
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(0, 0, Luma([255]));
        mask.put_pixel(1, 1, Luma([255]));
        let regions = label_regions_2d(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].pixels, vec![[0, 0, 0]]);
        assert_eq!(regions[1].pixels, vec![[1, 1, 0]]);
    }

    #[test]
    fn separated_blobs_in_3d() {
        let mut mask = Array3::from_elem((3, 3, 3), false);
        // A 2-voxel bar and a far corner voxel.
        mask[[0, 0, 0]] = true;
        mask[[1, 0, 0]] = true;
        mask[[2, 2, 2]] = true;
        let regions = label_regions_3d(&mask);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].pixels, vec![[0, 0, 0], [0, 0, 1]]);
        assert_eq!(regions[1].pixels, vec![[2, 2, 2]]);
    }

    #[test]
    fn face_connectivity_joins_a_plus_shape() {
        let mut mask = Array3::from_elem((1, 3, 3), false);
        mask[[0, 1, 0]] = true;
        mask[[0, 1, 1]] = true;
        mask[[0, 1, 2]] = true;
        mask[[0, 0, 1]] = true;
        mask[[0, 2, 1]] = true;
        let regions = label_regions_3d(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixels.len(), 5);
    }
}
