use std::f64::consts::PI;

use image::{GrayImage, Luma};
use log::debug;
use ndarray::Array3;
use rayon::prelude::*;

use crate::annotations::point::Point;
use crate::annotations::polygon::Polygon;
use crate::annotations::spot::{Spot, SpotShape};
use crate::classification::backend::ProcessingMode;
use crate::detection::contour::{simplify_closed_contour, trace_region_contour};
use crate::detection::mesh::mesh_from_voxels;
use crate::detection::regions::{Region, label_regions_2d, label_regions_3d};
use crate::image_utils::volume::ProbabilityVolume;

/// Tolerance, in pixels, for contour simplification. Collinear runs along a
/// region border collapse; actual corners stay.
const SIMPLIFY_TOLERANCE_PIXELS: f64 = 0.5;

/// Converts a thresholded probability volume into spots.
///
/// A pixel is foreground when its probability is strictly greater than
/// `threshold`. Each connected foreground region (4-connected in 2D,
/// 6-connected in 3D) becomes one spot at the region centroid, in physical
/// units via `calibration`. 2D spots carry a traced polygon contour,
/// simplified when `simplify` is set; 3D spots carry a surface mesh.
///
/// Regions are converted in parallel across `num_threads` workers; the
/// result is a pure function of the inputs regardless of the thread count.
pub fn spots_from_threshold(
    volume: &ProbabilityVolume,
    calibration: &[f64],
    threshold: f64,
    simplify: bool,
    mode: ProcessingMode,
    num_threads: usize,
) -> Vec<Spot> {
    let regions = match mode {
        ProcessingMode::TwoD => {
            let shape = volume.data().shape();
            let (height, width) = (shape[0], shape[1]);
            let mut mask = GrayImage::new(width as u32, height as u32);
            for y in 0..height {
                for x in 0..width {
                    if volume.data()[[y, x]] as f64 > threshold {
                        mask.put_pixel(x as u32, y as u32, Luma([255]));
                    }
                }
            }
            label_regions_2d(&mask)
        }
        ProcessingMode::ThreeD => {
            let shape = volume.data().shape();
            let (depth, height, width) = (shape[0], shape[1], shape[2]);
            let mut mask = Array3::from_elem((depth, height, width), false);
            for z in 0..depth {
                for y in 0..height {
                    for x in 0..width {
                        mask[[z, y, x]] = volume.data()[[z, y, x]] as f64 > threshold;
                    }
                }
            }
            label_regions_3d(&mask)
        }
    };
    debug!(
        "threshold {} split the volume into {} regions",
        threshold,
        regions.len()
    );

    let to_spot = |region: &Region| match mode {
        ProcessingMode::TwoD => spot_from_region_2d(region, volume, calibration, simplify),
        ProcessingMode::ThreeD => spot_from_region_3d(region, volume, calibration),
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => pool.install(|| regions.par_iter().map(to_spot).collect()),
        Err(_) => regions.iter().map(to_spot).collect(),
    }
}

fn spot_from_region_2d(
    region: &Region,
    volume: &ProbabilityVolume,
    calibration: &[f64],
    simplify: bool,
) -> Spot {
    let n = region.pixels.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut quality = f32::NEG_INFINITY;
    for p in &region.pixels {
        sum_x += p[0] as f64;
        sum_y += p[1] as f64;
        quality = quality.max(volume.data()[[p[1], p[0]]]);
    }
    let min = volume.interval();
    let x = (min.min(0) as f64 + sum_x / n) * calibration[0];
    let y = (min.min(1) as f64 + sum_y / n) * calibration[1];
    let area = n * calibration[0] * calibration[1];
    let radius = (area / PI).sqrt();

    let shape = match trace_region_contour(&region.pixels) {
        Some(contour) if contour.len() >= 3 => {
            let contour = if simplify {
                simplify_closed_contour(&contour, SIMPLIFY_TOLERANCE_PIXELS)
            } else {
                contour
            };
            let physical = contour
                .into_iter()
                .map(|p| {
                    Point::new(
                        (min.min(0) as f64 + p.x) * calibration[0],
                        (min.min(1) as f64 + p.y) * calibration[1],
                    )
                })
                .collect();
            SpotShape::Contour(Polygon::new(physical))
        }
        _ => SpotShape::Point,
    };

    Spot {
        x,
        y,
        z: 0.0,
        radius,
        quality: quality as f64,
        shape,
    }
}

fn spot_from_region_3d(
    region: &Region,
    volume: &ProbabilityVolume,
    calibration: &[f64],
) -> Spot {
    let n = region.pixels.len() as f64;
    let mut sums = [0.0f64; 3];
    let mut quality = f32::NEG_INFINITY;
    for p in &region.pixels {
        sums[0] += p[0] as f64;
        sums[1] += p[1] as f64;
        sums[2] += p[2] as f64;
        quality = quality.max(volume.data()[[p[2], p[1], p[0]]]);
    }
    let min = volume.interval();
    let x = (min.min(0) as f64 + sums[0] / n) * calibration[0];
    let y = (min.min(1) as f64 + sums[1] / n) * calibration[1];
    let z = (min.min(2) as f64 + sums[2] / n) * calibration[2];
    let voxel_volume = n * calibration[0] * calibration[1] * calibration[2];
    let radius = (3.0 * voxel_volume / (4.0 * PI)).cbrt();

    Spot {
        x,
        y,
        z,
        radius,
        quality: quality as f64,
        shape: SpotShape::Mesh(mesh_from_voxels(&region.pixels, min, calibration)),
    }
}
