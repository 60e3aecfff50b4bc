use image::GrayImage;
use ndarray::Axis;

use crate::image_utils::volume::ProbabilityVolume;

/// Renders a probability volume as an 8-bit grayscale image for display.
///
/// Probabilities in [0, 1] map to [0, 255]; out-of-range samples are clamped.
/// A 3D volume is flattened by maximum projection along z, so a bright voxel
/// anywhere in a column shows up in the rendering.
pub fn render_probabilities(volume: &ProbabilityVolume) -> GrayImage {
    let plane = if volume.num_dimensions() == 3 {
        volume
            .data()
            .map_axis(Axis(0), |column| column.iter().copied().fold(0.0, f32::max))
    } else {
        volume.data().clone()
    };
    let height = plane.shape()[0] as u32;
    let width = plane.shape()[1] as u32;
    let mut rendered = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let value = (plane[[y as usize, x as usize]] * 255.0)
                .round()
                .clamp(0.0, 255.0) as u8;
            rendered.put_pixel(x, y, image::Luma([value]));
        }
    }
    rendered
}
