use serde::{Deserialize, Serialize};
use std::fmt;

use crate::annotations::mesh::Mesh;
use crate::annotations::polygon::Polygon;

/// Shape attached to a detected spot.
///
/// 2D detections carry a polygon contour, 3D detections a surface mesh; a
/// bare point is used when no shape was requested or could be traced.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum SpotShape {
    Point,
    Contour(Polygon),
    Mesh(Mesh),
}

/// A spot is what the detection extractor produces from one connected
/// foreground region of a probability volume.
///
/// The position is the region centroid in physical units (z is 0 for 2D
/// images), the radius that of the disc (2D) or sphere (3D) with the region's
/// area or volume, and the quality the classifier probability at the spot,
/// i.e. the highest probability inside the region.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Spot {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
    pub quality: f64,
    pub shape: SpotShape,
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spot {{ x: {}, y: {}, z: {}, radius: {}, quality: {} }}",
            self.x, self.y, self.z, self.radius, self.quality
        )
    }
}
