mod contour;
mod mesh;
mod regions;

pub mod extract;
