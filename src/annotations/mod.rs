pub mod mesh;
pub mod point;
pub mod polygon;
pub mod spot;
