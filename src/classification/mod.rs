pub mod backend;
pub mod onnx;
pub mod runner;
