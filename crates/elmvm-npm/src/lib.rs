mod detection;
mod runner;

pub use detection::{NpmDetection, detect_npm};
pub use runner::TokioProcessRunner;
