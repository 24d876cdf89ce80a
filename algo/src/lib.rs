mod fixedpoint;
mod keypoints;
mod similarity;

pub use fixedpoint::run_to_fixed_point;
pub use keypoints::{match_keypoints, detect_keypoints, Keypoint};
pub use similarity::{normalize_whitespace, similarity_ratio};
