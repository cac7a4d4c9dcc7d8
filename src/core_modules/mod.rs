pub mod contour;
pub mod frame;
pub mod motion_detector;
pub mod throughput;
