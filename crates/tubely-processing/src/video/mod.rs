//! External media tooling: ffprobe for inspection, ffmpeg for remuxing.
//!
//! Both tools sit behind capability traits so the upload pipeline can be exercised
//! without the binaries installed.

pub mod inspector;
pub mod optimizer;

pub use inspector::{FfprobeInspector, InspectError, MediaInspector};
pub use optimizer::{optimized_path_for, FfmpegOptimizer, OptimizeError, StreamOptimizer};
