pub mod aspect;
pub mod video;

pub use aspect::AspectClassification;
pub use video::{CreateVideoRequest, Video};
