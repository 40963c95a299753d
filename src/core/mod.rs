pub mod cluster;
pub mod crop;
pub mod downsample;
pub mod error;
pub mod frame;
pub mod projection;

pub use cluster::{select_representatives, ClusterConfig, MiniBatchKMeans};
pub use crop::{crop, crop_batch, CropBounds, CropRect};
pub use downsample::downsample;
pub use error::ExtractError;
pub use frame::Frame;
pub use projection::{flatten_batch, project, ProjectionConfig};
