//! 提取编排 - 把读帧、裁剪、降采样、投影、聚类串成
//! 拉驱动的事件序列，并提供选中帧导出

pub mod export;
pub mod extract;
pub mod progress;

pub use export::{export_frames_to_directory, ExportError};
pub use extract::{ExtractConfig, ExtractEvent, ExtractFrames, ExtractResult};
pub use progress::Progress;
