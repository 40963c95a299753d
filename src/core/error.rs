use thiserror::Error;

/// 管线错误分类 - 所有失败都会终止当前一次提取，不做内部重试
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("failed to decode frame {frame}: {reason}")]
    FrameRead { frame: usize, reason: String },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("not enough sampled frames: got {got}, need at least {need}")]
    InsufficientFrames { got: usize, need: usize },
}
