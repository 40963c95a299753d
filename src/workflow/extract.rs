//! 帧子集提取编排
//!
//! 核心流程：
//! 1. 按步长读帧 - 先把长视频抽稀，约束后续阶段的内存与算力
//! 2. 裁剪 + 降采样 - 每帧一个工作单元
//! 3. PCA 投影 + Mini-batch KMeans 聚类 - 粗粒度阶段
//! 4. 每个非空簇随机取一帧，返回原分辨率帧
//!
//! 整条管线是拉驱动的惰性序列：调用方每 next() 一次推进一个工作单元，
//! 单线程、无后台任务，丢弃迭代器即放弃本次运行，不会泄漏资源。

use std::mem;

use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::progress::Progress;
use crate::core::{
    crop, downsample, flatten_batch, project, select_representatives, ClusterConfig, CropRect,
    ExtractError, Frame, MiniBatchKMeans, ProjectionConfig,
};
use crate::reader::FrameSource;

const READ_DESC: &str = "Reading Frames from File...";
const SHRINK_DESC: &str = "Downsampling Frames for Quicker Analysis...";
const PCA_DESC: &str = "Selecting Frames (PCA)...";
const KMEANS_DESC: &str = "Selecting Frames (KMeans)...";
const DONE_DESC: &str = "Done!";

/// 提取配置
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub crop: CropRect,
    /// 采样步长 - 每隔 every_n 帧读一帧
    pub every_n: usize,
    pub n_clusters: usize,
    pub downsample_level: u32,
    pub projection: ProjectionConfig,
    pub clustering: ClusterConfig,
    /// 固定种子可完整复现聚类与代表帧选择
    pub seed: Option<u64>,
}

impl ExtractConfig {
    pub fn new(crop: CropRect) -> Self {
        Self {
            crop,
            every_n: 30,
            n_clusters: 20,
            downsample_level: 3,
            projection: ProjectionConfig::default(),
            clustering: ClusterConfig::default(),
            seed: None,
        }
    }
}

/// 提取结果 - 批内下标与对应的原分辨率帧
///
/// 下标指向按步长读出的帧批（0..B），乘 every_n 映射回视频帧号。
/// 返回的帧保持读入时的原始分辨率：降采样只服务于特征比较，
/// 绝不降低交付质量。
#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub extracted_frame_indices: Vec<usize>,
    pub extracted_frames: Vec<Frame>,
    every_n: usize,
}

impl ExtractResult {
    pub fn len(&self) -> usize {
        self.extracted_frame_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_frame_indices.is_empty()
    }

    pub fn every_n(&self) -> usize {
        self.every_n
    }

    /// 批内下标映射回原始视频帧号
    pub fn original_frame_numbers(&self) -> Vec<usize> {
        self.extracted_frame_indices
            .iter()
            .map(|&idx| idx * self.every_n)
            .collect()
    }
}

/// 管线事件 - 若干 Progress 后跟随恰好一个 Finished
#[derive(Debug, Clone)]
pub enum ExtractEvent {
    Progress(Progress),
    Finished(ExtractResult),
}

enum Stage {
    Read { next: usize },
    Shrink { cursor: usize },
    Project,
    Cluster { features: Array2<f64> },
    Finish { labels: Vec<usize> },
    Emit { result: ExtractResult },
    Done,
}

/// 提取管线 - 显式阶段状态机，每次 next() 推进一个工作单元。
/// 终态事件之后迭代器保持耗尽，重复提取需构造新管线。
pub struct ExtractFrames<S: FrameSource> {
    source: S,
    config: ExtractConfig,
    rng: StdRng,
    stage: Stage,
    /// 计划采样的帧数
    expected: usize,
    /// 读入的原始帧，保留到最终选帧
    frames: Vec<Frame>,
    /// 裁剪并降采样后的特征帧
    shrunk: Vec<Frame>,
}

impl<S: FrameSource> ExtractFrames<S> {
    /// 校验参数并构造管线。参数错误在任何 I/O 之前报出。
    pub fn new(source: S, config: ExtractConfig) -> Result<Self, ExtractError> {
        if config.every_n == 0 {
            return Err(ExtractError::InvalidParameter(
                "every_n must be a positive integer".into(),
            ));
        }
        if config.n_clusters < 2 {
            return Err(ExtractError::InvalidParameter(format!(
                "n_clusters must be at least 2, got {}",
                config.n_clusters
            )));
        }
        if config.downsample_level == 0 {
            return Err(ExtractError::InvalidParameter(
                "downsample level must be a positive integer".into(),
            ));
        }
        if config.crop.is_degenerate() {
            return Err(ExtractError::InvalidParameter(format!(
                "degenerate crop rectangle ({}..{}, {}..{})",
                config.crop.x0, config.crop.x1, config.crop.y0, config.crop.y1
            )));
        }

        let total = source.n_frames();
        let expected = if total == 0 {
            0
        } else {
            (total - 1) / config.every_n + 1
        };

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "🎞 extract pipeline: {} frames at stride {} -> {} samples, {} clusters",
            total, config.every_n, expected, config.n_clusters
        );

        Ok(Self {
            source,
            config,
            rng,
            stage: Stage::Read { next: 0 },
            expected,
            frames: Vec::with_capacity(expected),
            shrunk: Vec::with_capacity(expected),
        })
    }

    fn advance(&mut self) -> Result<ExtractEvent, ExtractError> {
        loop {
            // 取出阶段后先落在 Done：出错提前返回时迭代器自动耗尽
            let stage = mem::replace(&mut self.stage, Stage::Done);
            match stage {
                Stage::Read { next } => {
                    if next >= self.source.n_frames() {
                        let batch = self.frames.len();
                        if batch < 2 {
                            return Err(ExtractError::InsufficientFrames {
                                got: batch,
                                need: 2,
                            });
                        }
                        if self.config.n_clusters > batch {
                            return Err(ExtractError::InvalidParameter(format!(
                                "n_clusters ({}) exceeds number of sampled frames ({})",
                                self.config.n_clusters, batch
                            )));
                        }
                        debug!("read stage complete: {} frames", batch);
                        self.stage = Stage::Shrink { cursor: 0 };
                        continue;
                    }

                    let frame = self.source.read_frame(next)?;
                    self.frames.push(frame);
                    self.stage = Stage::Read {
                        next: next + self.config.every_n,
                    };
                    return Ok(ExtractEvent::Progress(Progress::new(
                        self.frames.len(),
                        self.expected,
                        READ_DESC,
                    )));
                }

                Stage::Shrink { cursor } => {
                    if cursor >= self.frames.len() {
                        self.stage = Stage::Project;
                        continue;
                    }

                    let cropped = crop(&self.frames[cursor], &self.config.crop);
                    let small = downsample(&cropped, self.config.downsample_level)?;
                    self.shrunk.push(small);
                    self.stage = Stage::Shrink { cursor: cursor + 1 };
                    return Ok(ExtractEvent::Progress(Progress::new(
                        cursor + 1,
                        self.frames.len(),
                        SHRINK_DESC,
                    )));
                }

                Stage::Project => {
                    let matrix = flatten_batch(&self.shrunk);
                    self.shrunk.clear();
                    let features = project(&matrix, &self.config.projection)?;
                    self.stage = Stage::Cluster { features };
                    return Ok(ExtractEvent::Progress(Progress::new(1, 3, PCA_DESC)));
                }

                Stage::Cluster { features } => {
                    let kmeans = MiniBatchKMeans::with_config(
                        self.config.n_clusters,
                        self.config.clustering.clone(),
                    );
                    let labels = kmeans.fit(&features, &mut self.rng)?;
                    self.stage = Stage::Finish { labels };
                    return Ok(ExtractEvent::Progress(Progress::new(2, 3, KMEANS_DESC)));
                }

                Stage::Finish { labels } => {
                    let indices = select_representatives(&labels, &mut self.rng);
                    let selected = indices
                        .iter()
                        .map(|&idx| self.frames[idx].clone())
                        .collect();
                    info!(
                        "selected {} of {} sampled frames",
                        indices.len(),
                        self.frames.len()
                    );
                    self.frames.clear();

                    let result = ExtractResult {
                        extracted_frame_indices: indices,
                        extracted_frames: selected,
                        every_n: self.config.every_n,
                    };
                    self.stage = Stage::Emit { result };
                    return Ok(ExtractEvent::Progress(Progress::new(3, 3, DONE_DESC)));
                }

                Stage::Emit { result } => {
                    return Ok(ExtractEvent::Finished(result));
                }

                Stage::Done => unreachable!("advance is not called on an exhausted pipeline"),
            }
        }
    }
}

impl<S: FrameSource> Iterator for ExtractFrames<S> {
    type Item = Result<ExtractEvent, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.stage, Stage::Done) {
            return None;
        }
        Some(self.advance())
    }
}
