//! 基于聚类的代表帧选择
//!
//! Mini-batch KMeans 分 K 簇，再从每个非空簇中均匀随机取一帧。
//! 多样性由聚类保证，取帧规则保持简单，不做第二次最近邻扫描。
//! 聚类结果依赖初始化，跨运行不保证一致；固定种子时完全可复现。

use std::collections::BTreeMap;

use log::debug;
use ndarray::{Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;

use super::error::ExtractError;

/// 聚类超参数
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub batch_size: usize,
    pub max_iter: usize,
    /// 质心平均平方位移低于该值即收敛
    pub tol: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_iter: 50,
            tol: 1e-5,
        }
    }
}

/// Mini-batch KMeans（Sculley 变体：按簇计数的递减学习率）
pub struct MiniBatchKMeans {
    n_clusters: usize,
    config: ClusterConfig,
}

impl MiniBatchKMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self::with_config(n_clusters, ClusterConfig::default())
    }

    pub fn with_config(n_clusters: usize, config: ClusterConfig) -> Self {
        Self { n_clusters, config }
    }

    /// 对 B×M 特征矩阵聚类，返回每行的簇标号
    pub fn fit<R: Rng>(
        &self,
        data: &Array2<f64>,
        rng: &mut R,
    ) -> Result<Vec<usize>, ExtractError> {
        let n_samples = data.nrows();

        if self.n_clusters < 2 {
            return Err(ExtractError::InvalidParameter(format!(
                "n_clusters must be at least 2, got {}",
                self.n_clusters
            )));
        }
        if self.n_clusters > n_samples {
            return Err(ExtractError::InvalidParameter(format!(
                "n_clusters ({}) exceeds number of samples ({})",
                self.n_clusters, n_samples
            )));
        }

        let n_features = data.ncols();
        let k = self.n_clusters;

        // 随机选 K 个互不相同的样本作为初始质心
        let mut centroids = Array2::zeros((k, n_features));
        for (c, i) in sample(rng, n_samples, k).into_iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(i));
        }

        let mut counts = vec![0usize; k];
        let batch_size = self.config.batch_size.min(n_samples);

        for iter in 0..self.config.max_iter {
            let batch = sample(rng, n_samples, batch_size);
            let previous = centroids.clone();

            for i in batch {
                let point = data.row(i);
                let c = nearest_centroid(&point, &centroids);
                counts[c] += 1;
                let eta = 1.0 / counts[c] as f64;
                let mut centroid = centroids.row_mut(c);
                for (dst, &src) in centroid.iter_mut().zip(point.iter()) {
                    *dst += eta * (src - *dst);
                }
            }

            let shift = (&centroids - &previous)
                .iter()
                .map(|d| d * d)
                .sum::<f64>()
                / k as f64;
            if shift < self.config.tol {
                debug!("kmeans: converged after {} iterations (shift {:.3e})", iter + 1, shift);
                break;
            }
        }

        let labels = (0..n_samples)
            .map(|i| nearest_centroid(&data.row(i), &centroids))
            .collect();
        Ok(labels)
    }
}

fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist: f64 = point
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    best
}

/// 每个非空簇均匀随机取一个成员下标，按簇标号升序返回。
/// 空簇直接跳过，因此结果大小在 [1, K] 之间。
pub fn select_representatives<R: Rng>(labels: &[usize], rng: &mut R) -> Vec<usize> {
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(idx);
    }

    members
        .values()
        .map(|indices| indices[rng.gen_range(0..indices.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_blob_data() -> Array2<f64> {
        // 10 points: 5 near the origin, 5 near (100, 100)
        let mut data = Array2::zeros((10, 2));
        for i in 0..5 {
            data[[i, 0]] = i as f64;
            data[[i, 1]] = i as f64 * 0.5;
        }
        for i in 5..10 {
            data[[i, 0]] = 100.0 + i as f64;
            data[[i, 1]] = 100.0 - i as f64 * 0.5;
        }
        data
    }

    #[test]
    fn test_labels_cover_all_samples() {
        let data = two_blob_data();
        let mut rng = StdRng::seed_from_u64(7);
        let labels = MiniBatchKMeans::new(2).fit(&data, &mut rng).unwrap();

        assert_eq!(labels.len(), 10);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_separated_blobs_recovered() {
        let data = two_blob_data();
        let mut rng = StdRng::seed_from_u64(42);
        let labels = MiniBatchKMeans::new(2).fit(&data, &mut rng).unwrap();

        // all points of a blob share one label, and the blobs differ
        assert!(labels[..5].iter().all(|&l| l == labels[0]));
        assert!(labels[5..].iter().all(|&l| l == labels[5]));
        assert_ne!(labels[0], labels[5]);
    }

    #[test]
    fn test_k_below_two_rejected() {
        let data = two_blob_data();
        let mut rng = StdRng::seed_from_u64(0);
        let result = MiniBatchKMeans::new(1).fit(&data, &mut rng);
        assert!(matches!(result, Err(ExtractError::InvalidParameter(_))));
    }

    #[test]
    fn test_k_above_samples_rejected() {
        let data = two_blob_data();
        let mut rng = StdRng::seed_from_u64(0);
        let result = MiniBatchKMeans::new(11).fit(&data, &mut rng);
        assert!(matches!(result, Err(ExtractError::InvalidParameter(_))));
    }

    #[test]
    fn test_fit_is_reproducible_with_seed() {
        let data = two_blob_data();

        let labels_a = MiniBatchKMeans::new(3)
            .fit(&data, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let labels_b = MiniBatchKMeans::new(3)
            .fit(&data, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn test_representatives_structural_properties() {
        let labels = vec![0, 0, 1, 1, 1, 3, 0, 3];
        let mut rng = StdRng::seed_from_u64(5);
        let picked = select_representatives(&labels, &mut rng);

        // one per populated cluster (0, 1, 3), ascending cluster order
        assert_eq!(picked.len(), 3);
        assert_eq!(labels[picked[0]], 0);
        assert_eq!(labels[picked[1]], 1);
        assert_eq!(labels[picked[2]], 3);

        let mut unique = picked.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), picked.len());
        assert!(picked.iter().all(|&i| i < labels.len()));
    }

    #[test]
    fn test_representatives_reproducible_with_seed() {
        let labels = vec![0, 0, 1, 1, 2, 2, 2];

        let a = select_representatives(&labels, &mut StdRng::seed_from_u64(3));
        let b = select_representatives(&labels, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_end_to_end_selection_size() {
        let data = two_blob_data();
        let mut rng = StdRng::seed_from_u64(11);
        let labels = MiniBatchKMeans::new(4).fit(&data, &mut rng).unwrap();
        let picked = select_representatives(&labels, &mut rng);

        assert!(!picked.is_empty());
        assert!(picked.len() <= 4);
        assert!(picked.iter().all(|&i| i < 10));
    }
}
