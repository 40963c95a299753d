//! 主成分投影 - 把展平的降采样帧压到低维特征空间
//!
//! B 远小于展平长度 L，走 Gram 矩阵（B×B）路线：
//! G = Xc·Xcᵀ = U·Λ·Uᵀ，得分矩阵为 U·Σ。
//! 特征分解用循环 Jacobi，纯确定性，无随机求解器、无种子依赖。

use log::debug;
use ndarray::{Array2, Axis};

use super::error::ExtractError;
use super::frame::Frame;

const MAX_JACOBI_SWEEPS: usize = 64;
const JACOBI_TOL: f64 = 1e-12;

/// 投影配置
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// 保留的主成分上限，实际数量为 min(B, L, n_components)
    pub n_components: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self { n_components: 500 }
    }
}

/// 帧批展平为 B×L 矩阵，一帧一行
pub fn flatten_batch(frames: &[Frame]) -> Array2<f64> {
    let b = frames.len();
    let l = frames.first().map_or(0, |f| f.sample_count());

    let mut matrix = Array2::zeros((b, l));
    for (i, frame) in frames.iter().enumerate() {
        for (j, &v) in frame.data.iter().enumerate() {
            matrix[[i, j]] = v as f64;
        }
    }
    matrix
}

/// PCA 投影，返回 B×M 得分矩阵（按解释方差降序排列的主成分坐标）
pub fn project(data: &Array2<f64>, config: &ProjectionConfig) -> Result<Array2<f64>, ExtractError> {
    let b = data.nrows();
    let l = data.ncols();

    if b < 2 {
        return Err(ExtractError::InsufficientFrames { got: b, need: 2 });
    }

    let n_components = config.n_components.min(b).min(l);

    let mean = data.sum_axis(Axis(0)) / b as f64;
    let centered = data - &mean;

    let gram = centered.dot(&centered.t());
    let (eigvals, eigvecs) = jacobi_eigh(gram);

    let mut order: Vec<usize> = (0..b).collect();
    order.sort_by(|&i, &j| eigvals[j].total_cmp(&eigvals[i]));

    debug!(
        "pca: {} samples x {} features -> {} components, top eigenvalue {:.3e}",
        b, l, n_components, eigvals[order[0]]
    );

    let mut scores = Array2::zeros((b, n_components));
    for (col, &k) in order.iter().take(n_components).enumerate() {
        // Gram 特征值可能因舍入出现小负数
        let sigma = eigvals[k].max(0.0).sqrt();
        for row in 0..b {
            scores[[row, col]] = eigvecs[[row, k]] * sigma;
        }
    }

    Ok(scores)
}

/// 对称矩阵的循环 Jacobi 特征分解，返回（特征值，列特征向量）
fn jacobi_eigh(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::eye(n);

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

    for _sweep in 0..MAX_JACOBI_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (p + 1..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off.sqrt() <= scale * JACOBI_TOL {
            break;
        }

        for p in 0..n.saturating_sub(1) {
            for q in p + 1..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigvals = (0..n).map(|i| a[[i, i]]).collect();
    (eigvals, v)
}
