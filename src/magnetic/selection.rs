//! # 磁散射选择定则
//!
//! 只有垂直于散射矢量的磁矩分量参与磁散射。给出磁矩方向与 Miller 指数，
//! 在由晶格长度与夹角确定的笛卡尔坐标系中求两者夹角 θ，返回 sin²θ。
//!
//! ## 依赖关系
//! - 被 `magnetic/intensity.rs` 调用
//! - 使用 `models/structure.rs` 的晶格参数变换

use crate::models::Lattice;
use crate::utils::vector::{combine, dot, norm};

/// 分量和低于该阈值的向量视为零向量
pub const DEGENERATE_THRESHOLD: f64 = 0.005;

/// 计算选择定则因子 sin²θ
///
/// - `moment`: 磁矩方向（以 `lengths`/`angles` 描述的基矢为坐标）
/// - `miller`: Miller 指数
/// - `angles`: 基矢夹角（度）
/// - `lengths`: 基矢长度
///
/// 任一输入的分量和小于 [`DEGENERATE_THRESHOLD`] 时返回 0。
pub fn selection_rule(moment: &[f64; 3], miller: &[f64; 3], angles: &[f64; 3], lengths: &[f64; 3]) -> f64 {
    if component_sum(moment) < DEGENERATE_THRESHOLD || component_sum(miller) < DEGENERATE_THRESHOLD {
        return 0.0;
    }

    let basis = Lattice::from_parameters(
        lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2],
    )
    .matrix;

    let a = combine(moment, &basis);
    let b = combine(miller, &basis);

    let denom = norm(&a) * norm(&b);
    if denom == 0.0 {
        return 0.0;
    }

    // 舍入可能使余弦略超出 [-1, 1]
    let cos_theta = (dot(&a, &b) / denom).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    theta.sin().powi(2)
}

fn component_sum(v: &[f64; 3]) -> f64 {
    v[0] + v[1] + v[2]
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBIC_ANGLES: [f64; 3] = [90.0, 90.0, 90.0];
    const CUBIC_LENGTHS: [f64; 3] = [2.18, 2.18, 2.18];

    #[test]
    fn test_parallel_vectors_give_zero() {
        let angles = [82.0, 97.5, 103.0];
        let lengths = [1.3, 1.1, 0.9];
        for v in [[1.0, 0.0, 0.0], [0.3, 1.2, -0.4], [1.0, 1.0, 1.0]] {
            let value = selection_rule(&v, &v, &angles, &lengths);
            assert!(value.abs() < 1e-12, "sin² for {:?} = {}", v, value);
        }
    }

    #[test]
    fn test_perpendicular_vectors_give_one() {
        let value = selection_rule(&[1.0, 0.0, 0.0], &[0.0, 0.0, 2.0], &CUBIC_ANGLES, &CUBIC_LENGTHS);
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal_in_cubic() {
        // (100) 与 (110) 夹角 45°
        let value = selection_rule(&[1.0, 0.0, 0.0], &[1.0, 1.0, 0.0], &CUBIC_ANGLES, &CUBIC_LENGTHS);
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_hexagonal_metric() {
        // 倒空间六角：b1 与 b2 夹角 60°
        let angles = [90.0, 90.0, 60.0];
        let lengths = [1.5, 1.5, 0.8];
        let value = selection_rule(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &angles, &lengths);
        assert!((value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs_return_zero() {
        let lengths = CUBIC_LENGTHS;
        let angles = CUBIC_ANGLES;
        assert_eq!(selection_rule(&[0.0; 3], &[1.0, 0.0, 0.0], &angles, &lengths), 0.0);
        assert_eq!(selection_rule(&[1.0, 0.0, 0.0], &[0.001, 0.001, 0.001], &angles, &lengths), 0.0);
        // 分量和为负同样视为退化
        assert_eq!(selection_rule(&[-1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &angles, &lengths), 0.0);
        assert_eq!(selection_rule(&[0.0, 1.0, 0.0], &[1.0, -1.0, 0.0], &angles, &lengths), 0.0);
    }
}
