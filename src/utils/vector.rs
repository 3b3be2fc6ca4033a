//! # 三维向量工具
//!
//! 以 `[f64; 3]` 表示的向量运算，供晶格、调制和强度计算共用。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs` 和 `magnetic/` 使用
//! - 无外部依赖

/// 向量点积
pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// 向量叉积
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// 向量模长
pub fn norm(a: &[f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub fn add(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn scale(a: &[f64; 3], factor: f64) -> [f64; 3] {
    [a[0] * factor, a[1] * factor, a[2] * factor]
}

/// 基矢线性组合 c0*e0 + c1*e1 + c2*e2
///
/// 分数坐标转笛卡尔坐标、Miller 指数转倒空间向量都是这一运算。
pub fn combine(coeffs: &[f64; 3], basis: &[[f64; 3]; 3]) -> [f64; 3] {
    [
        coeffs[0] * basis[0][0] + coeffs[1] * basis[1][0] + coeffs[2] * basis[2][0],
        coeffs[0] * basis[0][1] + coeffs[1] * basis[1][1] + coeffs[2] * basis[2][1],
        coeffs[0] * basis[0][2] + coeffs[1] * basis[1][2] + coeffs[2] * basis[2][2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_right_handed() {
        let z = cross(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert_eq!(z, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_combine_hexagonal() {
        let basis = [[3.0, 0.0, 0.0], [-1.5, 2.598, 0.0], [0.0, 0.0, 5.0]];
        let r = combine(&[0.5, 0.5, 0.5], &basis);
        assert!((r[0] - 0.75).abs() < 1e-12);
        assert!((r[1] - 1.299).abs() < 1e-12);
        assert!((r[2] - 2.5).abs() < 1e-12);
    }
}
