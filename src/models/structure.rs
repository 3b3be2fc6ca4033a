//! # 晶体结构数据模型
//!
//! 定义晶格、原子与晶体结构，并从晶格导出衍射计算所需的几何量
//! （实空间基矢、倒格矢及其长度与夹角）。
//!
//! ## 约定
//! 倒格矢采用 2π 约定：b1 = 2π(a2×a3)/V，因此 bᵢ · aⱼ = 2π δᵢⱼ。
//!
//! ## 依赖关系
//! - 被 `models/job.rs` 和 `magnetic/` 使用
//! - 使用 `utils/vector.rs`

use crate::error::{MandyError, Result};
use crate::utils::vector::{combine, cross, dot, norm};

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a1, a2, a3
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3 = (c * c - c1 * c1 - c2 * c2).max(0.0).sqrt();

        Lattice {
            matrix: [
                [a, 0.0, 0.0],
                [b * cos_gamma, b * sin_gamma, 0.0],
                [c1, c2, c3],
            ],
        }
    }

    /// 校验后再创建：长度为正，角度在 (0°, 180°) 内且三个角能构成晶胞
    pub fn try_from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        for (name, length) in [("a", a), ("b", b), ("c", c)] {
            if !length.is_finite() || length <= 0.0 {
                return Err(MandyError::DegenerateLattice(format!(
                    "length {} = {} must be positive",
                    name, length
                )));
            }
        }
        for (name, angle) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !angle.is_finite() || angle <= 0.0 || angle >= 180.0 {
                return Err(MandyError::DegenerateLattice(format!(
                    "angle {} = {} is outside (0, 180) degrees",
                    name, angle
                )));
            }
        }

        // 1 - cos²α - cos²β - cos²γ + 2 cosα cosβ cosγ = (V / abc)²
        let [ca, cb, cg] = [alpha, beta, gamma].map(|x| x.to_radians().cos());
        let volume_factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if volume_factor <= 1e-12 {
            return Err(MandyError::DegenerateLattice(format!(
                "angles ({}, {}, {}) do not span a cell",
                alpha, beta, gamma
            )));
        }

        Ok(Self::from_parameters(a, b, c, alpha, beta, gamma))
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let (lengths, angles) = lengths_and_angles(&self.matrix);
        (
            lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2],
        )
    }

    /// 计算晶格体积（带符号）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = &self.matrix;
        dot(a, &cross(b, c))
    }

    /// 计算倒格矢矩阵（2π 约定，行向量 b1, b2, b3）
    pub fn reciprocal(&self) -> Result<[[f64; 3]; 3]> {
        let [a, b, c] = &self.matrix;
        let volume = self.volume();

        if !volume.is_finite() || volume.abs() < 1e-10 {
            return Err(MandyError::DegenerateLattice(format!(
                "cell volume {:.3e} is zero or undefined",
                volume
            )));
        }

        let factor = 2.0 * PI / volume;
        let row = |v: [f64; 3]| [v[0] * factor, v[1] * factor, v[2] * factor];

        Ok([row(cross(b, c)), row(cross(c, a)), row(cross(a, b))])
    }

    /// 分数坐标转笛卡尔坐标
    pub fn frac_to_cart(&self, frac: &[f64; 3]) -> [f64; 3] {
        combine(frac, &self.matrix)
    }
}

/// 一组基矢的长度与夹角 (alpha = ∠(v2,v3), beta = ∠(v1,v3), gamma = ∠(v1,v2))，角度单位：度
fn lengths_and_angles(m: &[[f64; 3]; 3]) -> ([f64; 3], [f64; 3]) {
    let lengths = [norm(&m[0]), norm(&m[1]), norm(&m[2])];
    let angle = |i: usize, j: usize| (dot(&m[i], &m[j]) / (lengths[i] * lengths[j])).acos().to_degrees();
    (lengths, [angle(1, 2), angle(0, 2), angle(0, 1)])
}

/// 原子信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],

    /// 可选：原子标签（用于区分同种元素的不同位置）
    #[serde(default)]
    pub label: Option<String>,
}

#[cfg(test)]
impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称
    pub name: String,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表（晶胞内全部原子，包括对称等效位置）
    pub atoms: Vec<Atom>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            lattice,
            atoms,
        }
    }

    /// 全部原子的笛卡尔坐标，顺序与 `atoms` 一致
    pub fn cartesian_positions(&self) -> Vec<[f64; 3]> {
        self.atoms
            .iter()
            .map(|atom| self.lattice.frac_to_cart(&atom.position))
            .collect()
    }
}

/// 衍射几何
///
/// 从晶格一次性导出，之后只读。
#[derive(Debug, Clone)]
pub struct CrystalGeometry {
    /// 实空间基矢 a1, a2, a3
    pub real: [[f64; 3]; 3],
    /// 倒格矢 b1, b2, b3
    pub reciprocal: [[f64; 3]; 3],
    /// 倒格矢长度 |b1|, |b2|, |b3|
    pub reciprocal_lengths: [f64; 3],
    /// 倒格矢夹角（度）
    pub reciprocal_angles: [f64; 3],
}

impl CrystalGeometry {
    pub fn from_lattice(lattice: &Lattice) -> Result<Self> {
        let reciprocal = lattice.reciprocal()?;
        let (reciprocal_lengths, reciprocal_angles) = lengths_and_angles(&reciprocal);

        Ok(CrystalGeometry {
            real: lattice.matrix,
            reciprocal,
            reciprocal_lengths,
            reciprocal_angles,
        })
    }

    /// 倒空间笛卡尔向量 h*b1 + k*b2 + l*b3
    pub fn reciprocal_vector(&self, hkl: &[f64; 3]) -> [f64; 3] {
        combine(hkl, &self.reciprocal)
    }
}
