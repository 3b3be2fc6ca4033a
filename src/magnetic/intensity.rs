//! # 磁 Bragg 峰强度计算
//!
//! 对每个 Miller 指数 (h, k, l) 在调制超胞上求磁结构因子并得到强度。
//!
//! ## 算法概述
//! 1. Q = h·b1 + k·b2 + l·b3，s = |Q| / 4π
//! 2. 每个位点的归一化形状因子 f(s)/f(0)；f(0) 在扫描开始前按位点缓存
//! 3. 结构因子 F = Σⱼ wⱼ mⱼ exp(-i Q·rⱼ)，Q·r = 2π(hx + ky + lz)（分数坐标）
//! 4. 两种强度公式：
//!    - `SelectionRule`：wⱼ 包含选择定则 sin²θ，I = Re(F·F*)
//!    - `OrthogonalProjection`：F 不做预投影，F⊥ = Q × (F × Q) / |Q|²，I = Re(F⊥*·F⊥)
//!
//! (000) 在实验上不可观测，且会使投影公式除零，直接跳过，不出现在结果中。
//!
//! ## 并行
//! 各 Miller 指数之间相互独立，用 rayon 并行；单个指数内对位点的求和按固定顺序串行，
//! 结果逐位可复现。位点与离子查找全部在扫描前完成，配置错误不会出现在扫描过程中。
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 调用
//! - 使用 `magnetic/form_factor.rs`, `magnetic/selection.rs`
//! - 使用 `magnetic/modulation.rs` 的 ModulatedSupercell

use crate::error::{MandyError, Result};
use crate::magnetic::form_factor::{FormFactorTable, MagneticFormFactor};
use crate::magnetic::modulation::ModulatedSupercell;
use crate::magnetic::selection::selection_rule;
use crate::models::{CrystalGeometry, SiteTable};
use crate::utils::vector::{dot, norm};

use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f64::consts::PI;

/// 强度公式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityFormula {
    /// 选择定则加权后的结构因子模方（适用于共线磁矩）
    #[default]
    SelectionRule,
    /// 矢量结构因子投影到垂直 Q 的平面（一般情形，含非共线磁矩）
    OrthogonalProjection,
}

impl std::fmt::Display for IntensityFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntensityFormula::SelectionRule => write!(f, "selection-rule"),
            IntensityFormula::OrthogonalProjection => write!(f, "orthogonal-projection"),
        }
    }
}

/// 选择定则中使用的磁矩方向
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MomentOrientation {
    /// 每个超胞位置使用自身（调制后）的磁矩方向
    #[default]
    PerSite,
    /// 所有位置共用一个方向
    Global([f64; 3]),
}

/// Miller 指数扫描：三个轴的外积
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MillerRequest {
    pub h: Vec<f64>,
    pub k: Vec<f64>,
    pub l: Vec<f64>,
}

impl MillerRequest {
    pub fn new(h: Vec<f64>, k: Vec<f64>, l: Vec<f64>) -> Self {
        MillerRequest { h, k, l }
    }

    /// 全部 (h, k, l) 组合：h 最外层，l 最内层
    pub fn triples(&self) -> Vec<[f64; 3]> {
        let mut out = Vec::with_capacity(self.len());
        for &h in &self.h {
            for &k in &self.k {
                for &l in &self.l {
                    out.push([h, k, l]);
                }
            }
        }
        out
    }

    /// 组合总数（含 (000)）
    pub fn len(&self) -> usize {
        self.h.len() * self.k.len() * self.l.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 单个 Bragg 峰
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BraggPeak {
    /// 强度（非负）
    pub intensity: f64,
    /// Miller 指数 [h, k, l]
    pub index: [f64; 3],
}

/// 计算结果，顺序与 `MillerRequest::triples` 一致（去掉 (000)）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BraggResult {
    pub peaks: Vec<BraggPeak>,
}

impl BraggResult {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    #[cfg(test)]
    pub fn intensities(&self) -> Vec<f64> {
        self.peaks.iter().map(|p| p.intensity).collect()
    }

    pub fn max_intensity(&self) -> f64 {
        self.peaks.iter().map(|p| p.intensity).fold(0.0_f64, f64::max)
    }

    /// 强度最高的 n 个峰（降序）
    pub fn strongest(&self, n: usize) -> Vec<BraggPeak> {
        let mut peaks = self.peaks.clone();
        peaks.sort_by(|a, b| {
            b.intensity
                .partial_cmp(&a.intensity)
                .unwrap_or(Ordering::Equal)
        });
        peaks.truncate(n);
        peaks
    }
}

/// 已解析的位点：形状因子与 Q = 0 归一化常数
#[derive(Debug, Clone, Copy)]
struct ResolvedSite {
    factor: MagneticFormFactor,
    norm: f64,
}

impl ResolvedSite {
    fn weight(&self, s: f64) -> f64 {
        if self.norm == 0.0 {
            return 0.0;
        }
        self.factor.at(s) / self.norm
    }
}

/// 磁衍射计算器
pub struct DiffractionCalculator<'a> {
    geometry: &'a CrystalGeometry,
    sites: &'a SiteTable,
    table: &'a FormFactorTable,
    formula: IntensityFormula,
    orientation: MomentOrientation,
}

impl<'a> DiffractionCalculator<'a> {
    /// 创建计算器，默认使用选择定则公式与逐位点磁矩方向
    pub fn new(geometry: &'a CrystalGeometry, sites: &'a SiteTable, table: &'a FormFactorTable) -> Self {
        Self {
            geometry,
            sites,
            table,
            formula: IntensityFormula::default(),
            orientation: MomentOrientation::default(),
        }
    }

    pub fn formula(mut self, formula: IntensityFormula) -> Self {
        self.formula = formula;
        self
    }

    pub fn orientation(mut self, orientation: MomentOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// 计算所有请求的 Miller 指数处的强度
    pub fn calculate(&self, supercell: &ModulatedSupercell, request: &MillerRequest) -> Result<BraggResult> {
        if supercell.labels.len() != supercell.positions.len()
            || supercell.moments.len() != supercell.positions.len()
        {
            return Err(MandyError::Other(format!(
                "Supercell is inconsistent: {} labels, {} positions, {} moments",
                supercell.labels.len(),
                supercell.positions.len(),
                supercell.moments.len()
            )));
        }

        let (slots, resolved) = self.resolve_sites(supercell)?;

        let peaks = request
            .triples()
            .into_par_iter()
            .filter(|hkl| !is_origin(hkl))
            .map(|hkl| BraggPeak {
                intensity: self.intensity_at(&hkl, supercell, &slots, &resolved),
                index: hkl,
            })
            .collect();

        Ok(BraggResult { peaks })
    }

    /// 为超胞每个位置找到位点，并为用到的位点解析形状因子
    ///
    /// 返回 (每个位置的位点槽位, 槽位对应的已解析位点)。
    fn resolve_sites(&self, supercell: &ModulatedSupercell) -> Result<(Vec<usize>, Vec<ResolvedSite>)> {
        let mut site_to_slot: Vec<Option<usize>> = vec![None; self.sites.len()];
        let mut resolved = Vec::new();
        let mut slots = Vec::with_capacity(supercell.len());

        for label in &supercell.labels {
            let site_idx = self.sites.position_of(label)?;
            let slot = match site_to_slot[site_idx] {
                Some(slot) => slot,
                None => {
                    let site = &self.sites.sites()[site_idx];
                    let factor = self.table.resolve(&site.ion, site.quantum.l, site.quantum.s)?;
                    resolved.push(ResolvedSite {
                        factor,
                        norm: factor.normalization(),
                    });
                    site_to_slot[site_idx] = Some(resolved.len() - 1);
                    resolved.len() - 1
                }
            };
            slots.push(slot);
        }

        Ok((slots, resolved))
    }

    /// 单个 Miller 指数的强度
    fn intensity_at(
        &self,
        hkl: &[f64; 3],
        supercell: &ModulatedSupercell,
        slots: &[usize],
        resolved: &[ResolvedSite],
    ) -> f64 {
        let q = self.geometry.reciprocal_vector(hkl);
        let s = norm(&q) / (4.0 * PI);
        let weights: Vec<f64> = resolved.iter().map(|site| site.weight(s)).collect();

        match self.formula {
            IntensityFormula::SelectionRule => {
                let angles = &self.geometry.reciprocal_angles;
                let lengths = &self.geometry.reciprocal_lengths;
                let global = match self.orientation {
                    MomentOrientation::Global(direction) => {
                        Some(selection_rule(&direction, hkl, angles, lengths))
                    }
                    MomentOrientation::PerSite => None,
                };

                let f = self.structure_factor(&q, supercell, |j| {
                    let rule = global.unwrap_or_else(|| {
                        selection_rule(&supercell.moments[j], hkl, angles, lengths)
                    });
                    rule * weights[slots[j]]
                });

                f.iter().map(|c| (c * c.conj()).re).sum()
            }
            IntensityFormula::OrthogonalProjection => {
                let f = self.structure_factor(&q, supercell, |j| weights[slots[j]]);
                let q2 = dot(&q, &q);
                if q2 == 0.0 {
                    return 0.0;
                }

                let qc = q.map(|x| Complex64::new(x, 0.0));
                let projected = cross_c(&qc, &cross_c(&f, &qc)).map(|c| c / q2);
                projected.iter().map(|c| (c.conj() * c).re).sum()
            }
        }
    }

    /// F = Σⱼ weight(j) · mⱼ · exp(-i Q·rⱼ)
    fn structure_factor<W>(&self, q: &[f64; 3], supercell: &ModulatedSupercell, weight: W) -> [Complex64; 3]
    where
        W: Fn(usize) -> f64,
    {
        let mut f = [Complex64::new(0.0, 0.0); 3];
        for (j, (position, moment)) in supercell.positions.iter().zip(&supercell.moments).enumerate() {
            let w = weight(j);
            if w == 0.0 {
                continue;
            }
            let phase = Complex64::from_polar(w, -dot(q, position));
            for c in 0..3 {
                f[c] += phase * moment[c];
            }
        }
        f
    }
}

fn is_origin(hkl: &[f64; 3]) -> bool {
    hkl.iter().all(|&x| x == 0.0)
}

/// 复向量叉积
fn cross_c(a: &[Complex64; 3], b: &[Complex64; 3]) -> [Complex64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
