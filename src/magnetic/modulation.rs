//! # 磁超胞调制
//!
//! 将晶胞沿 a1, a2, a3 平铺成超胞，并按传播矢量 q 对每个位置的磁矩施加调制：
//!
//! ```text
//! Amplitude: m(r) = m₀ ⊙ Re[(m1·u + i·m2·v) · exp(-i q·r)]
//! Rotate:    m(r) = |m₀| · Re[(m1·u + i·m2·v) · exp(-i q·r)]
//! ```
//!
//! q 以倒格子分数坐标给出，转换为笛卡尔坐标 q = qh·b1 + qk·b2 + ql·b3（2π 约定），
//! r 为笛卡尔坐标。Amplitude 得到振幅调制（自旋密度波）；Rotate 只保留磁矩大小，
//! 方向在 (u, v) 平面内旋转，用于螺旋（u, v ⊥ q）和摆线（u, v 含 q）结构。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/` 的晶胞位置表、位点表和衍射几何
//! - 结果交给 `magnetic/intensity.rs`

use crate::error::{MandyError, Result};
use crate::models::{CrystalGeometry, SiteTable, UnitCellTable};
use crate::utils::vector::{add, dot, norm, scale};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// 自动推导平铺数时，q 分量低于该值的方向只取一个晶胞
pub const MIN_AUTO_WAVEVECTOR: f64 = 0.01;

const AXES: [&str; 3] = ["x", "y", "z"];

/// 超胞平铺数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCount {
    /// 显式给出 (nx, ny, nz)
    Explicit([usize; 3]),
    /// 由传播矢量推导：n = ceil(1/|q|)
    AutoFromWavevector,
}

/// 平铺数解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct TileResolution {
    pub counts: [usize; 3],
    /// 诊断信息，例如某个方向因 q 过小而取 1
    pub notes: Vec<String>,
}

impl TileCount {
    /// 解析为具体的 (nx, ny, nz)，只在构建超胞时调用一次
    pub fn resolve(&self, q_cart: &[f64; 3]) -> Result<TileResolution> {
        match self {
            TileCount::Explicit(counts) => {
                if counts.contains(&0) {
                    return Err(MandyError::InvalidArgument(format!(
                        "tile counts must be positive, got {:?}",
                        counts
                    )));
                }
                Ok(TileResolution {
                    counts: *counts,
                    notes: Vec::new(),
                })
            }
            TileCount::AutoFromWavevector => {
                let mut counts = [1; 3];
                let mut notes = Vec::with_capacity(3);

                for axis in 0..3 {
                    let q = q_cart[axis].abs();
                    if q >= MIN_AUTO_WAVEVECTOR {
                        counts[axis] = (1.0 / q).ceil() as usize;
                        notes.push(format!("Using n{}={}", AXES[axis], counts[axis]));
                    } else {
                        notes.push(format!(
                            "q < {} ({}-dir), setting n{}=1 to avoid generating hundreds of unit cells; \
                             give explicit tile counts if this is a mistake",
                            MIN_AUTO_WAVEVECTOR, AXES[axis], AXES[axis]
                        ));
                    }
                }

                Ok(TileResolution { counts, notes })
            }
        }
    }
}

/// 调制方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModulationMode {
    /// 振幅调制：基础磁矩逐分量乘以包络
    #[default]
    Amplitude,
    /// 旋转调制：磁矩大小乘以包络方向
    Rotate,
}

impl std::fmt::Display for ModulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModulationMode::Amplitude => write!(f, "amplitude"),
            ModulationMode::Rotate => write!(f, "rotate"),
        }
    }
}

/// 调制参数
#[derive(Debug, Clone)]
pub struct Modulation {
    /// 传播矢量（倒格子分数坐标）
    pub wavevector: [f64; 3],
    /// 调制平面的两个方向
    pub u: [f64; 3],
    pub v: [f64; 3],
    /// 包络振幅
    pub m1: f64,
    pub m2: f64,
    pub tiles: TileCount,
    pub mode: ModulationMode,
}

impl Modulation {
    /// 构建调制超胞
    pub fn create_modulation(
        &self,
        cell: &UnitCellTable,
        sites: &SiteTable,
        geometry: &CrystalGeometry,
    ) -> Result<ModulatedSupercell> {
        let q_cart = geometry.reciprocal_vector(&self.wavevector);
        let TileResolution { counts, notes } = self.tiles.resolve(&q_cart)?;

        let base_moments = base_moments(cell, sites)?;
        let (labels, positions, origins) = tile(cell, &geometry.real, counts);

        let moments = positions
            .iter()
            .zip(&origins)
            .map(|(position, &row)| self.modulate(&base_moments[row], &q_cart, position))
            .collect();

        Ok(ModulatedSupercell {
            labels,
            positions,
            moments,
            tiles: counts,
            notes,
        })
    }

    /// 单个位置的调制磁矩
    fn modulate(&self, base: &[f64; 3], q_cart: &[f64; 3], position: &[f64; 3]) -> [f64; 3] {
        let phase = Complex64::from_polar(1.0, -dot(q_cart, position));
        let envelope: [f64; 3] = std::array::from_fn(|c| {
            (Complex64::new(self.m1 * self.u[c], self.m2 * self.v[c]) * phase).re
        });

        match self.mode {
            ModulationMode::Amplitude => std::array::from_fn(|c| base[c] * envelope[c]),
            ModulationMode::Rotate => scale(&envelope, norm(base)),
        }
    }
}

#[cfg(test)]
impl Modulation {
    /// 自旋密度波：v = 0，沿 u 的振幅调制
    pub fn spin_density_wave(wavevector: [f64; 3], u: [f64; 3], tiles: TileCount) -> Self {
        Modulation {
            wavevector,
            u,
            v: [0.0; 3],
            m1: 1.0,
            m2: 1.0,
            tiles,
            mode: ModulationMode::Amplitude,
        }
    }
}

/// 调制磁超胞
///
/// `positions[i]`、`moments[i]` 与 `labels[i]` 一一对应；
/// 修改调制参数时整体重建，不做原地修改。
#[derive(Debug, Clone)]
pub struct ModulatedSupercell {
    /// 每个位置来源的晶胞标签
    pub labels: Vec<String>,
    /// 笛卡尔坐标
    pub positions: Vec<[f64; 3]>,
    /// 调制后的磁矩
    pub moments: Vec<[f64; 3]>,
    /// 平铺数 (nx, ny, nz)
    pub tiles: [usize; 3],
    /// 构建时的诊断信息
    pub notes: Vec<String>,
}

impl ModulatedSupercell {
    /// 不加调制的单个晶胞，磁矩取位点表中的基础磁矩
    pub fn unmodulated(cell: &UnitCellTable, sites: &SiteTable) -> Result<Self> {
        let moments = base_moments(cell, sites)?;
        let (labels, positions): (Vec<String>, Vec<[f64; 3]>) = cell
            .rows()
            .iter()
            .map(|row| (row.label.clone(), row.position))
            .unzip();

        Ok(ModulatedSupercell {
            labels,
            positions,
            moments,
            tiles: [1, 1, 1],
            notes: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 总晶胞数 nx*ny*nz
    pub fn cell_count(&self) -> usize {
        self.tiles.iter().product()
    }
}

/// 每一行的基础磁矩；标签不在位点表中为配置错误
///
/// 每个标签只查一次位点表，再按索引写回该标签的全部行。
fn base_moments(cell: &UnitCellTable, sites: &SiteTable) -> Result<Vec<[f64; 3]>> {
    let mut moments = vec![[0.0; 3]; cell.len()];
    for label in cell.labels() {
        let moment = sites.get(label)?.moment;
        for &row in cell.rows_for(label) {
            moments[row] = moment;
        }
    }
    Ok(moments)
}

/// 平铺晶胞：晶胞内位点最内层，其次 a1、a2，a3 最外层
///
/// 返回 (标签, 位置, 来源行号)。
fn tile(
    cell: &UnitCellTable,
    real: &[[f64; 3]; 3],
    counts: [usize; 3],
) -> (Vec<String>, Vec<[f64; 3]>, Vec<usize>) {
    let total = cell.len() * counts.iter().product::<usize>();
    let mut labels = Vec::with_capacity(total);
    let mut positions = Vec::with_capacity(total);
    let mut origins = Vec::with_capacity(total);

    for iz in 0..counts[2] {
        for iy in 0..counts[1] {
            for ix in 0..counts[0] {
                let shift = add(
                    &add(&scale(&real[0], ix as f64), &scale(&real[1], iy as f64)),
                    &scale(&real[2], iz as f64),
                );
                for (row_idx, row) in cell.rows().iter().enumerate() {
                    labels.push(row.label.clone());
                    positions.push(add(&row.position, &shift));
                    origins.push(row_idx);
                }
            }
        }
    }

    (labels, positions, origins)
}
