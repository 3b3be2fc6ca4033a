//! # 磁中子衍射模块
//!
//! 从调制磁超胞计算磁 Bragg 峰强度。
//!
//! ## 子模块
//! - `form_factor`: 磁形状因子系数表（<j0>, <j2>）
//! - `selection`: 选择定则 sin²θ
//! - `modulation`: 传播矢量调制与超胞平铺
//! - `intensity`: 结构因子与强度扫描
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`

pub mod export;
pub mod form_factor;
pub mod intensity;
pub mod modulation;
pub mod selection;

pub use form_factor::{FormFactorTable, MagneticFormFactor};
pub use intensity::{BraggPeak, BraggResult, DiffractionCalculator, IntensityFormula, MomentOrientation};
