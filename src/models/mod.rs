//! # 数据模型模块
//!
//! 定义晶体结构、磁性位点、晶胞位置表与模拟任务。
//!
//! ## 依赖关系
//! - 被 `magnetic/` 和 `commands/` 使用
//! - 子模块: structure, site, unit_cell, job

pub mod job;
pub mod site;
pub mod structure;
pub mod unit_cell;

pub use job::Job;
pub use site::{MagneticSite, QuantumNumbers, SiteTable};
pub use structure::{Atom, Crystal, CrystalGeometry, Lattice};
pub use unit_cell::UnitCellTable;
