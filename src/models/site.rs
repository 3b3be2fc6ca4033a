//! # 磁性位点数据模型
//!
//! 磁性位点（标签、离子名、经典磁矩、量子数 L/S）及按标签索引的位点表。
//!
//! ## 量子数
//! 基态谱项符号 `(2S+1)L` 给出 L 与 S，例如 `6D` → S = 2.5, L = 2。
//! 谱项查询（NIST 等外部服务）不属于本模块，这里只负责解析已有的符号。
//!
//! ## 依赖关系
//! - 被 `models/job.rs` 和 `magnetic/` 使用
//! - 使用 `regex` 解析谱项符号

use crate::error::{MandyError, Result};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// 轨道量子数字母，下标即 L
const TERM_LETTERS: &str = "SPDFGHIKLMNOQRTUVWXYZ";

static TERM_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*([A-Z])").expect("valid term symbol regex"));

/// 角动量量子数 (L, S)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumNumbers {
    pub l: f64,
    pub s: f64,
}

impl QuantumNumbers {
    /// 谱项查询失败时使用的默认值（谱项 3P：L = 1, S = 1）
    pub const FALLBACK: QuantumNumbers = QuantumNumbers { l: 1.0, s: 1.0 };

    pub fn new(l: f64, s: f64) -> Self {
        QuantumNumbers { l, s }
    }

    /// 解析谱项符号，忽略 J 部分（如 `5D<4>` 或 `5D4`）
    pub fn from_term_symbol(term: &str) -> Result<Self> {
        let caps = TERM_SYMBOL
            .captures(term)
            .ok_or_else(|| MandyError::InvalidTermSymbol(term.to_string()))?;

        let multiplicity: f64 = caps[1]
            .parse()
            .map_err(|_| MandyError::InvalidTermSymbol(term.to_string()))?;
        if multiplicity < 1.0 {
            return Err(MandyError::InvalidTermSymbol(term.to_string()));
        }

        let l = TERM_LETTERS
            .find(&caps[2])
            .ok_or_else(|| MandyError::InvalidTermSymbol(term.to_string()))?;

        Ok(QuantumNumbers {
            l: l as f64,
            s: (multiplicity - 1.0) / 2.0,
        })
    }
}

/// 磁性位点
///
/// 在构建晶体之前由调用方创建，之后不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagneticSite {
    /// 位点标签（唯一），区分同种元素的不等价位置，如 Fe2a、Fe6h
    pub label: String,
    /// 离子名，用于查形状因子表，如 Fe2
    pub ion: String,
    /// 经典磁矩（方向与大小）
    pub moment: [f64; 3],
    /// 量子数 (L, S)
    pub quantum: QuantumNumbers,
}

impl MagneticSite {
    pub fn new(
        label: impl Into<String>,
        ion: impl Into<String>,
        moment: [f64; 3],
        quantum: QuantumNumbers,
    ) -> Self {
        MagneticSite {
            label: label.into(),
            ion: ion.into(),
            moment,
            quantum,
        }
    }
}

/// 位点表：保持插入顺序，并按标签建立索引
#[derive(Debug, Clone, Default)]
pub struct SiteTable {
    sites: Vec<MagneticSite>,
    index: HashMap<String, usize>,
}

impl SiteTable {
    /// 创建位点表，重复标签视为配置错误
    pub fn new(sites: Vec<MagneticSite>) -> Result<Self> {
        let mut index = HashMap::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            if index.insert(site.label.clone(), i).is_some() {
                return Err(MandyError::DuplicateSite {
                    label: site.label.clone(),
                });
            }
        }
        Ok(SiteTable { sites, index })
    }

    /// 按标签查找位点的下标
    pub fn position_of(&self, label: &str) -> Result<usize> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| MandyError::MissingSite {
                label: label.to_string(),
            })
    }

    pub fn get(&self, label: &str) -> Result<&MagneticSite> {
        self.position_of(label).map(|i| &self.sites[i])
    }

    pub fn sites(&self) -> &[MagneticSite] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_symbol_sextet_d() {
        let qn = QuantumNumbers::from_term_symbol("6D").unwrap();
        assert_eq!(qn, QuantumNumbers::new(2.0, 2.5));
    }

    #[test]
    fn test_term_symbol_strips_j() {
        let qn = QuantumNumbers::from_term_symbol("5D<4>").unwrap();
        assert_eq!(qn, QuantumNumbers::new(2.0, 2.0));

        let qn = QuantumNumbers::from_term_symbol("7S3").unwrap();
        assert_eq!(qn, QuantumNumbers::new(0.0, 3.0));
    }

    #[test]
    fn test_term_symbol_fallback_matches_3p() {
        let qn = QuantumNumbers::from_term_symbol("3P").unwrap();
        assert_eq!(qn, QuantumNumbers::FALLBACK);
    }

    #[test]
    fn test_term_symbol_invalid() {
        assert!(QuantumNumbers::from_term_symbol("Fe2").is_err());
        assert!(QuantumNumbers::from_term_symbol("").is_err());
        assert!(QuantumNumbers::from_term_symbol("0S").is_err());
    }

    #[test]
    fn test_site_table_lookup() {
        let table = SiteTable::new(vec![
            MagneticSite::new("Fe2a", "Fe2", [0.0, 0.0, 1.0], QuantumNumbers::new(2.0, 2.0)),
            MagneticSite::new("Fe6h", "Fe2", [0.0, 0.0, -2.355], QuantumNumbers::new(2.0, 2.0)),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.position_of("Fe6h").unwrap(), 1);
        assert!((table.get("Fe6h").unwrap().moment[2] + 2.355).abs() < 1e-12);
        assert!(matches!(
            table.get("Nb"),
            Err(MandyError::MissingSite { ref label }) if label == "Nb"
        ));
    }

    #[test]
    fn test_site_table_duplicate_label() {
        let site = MagneticSite::new("Cr", "Cr0", [1.0, 0.0, 0.0], QuantumNumbers::new(0.0, 3.0));
        let result = SiteTable::new(vec![site.clone(), site]);
        assert!(matches!(result, Err(MandyError::DuplicateSite { .. })));
    }
}
