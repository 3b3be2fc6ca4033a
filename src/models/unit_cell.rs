//! # 晶胞位置表与位点标签
//!
//! `UnitCellTable` 是 (标签, 笛卡尔坐标) 的有序记录序列，附带标签 → 行号索引。
//! 同一标签可以出现多次（对称等效原子）；插入顺序决定超胞与求和的迭代顺序。
//!
//! 位置行的标签由 `SiteLabeler` 提供：预置列表、标签缓存文件（每行一个标签，
//! 即 `<name>SiteNames.dat` 约定）或调用方回调。任何实现都不读取标准输入。
//!
//! ## 依赖关系
//! - 被 `models/job.rs` 和 `magnetic/modulation.rs` 使用

use crate::error::{MandyError, Result};
use crate::models::Atom;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 晶胞中的一行：标签与笛卡尔坐标
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCellRow {
    pub label: String,
    pub position: [f64; 3],
}

/// 晶胞位置表
#[derive(Debug, Clone, Default)]
pub struct UnitCellTable {
    rows: Vec<UnitCellRow>,
    index: HashMap<String, Vec<usize>>,
}

impl UnitCellTable {
    pub fn new(rows: Vec<UnitCellRow>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            index.entry(row.label.clone()).or_default().push(i);
        }
        UnitCellTable { rows, index }
    }

    /// 将标签与位置逐行配对；数量不一致为配置错误
    pub fn from_labels(labels: Vec<String>, positions: Vec<[f64; 3]>) -> Result<Self> {
        if labels.len() != positions.len() {
            return Err(MandyError::LabelCountMismatch {
                expected: positions.len(),
                found: labels.len(),
            });
        }

        let rows = labels
            .into_iter()
            .zip(positions)
            .map(|(label, position)| UnitCellRow { label, position })
            .collect();

        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[UnitCellRow] {
        &self.rows
    }

    /// 某标签对应的全部行号（按插入顺序）
    pub fn rows_for(&self, label: &str) -> &[usize] {
        self.index.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 按首次出现顺序列出不同的标签
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.label.as_str()) {
                seen.push(row.label.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 位点标签解析器
pub trait SiteLabeler {
    /// 为每个原子返回一个标签，顺序与 `atoms` 一致
    fn resolve(&mut self, atoms: &[Atom]) -> Result<Vec<String>>;
}

/// 预置的标签列表
#[derive(Debug, Clone)]
pub struct InlineLabels(pub Vec<String>);

impl SiteLabeler for InlineLabels {
    fn resolve(&mut self, atoms: &[Atom]) -> Result<Vec<String>> {
        check_count(atoms.len(), self.0.len())?;
        Ok(self.0.clone())
    }
}

/// 标签缓存文件（每行一个标签）
#[derive(Debug, Clone)]
pub struct CachedLabels {
    path: PathBuf,
}

impl CachedLabels {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CachedLabels { path: path.into() }
    }

    /// 缓存文件的默认名称：`<name>SiteNames.dat`
    pub fn default_file_name(structure_name: &str) -> String {
        format!("{}SiteNames.dat", structure_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入缓存文件
    pub fn save(&self, labels: &[String]) -> Result<()> {
        let mut content = labels.join("\n");
        content.push('\n');
        fs::write(&self.path, content).map_err(|e| MandyError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

impl SiteLabeler for CachedLabels {
    fn resolve(&mut self, atoms: &[Atom]) -> Result<Vec<String>> {
        if !self.path.is_file() {
            return Err(MandyError::FileNotFound {
                path: self.path.display().to_string(),
            });
        }

        let content = fs::read_to_string(&self.path).map_err(|e| MandyError::FileReadError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let labels: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        check_count(atoms.len(), labels.len())?;
        Ok(labels)
    }
}

/// 调用方回调：按 (行号, 原子) 生成标签
pub struct FnLabeler<F>(pub F);

impl<F> SiteLabeler for FnLabeler<F>
where
    F: FnMut(usize, &Atom) -> String,
{
    fn resolve(&mut self, atoms: &[Atom]) -> Result<Vec<String>> {
        Ok(atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| (self.0)(i, atom))
            .collect())
    }
}

/// 默认标签：原子自带标签，否则元素符号
pub fn default_labeler() -> FnLabeler<impl FnMut(usize, &Atom) -> String> {
    FnLabeler(|_, atom: &Atom| atom.label.clone().unwrap_or_else(|| atom.element.clone()))
}

fn check_count(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(MandyError::LabelCountMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nbfe2_atoms() -> Vec<Atom> {
        vec![
            Atom::new("Fe", [0.0, 0.0, 0.0]),
            Atom::new("Fe", [0.0, 0.0, 0.5]),
            Atom::new("Nb", [1.0 / 3.0, 2.0 / 3.0, 0.06]),
        ]
    }

    #[test]
    fn test_table_preserves_order_and_duplicates() {
        let table = UnitCellTable::from_labels(
            vec!["Fe2a".into(), "Fe2a".into(), "Nb".into()],
            vec![[0.0; 3], [0.0, 0.0, 4.0], [1.0, 1.0, 0.5]],
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows_for("Fe2a"), &[0, 1]);
        assert_eq!(table.rows_for("Nb"), &[2]);
        assert!(table.rows_for("Fe6h").is_empty());
        assert_eq!(table.labels(), vec!["Fe2a", "Nb"]);
    }

    #[test]
    fn test_label_count_mismatch() {
        let result = UnitCellTable::from_labels(vec!["Cr".into()], vec![[0.0; 3], [1.0; 3]]);
        assert!(matches!(
            result,
            Err(MandyError::LabelCountMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_inline_labels_checks_count() {
        let atoms = nbfe2_atoms();
        let mut labeler = InlineLabels(vec!["Fe2a".into(), "Fe2a".into()]);
        assert!(labeler.resolve(&atoms).is_err());
    }

    #[test]
    fn test_default_labeler_uses_atom_label() {
        let mut atoms = nbfe2_atoms();
        atoms[1] = atoms[1].clone().with_label("Fe6h");

        let labels = default_labeler().resolve(&atoms).unwrap();
        assert_eq!(labels, vec!["Fe", "Fe6h", "Nb"]);
    }

    #[test]
    fn test_cached_labels_round_trip() {
        let dir = std::env::temp_dir().join(format!("mandy-labels-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let cache = CachedLabels::new(dir.join(CachedLabels::default_file_name("NbFe2")));

        let labels: Vec<String> = vec!["Fe2a".into(), "Fe6h".into(), "Nb".into()];
        cache.save(&labels).unwrap();

        let mut reader = CachedLabels::new(cache.path());
        assert_eq!(reader.resolve(&nbfe2_atoms()).unwrap(), labels);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cached_labels_missing_file() {
        let mut cache = CachedLabels::new("/nonexistent/mandy/NbFe2SiteNames.dat");
        assert!(matches!(
            cache.resolve(&nbfe2_atoms()),
            Err(MandyError::FileNotFound { .. })
        ));
    }
}
