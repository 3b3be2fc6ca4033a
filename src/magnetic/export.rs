//! # 衍射结果导出
//!
//! ## 支持格式
//! - CSV: h, k, l, intensity（按计算顺序，不排序）
//! - JSON: 任务名、强度公式与全部峰
//! - DAT: 带 `#` 注释头的空白分隔列，便于 gnuplot 等直接读取
//! - 超胞 CSV: label, x, y, z, mx, my, mz
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 和 `commands/supercell.rs` 调用
//! - 使用 `csv` 与 `serde_json`

use crate::error::{MandyError, Result};
use crate::magnetic::intensity::{BraggPeak, BraggResult, IntensityFormula};
use crate::magnetic::modulation::ModulatedSupercell;

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> MandyError + '_ {
    move |e| MandyError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

/// 导出 Bragg 峰为 CSV
pub fn bragg_to_csv(result: &BraggResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["h", "k", "l", "intensity"])?;
    for peak in &result.peaks {
        wtr.write_record(&[
            peak.index[0].to_string(),
            peak.index[1].to_string(),
            peak.index[2].to_string(),
            format!("{:.8e}", peak.intensity),
        ])?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

#[derive(Serialize)]
struct BraggDocument<'a> {
    name: &'a str,
    formula: IntensityFormula,
    count: usize,
    max_intensity: f64,
    peaks: &'a [BraggPeak],
}

/// 导出 Bragg 峰为 JSON
pub fn bragg_to_json(
    result: &BraggResult,
    name: &str,
    formula: IntensityFormula,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let document = BraggDocument {
        name,
        formula,
        count: result.len(),
        max_intensity: result.max_intensity(),
        peaks: &result.peaks,
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writeln!(writer).map_err(write_error(output_path))?;
    writer.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出 Bragg 峰为 DAT 列文本
pub fn bragg_to_dat(
    result: &BraggResult,
    name: &str,
    formula: IntensityFormula,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let mut writer = BufWriter::new(file);

    let header = format!(
        "# Magnetic Bragg intensities: {}\n# Formula: {}\n# Columns: h k l intensity\n#\n",
        name, formula
    );
    writer
        .write_all(header.as_bytes())
        .map_err(write_error(output_path))?;

    for peak in &result.peaks {
        writeln!(
            writer,
            "{:>10.4} {:>10.4} {:>10.4} {:>16.8e}",
            peak.index[0], peak.index[1], peak.index[2], peak.intensity
        )
        .map_err(write_error(output_path))?;
    }

    writer.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出调制超胞（位置与磁矩）为 CSV
pub fn supercell_to_csv(supercell: &ModulatedSupercell, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["label", "x", "y", "z", "mx", "my", "mz"])?;
    for ((label, position), moment) in supercell
        .labels
        .iter()
        .zip(&supercell.positions)
        .zip(&supercell.moments)
    {
        wtr.write_record(&[
            label.clone(),
            format!("{:.6}", position[0]),
            format!("{:.6}", position[1]),
            format!("{:.6}", position[2]),
            format!("{:.6}", moment[0]),
            format!("{:.6}", moment[1]),
            format!("{:.6}", moment[2]),
        ])?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mandy-export-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> BraggResult {
        BraggResult {
            peaks: vec![
                BraggPeak {
                    intensity: 0.5,
                    index: [0.0, 0.0, 1.0],
                },
                BraggPeak {
                    intensity: 0.25,
                    index: [0.0, 0.0, 2.0],
                },
            ],
        }
    }

    #[test]
    fn test_csv_keeps_calculation_order() {
        let dir = scratch_dir("csv");
        let path = dir.join("peaks.csv");
        bragg_to_csv(&sample(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "h,k,l,intensity");
        assert!(lines[1].starts_with("0,0,1,"));
        assert!(lines[2].starts_with("0,0,2,"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_keeps_full_index_precision() {
        let dir = scratch_dir("csv-precision");
        let path = dir.join("peaks.csv");
        let l = 1.0 + 1.0 / 30.0;
        let result = BraggResult {
            peaks: vec![BraggPeak {
                intensity: 1.0,
                index: [0.0, 0.00005, l],
            }],
        };
        bragg_to_csv(&result, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record[1].parse::<f64>().unwrap(), 0.00005);
        assert_eq!(record[2].parse::<f64>().unwrap(), l);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_json_document() {
        let dir = scratch_dir("json");
        let path = dir.join("peaks.json");
        bragg_to_json(&sample(), "Cr", IntensityFormula::SelectionRule, &path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["name"], "Cr");
        assert_eq!(value["formula"], "selection-rule");
        assert_eq!(value["count"], 2);
        assert_eq!(value["peaks"][1]["index"][2], 2.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dat_header_and_rows() {
        let dir = scratch_dir("dat");
        let path = dir.join("peaks.dat");
        bragg_to_dat(&sample(), "Cr", IntensityFormula::OrthogonalProjection, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows.len(), 2);
        let cols: Vec<f64> = rows[0].split_whitespace().map(|t| t.parse().unwrap()).collect();
        assert_eq!(cols, vec![0.0, 0.0, 1.0, 0.5]);
        assert!(content.contains("orthogonal-projection"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_supercell_csv() {
        let dir = scratch_dir("cell");
        let path = dir.join("cell.csv");
        let supercell = ModulatedSupercell {
            labels: vec!["Cr".into(), "Cr0".into()],
            positions: vec![[0.0; 3], [1.44; 3]],
            moments: vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            tiles: [1, 1, 1],
            notes: Vec::new(),
        };
        supercell_to_csv(&supercell, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Cr0,1.440000,1.440000,1.440000,-1.000000,0.000000,0.000000");

        fs::remove_dir_all(&dir).ok();
    }
}
