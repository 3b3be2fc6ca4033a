//! # 模拟任务文件
//!
//! 任务以 JSON 描述：结构（晶格参数或晶格向量 + 分数坐标原子）、位置标签、
//! 磁性位点、可选的调制、Miller 扫描、强度公式与全局磁矩方向。
//!
//! ## 文件示例
//! ```json
//! {
//!   "name": "Cr",
//!   "structure": {
//!     "lattice": { "a": 2.88, "b": 2.88, "c": 2.88, "alpha": 90, "beta": 90, "gamma": 90 },
//!     "atoms": [
//!       { "element": "Cr", "position": [0, 0, 0] },
//!       { "element": "Cr", "position": [0.5, 0.5, 0.5], "label": "Cr0" }
//!     ]
//!   },
//!   "sites": [
//!     { "label": "Cr",  "ion": "Cr0", "moment": [1, 0, 0], "term": "7S" },
//!     { "label": "Cr0", "ion": "Cr0", "moment": [-1, 0, 0], "l_s": [0, 3] }
//!   ],
//!   "modulation": { "wavevector": [0, 0, 0.05], "u": [1, 0, 0], "tiles": [1, 1, 20] },
//!   "miller": { "h": [0], "k": [0], "l": { "start": 0.9, "step": 0.05, "count": 5 } },
//!   "formula": "orthogonal-projection"
//! }
//! ```
//!
//! 标签来源优先级：`labels` 列表 > `label_file`（相对任务文件目录）> 原子自带标签或元素符号。
//! `label_file` 与 `form_factors` 的相对路径都以任务文件所在目录为基准。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/structure.rs`, `models/site.rs`, `models/unit_cell.rs`
//! - 使用 `magnetic/` 的调制、强度与形状因子类型

use crate::error::{MandyError, Result};
use crate::magnetic::form_factor::FormFactorTable;
use crate::magnetic::intensity::{IntensityFormula, MillerRequest, MomentOrientation};
use crate::magnetic::modulation::{ModulatedSupercell, Modulation, ModulationMode, TileCount};
use crate::models::unit_cell::{default_labeler, CachedLabels, InlineLabels, SiteLabeler};
use crate::models::{
    Atom, Crystal, CrystalGeometry, Lattice, MagneticSite, QuantumNumbers, SiteTable, UnitCellTable,
};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 模拟任务
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: String,
    pub structure: StructureSpec,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub label_file: Option<PathBuf>,
    pub sites: Vec<SiteSpec>,
    #[serde(default)]
    pub modulation: Option<ModulationSpec>,
    pub miller: MillerSpec,
    #[serde(default)]
    pub formula: IntensityFormula,
    #[serde(default)]
    pub orientation: Option<[f64; 3]>,
    #[serde(default)]
    pub form_factors: Option<PathBuf>,

    /// 任务文件所在目录
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructureSpec {
    pub lattice: LatticeSpec,
    pub atoms: Vec<Atom>,
}

/// 晶格：参数形式或向量形式
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LatticeSpec {
    Parameters {
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    },
    Vectors {
        vectors: [[f64; 3]; 3],
    },
}

impl LatticeSpec {
    pub fn to_lattice(&self) -> Result<Lattice> {
        match *self {
            LatticeSpec::Parameters {
                a,
                b,
                c,
                alpha,
                beta,
                gamma,
            } => Lattice::try_from_parameters(a, b, c, alpha, beta, gamma),
            LatticeSpec::Vectors { vectors } => Ok(Lattice::from_vectors(vectors)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSpec {
    pub label: String,
    pub ion: String,
    pub moment: [f64; 3],
    /// 直接给出 [L, S]
    #[serde(default)]
    pub l_s: Option<[f64; 2]>,
    /// 基态谱项符号，如 `5D`
    #[serde(default)]
    pub term: Option<String>,
}

impl SiteSpec {
    /// `l_s` 优先，其次谱项符号，都没有时使用默认值
    pub fn quantum(&self) -> Result<QuantumNumbers> {
        match (&self.l_s, &self.term) {
            (Some([l, s]), _) => Ok(QuantumNumbers::new(*l, *s)),
            (None, Some(term)) => QuantumNumbers::from_term_symbol(term),
            (None, None) => Ok(QuantumNumbers::FALLBACK),
        }
    }

    fn uses_fallback(&self) -> bool {
        self.l_s.is_none() && self.term.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModulationSpec {
    pub wavevector: [f64; 3],
    pub u: [f64; 3],
    #[serde(default)]
    pub v: [f64; 3],
    #[serde(default = "unit_amplitude")]
    pub m1: f64,
    #[serde(default = "unit_amplitude")]
    pub m2: f64,
    /// 省略时由传播矢量自动推导
    #[serde(default)]
    pub tiles: Option<[usize; 3]>,
    #[serde(default)]
    pub mode: ModulationMode,
}

fn unit_amplitude() -> f64 {
    1.0
}

impl ModulationSpec {
    pub fn to_modulation(&self) -> Modulation {
        Modulation {
            wavevector: self.wavevector,
            u: self.u,
            v: self.v,
            m1: self.m1,
            m2: self.m2,
            tiles: match self.tiles {
                Some(counts) => TileCount::Explicit(counts),
                None => TileCount::AutoFromWavevector,
            },
            mode: self.mode,
        }
    }
}

/// Miller 扫描的一个轴：显式列表或等步长范围
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MillerAxis {
    Values(Vec<f64>),
    Range { start: f64, step: f64, count: usize },
}

impl MillerAxis {
    pub fn values(&self, axis: &str) -> Result<Vec<f64>> {
        let values = match self {
            MillerAxis::Values(values) => values.clone(),
            MillerAxis::Range { start, step, count } => {
                if *count > 1 && *step == 0.0 {
                    return Err(MandyError::InvalidRange(format!(
                        "{}: step must be non-zero when count > 1",
                        axis
                    )));
                }
                // 消除累加误差，如 0.1 * 3 = 0.30000000000000004
                (0..*count)
                    .map(|i| ((start + i as f64 * step) * 1e10).round() / 1e10)
                    .collect()
            }
        };

        if values.is_empty() {
            return Err(MandyError::InvalidRange(format!("{}: axis is empty", axis)));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MandyError::InvalidRange(format!("{}: non-finite index", axis)));
        }
        Ok(values)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MillerSpec {
    pub h: MillerAxis,
    pub k: MillerAxis,
    pub l: MillerAxis,
}

impl Job {
    /// 读取任务文件
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MandyError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| MandyError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut job = Self::parse(&content, &path.display().to_string())?;
        job.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(job)
    }

    /// 从 JSON 字符串解析，相对路径以当前目录为基准
    pub fn parse(content: &str, source: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MandyError::ParseError {
            format: "job".to_string(),
            path: source.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn crystal(&self) -> Result<Crystal> {
        Ok(Crystal::new(
            self.name.clone(),
            self.structure.lattice.to_lattice()?,
            self.structure.atoms.clone(),
        ))
    }

    pub fn geometry(&self) -> Result<CrystalGeometry> {
        CrystalGeometry::from_lattice(&self.structure.lattice.to_lattice()?)
    }

    /// 晶胞位置表：笛卡尔坐标 + 标签
    pub fn unit_cell(&self) -> Result<UnitCellTable> {
        let crystal = self.crystal()?;
        let labels = self.labeler().resolve(&crystal.atoms)?;
        UnitCellTable::from_labels(labels, crystal.cartesian_positions())
    }

    fn labeler(&self) -> Box<dyn SiteLabeler> {
        if let Some(labels) = &self.labels {
            Box::new(InlineLabels(labels.clone()))
        } else if let Some(file) = &self.label_file {
            Box::new(CachedLabels::new(self.base_dir.join(file)))
        } else {
            Box::new(default_labeler())
        }
    }

    /// 把晶胞各行的标签写入 `dir/<name>SiteNames.dat`，供 `label_file` 复用
    pub fn save_labels(&self, cell: &UnitCellTable, dir: &Path) -> Result<PathBuf> {
        let cache = CachedLabels::new(dir.join(CachedLabels::default_file_name(&self.name)));
        let labels: Vec<String> = cell.rows().iter().map(|row| row.label.clone()).collect();
        cache.save(&labels)?;
        Ok(cache.path().to_path_buf())
    }

    pub fn site_table(&self) -> Result<SiteTable> {
        let sites = self
            .sites
            .iter()
            .map(|spec| -> Result<MagneticSite> {
                Ok(MagneticSite::new(
                    spec.label.clone(),
                    spec.ion.clone(),
                    spec.moment,
                    spec.quantum()?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        SiteTable::new(sites)
    }

    /// 加载时发现的问题（不致命）
    pub fn warnings(&self) -> Vec<String> {
        self.sites
            .iter()
            .filter(|spec| spec.uses_fallback())
            .map(|spec| {
                format!(
                    "Site '{}' ({}) has no l_s or term, using 3P (L=1, S=1)",
                    spec.label, spec.ion
                )
            })
            .collect()
    }

    pub fn modulation(&self) -> Option<Modulation> {
        self.modulation.as_ref().map(ModulationSpec::to_modulation)
    }

    /// 构建超胞：有调制时按调制平铺，否则为单个晶胞
    pub fn supercell(
        &self,
        cell: &UnitCellTable,
        sites: &SiteTable,
        geometry: &CrystalGeometry,
    ) -> Result<ModulatedSupercell> {
        match self.modulation() {
            Some(modulation) => modulation.create_modulation(cell, sites, geometry),
            None => ModulatedSupercell::unmodulated(cell, sites),
        }
    }

    pub fn miller_request(&self) -> Result<MillerRequest> {
        Ok(MillerRequest::new(
            self.miller.h.values("h")?,
            self.miller.k.values("k")?,
            self.miller.l.values("l")?,
        ))
    }

    pub fn orientation(&self) -> MomentOrientation {
        match self.orientation {
            Some(direction) => MomentOrientation::Global(direction),
            None => MomentOrientation::PerSite,
        }
    }

    /// 内置表，依次合并任务指定的表和 `extra`（命令行给出）
    pub fn form_factor_table(&self, extra: Option<&Path>) -> Result<FormFactorTable> {
        let mut table = FormFactorTable::builtin();
        if let Some(file) = &self.form_factors {
            table.merge(FormFactorTable::from_file(&self.base_dir.join(file))?);
        }
        if let Some(file) = extra {
            table.merge(FormFactorTable::from_file(file)?);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CR_JOB: &str = r#"{
        "name": "Cr",
        "structure": {
            "lattice": { "a": 2.88, "b": 2.88, "c": 2.88, "alpha": 90, "beta": 90, "gamma": 90 },
            "atoms": [
                { "element": "Cr", "position": [0, 0, 0] },
                { "element": "Cr", "position": [0.5, 0.5, 0.5], "label": "Cr0" }
            ]
        },
        "sites": [
            { "label": "Cr", "ion": "Cr0", "moment": [1, 0, 0], "term": "7S" },
            { "label": "Cr0", "ion": "Cr0", "moment": [-1, 0, 0], "l_s": [0, 3] }
        ],
        "modulation": { "wavevector": [0, 0, 0.05], "u": [1, 0, 0], "tiles": [1, 1, 20] },
        "miller": { "h": [0, 1], "k": [0], "l": { "start": 0.9, "step": 0.1, "count": 3 } },
        "formula": "orthogonal-projection"
    }"#;

    #[test]
    fn test_parse_cr_job() {
        let job = Job::parse(CR_JOB, "inline").unwrap();
        assert_eq!(job.name, "Cr");
        assert_eq!(job.formula, IntensityFormula::OrthogonalProjection);
        assert_eq!(job.orientation(), MomentOrientation::PerSite);
        assert!(job.warnings().is_empty());

        let cell = job.unit_cell().unwrap();
        assert_eq!(cell.labels(), vec!["Cr", "Cr0"]);
        assert!((cell.rows()[1].position[2] - 1.44).abs() < 1e-10);

        let sites = job.site_table().unwrap();
        let cr = sites.get("Cr").unwrap();
        assert_eq!(cr.quantum, QuantumNumbers::new(0.0, 3.0));

        let modulation = job.modulation().unwrap();
        assert_eq!(modulation.tiles, TileCount::Explicit([1, 1, 20]));
        assert_eq!(modulation.m1, 1.0);
        assert_eq!(modulation.v, [0.0; 3]);
        assert_eq!(modulation.mode, ModulationMode::Amplitude);
    }

    #[test]
    fn test_miller_range_axis() {
        let job = Job::parse(CR_JOB, "inline").unwrap();
        let request = job.miller_request().unwrap();
        assert_eq!(request.h, vec![0.0, 1.0]);
        assert_eq!(request.l, vec![0.9, 1.0, 1.1]);
        assert_eq!(request.len(), 6);
    }

    #[test]
    fn test_empty_axis_is_rejected() {
        let axis = MillerAxis::Range {
            start: 0.0,
            step: 0.1,
            count: 0,
        };
        assert!(matches!(axis.values("l"), Err(MandyError::InvalidRange(_))));

        let axis = MillerAxis::Range {
            start: 1.0,
            step: 0.0,
            count: 4,
        };
        assert!(axis.values("l").is_err());
    }

    #[test]
    fn test_lattice_vectors_and_fallback_quantum_numbers() {
        let content = r#"{
            "name": "hex",
            "structure": {
                "lattice": { "vectors": [[4.8, 0, 0], [-2.4, 4.1569, 0], [0, 0, 7.9]] },
                "atoms": [{ "element": "Fe", "position": [0, 0, 0] }]
            },
            "labels": ["Fe2a"],
            "sites": [{ "label": "Fe2a", "ion": "Fe2", "moment": [0, 0, 1] }],
            "miller": { "h": [0], "k": [0], "l": [1, 2] },
            "orientation": [0, 1, 0]
        }"#;
        let job = Job::parse(content, "inline").unwrap();

        let (a, _, c, _, _, gamma) = job.crystal().unwrap().lattice.parameters();
        assert!((a - 4.8).abs() < 1e-3);
        assert!((c - 7.9).abs() < 1e-10);
        assert!((gamma - 120.0).abs() < 1e-2);

        assert_eq!(job.unit_cell().unwrap().labels(), vec!["Fe2a"]);
        assert_eq!(job.site_table().unwrap().sites()[0].quantum, QuantumNumbers::FALLBACK);
        assert_eq!(job.warnings().len(), 1);
        assert_eq!(job.orientation(), MomentOrientation::Global([0.0, 1.0, 0.0]));
        assert!(job.modulation().is_none());
        assert_eq!(job.formula, IntensityFormula::SelectionRule);
    }

    #[test]
    fn test_zero_gamma_job_is_rejected() {
        let content = CR_JOB.replacen(r#""gamma": 90"#, r#""gamma": 0"#, 1);
        let job = Job::parse(&content, "inline").unwrap();
        assert!(matches!(job.geometry(), Err(MandyError::DegenerateLattice(_))));
        assert!(matches!(job.unit_cell(), Err(MandyError::DegenerateLattice(_))));
    }

    #[test]
    fn test_saved_labels_round_trip_through_label_file() {
        let dir = std::env::temp_dir().join(format!("mandy-save-labels-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let job = Job::parse(CR_JOB, "inline").unwrap();
        let cell = job.unit_cell().unwrap();
        let path = job.save_labels(&cell, &dir).unwrap();
        assert_eq!(path, dir.join("CrSiteNames.dat"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Cr\nCr0\n");

        let content = CR_JOB.replacen(r#""sites""#, r#""label_file": "CrSiteNames.dat", "sites""#, 1);
        fs::write(dir.join("cr.json"), content).unwrap();
        let reloaded = Job::load(&dir.join("cr.json")).unwrap();
        assert_eq!(reloaded.unit_cell().unwrap().labels(), vec!["Cr", "Cr0"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_label_file_relative_to_job() {
        let dir = std::env::temp_dir().join(format!("mandy-job-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let content = CR_JOB.replacen(r#""sites""#, r#""label_file": "CrSiteNames.dat", "sites""#, 1);
        fs::write(dir.join("cr.json"), content).unwrap();
        CachedLabels::new(dir.join("CrSiteNames.dat"))
            .save(&["Cr".to_string(), "Cr0".to_string()])
            .unwrap();

        let job = Job::load(&dir.join("cr.json")).unwrap();
        assert_eq!(job.unit_cell().unwrap().labels(), vec!["Cr", "Cr0"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unmodulated_supercell() {
        let content = CR_JOB.replacen(
            r#""modulation": { "wavevector": [0, 0, 0.05], "u": [1, 0, 0], "tiles": [1, 1, 20] },"#,
            "",
            1,
        );
        let job = Job::parse(&content, "inline").unwrap();
        let geometry = job.geometry().unwrap();
        let supercell = job
            .supercell(&job.unit_cell().unwrap(), &job.site_table().unwrap(), &geometry)
            .unwrap();
        assert_eq!(supercell.len(), 2);
        assert_eq!(supercell.tiles, [1, 1, 1]);
        assert_eq!(supercell.moments[1], [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let result = Job::parse("{ \"name\": 1 }", "broken.json");
        assert!(matches!(result, Err(MandyError::ParseError { .. })));
    }
}
