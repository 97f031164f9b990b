//! 运行参数

use std::path::{Path, PathBuf};

use crate::error::{HeatError, HeatResult};

/// 三组标签：低温、高温、参与模拟
///
/// 同一个标签出现在多组中时，后面的组生效（模拟 > 高温 > 低温）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSets {
    pub low: Vec<u8>,
    pub high: Vec<u8>,
    pub simulate: Vec<u8>,
}

/// 扩散求解参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// 松弛系数 ω，1 - 6ω 应保持非负
    pub omega: f32,
    /// 固定迭代次数，没有收敛判断
    pub iterations: usize,
    /// 为 true 时保留非模拟体素的温度
    pub show_all: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            omega: 0.12,
            iterations: 100,
            show_all: false,
        }
    }
}

impl SolverParams {
    /// 显式格式的稳定上界
    pub const STABLE_OMEGA: f32 = 1.0 / 6.0;

    pub fn is_stable(&self) -> bool {
        self.omega >= 0.0 && self.omega <= Self::STABLE_OMEGA
    }
}

/// 距离分段标签存成 uint8，0 留给非模拟体素
pub const MAX_SEGMENTS: usize = 255;

/// 一次运行的全部配置
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// 本地路径或 http(s) URL
    pub input: String,
    pub labels: LabelSets,
    pub solver: SolverParams,
    /// 设置后额外输出距离分段
    pub segments: Option<usize>,
    /// 额外输出梯度场
    pub gradient: bool,
    /// 输出目录，None 时与输入同目录（URL 输入时为当前目录）
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(input: impl Into<String>, labels: LabelSets) -> Self {
        Self {
            input: input.into(),
            labels,
            solver: SolverParams::default(),
            segments: None,
            gradient: false,
            output_dir: None,
        }
    }

    /// 在读取文件、开始模拟之前拒绝不合法的参数
    pub fn validate(&self) -> HeatResult<()> {
        if self.input.trim().is_empty() {
            return Err(HeatError::Configuration(
                "请指定输入标签文件 (mgh/mgz)".to_string(),
            ));
        }
        if let Some(n) = self.segments {
            if !(1..=MAX_SEGMENTS).contains(&n) {
                return Err(HeatError::Configuration(format!(
                    "分段数 {} 超出范围，应在 1..={} 之间",
                    n, MAX_SEGMENTS
                )));
            }
        }
        if !self.solver.omega.is_finite() {
            return Err(HeatError::Configuration(format!(
                "步长 {} 不是有限值",
                self.solver.omega
            )));
        }
        if self.labels.simulate.is_empty() {
            return Err(HeatError::Configuration(
                "至少需要一个 --simulate 标签".to_string(),
            ));
        }
        if !self.solver.is_stable() {
            log::warn!(
                "[配置] 步长 {} 超出稳定范围 [0, 1/6]，结果可能发散",
                self.solver.omega
            );
        }
        Ok(())
    }
}

/// 输出文件名：输入文件名去掉扩展名 + 后缀 + 原扩展名
///
/// 例如 `aseg.mgz` + `_label` -> `aseg_label.mgz`
pub fn output_path(input_name: &Path, dir: &Path, suffix: &str) -> HeatResult<PathBuf> {
    let stem = input_name
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            HeatError::Configuration(format!(
                "无法从 {} 推导输出文件名",
                input_name.display()
            ))
        })?;
    let file_name = match input_name.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext),
        None => format!("{}{}", stem, suffix),
    };
    Ok(dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config() -> RunConfig {
        RunConfig::new(
            "aseg.mgz",
            LabelSets {
                low: vec![1],
                high: vec![2],
                simulate: vec![3],
            },
        )
    }

    #[test]
    fn defaults_match_cli() {
        let params = SolverParams::default();
        assert!((params.omega - 0.12).abs() < 1e-7);
        assert_eq!(params.iterations, 100);
        assert!(!params.show_all);
        assert!(params.is_stable());
    }

    #[test]
    fn segment_count_is_validated() {
        let mut cfg = config();
        cfg.segments = Some(0);
        assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::Configuration);
        cfg.segments = Some(256);
        assert!(cfg.validate().is_err());
        cfg.segments = Some(1);
        assert!(cfg.validate().is_ok());
        cfg.segments = Some(255);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn large_omega_is_accepted() {
        let mut cfg = config();
        cfg.solver.omega = 0.5;
        assert!(cfg.validate().is_ok());
        cfg.solver.omega = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_simulate_set_is_rejected() {
        let mut cfg = config();
        cfg.labels.simulate.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn output_names_keep_extension() {
        let dir = Path::new("/out");
        assert_eq!(
            output_path(Path::new("/in/aseg.mgz"), dir, "_label").unwrap(),
            PathBuf::from("/out/aseg_label.mgz")
        );
        assert_eq!(
            output_path(Path::new("brain.mgh"), dir, "_temperature").unwrap(),
            PathBuf::from("/out/brain_temperature.mgh")
        );
        assert!(output_path(Path::new(""), dir, "_x").is_err());
    }
}
