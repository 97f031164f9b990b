use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{RunConfig, output_path};
use crate::error::HeatResult;
use crate::gradient::gradient_field;
use crate::parser_registry::ParserRegistry;
use crate::parsers::VolumeHeader;
use crate::performance::PerformanceStore;
use crate::quantize::distance_field;
use crate::roles::{Role, classify};
use crate::solver::simulate;
use crate::utils::fetch::stage_input;
use crate::utils::parser::VolumePayload;

pub const TEMPERATURE_SUFFIX: &str = "_temperature";
pub const LABEL_SUFFIX: &str = "_label";
pub const GRADIENT_SUFFIX: &str = "_gradient";

/// 一次运行写出的文件
#[derive(Debug, Clone, Serialize)]
pub struct RunOutputs {
    pub temperature: PathBuf,
    pub label: Option<PathBuf>,
    pub gradient: Option<PathBuf>,
    pub shape: [usize; 3],
    pub simulated_voxels: usize,
}

/// 读取标签 → 分类 → 扩散 → (分段 / 梯度) → 写出
///
/// ## 参数
/// - `config`: 输入路径、标签组、求解参数与可选输出
/// - `perf`: 各阶段耗时记录，由调用方决定是否写出
///
/// ## 返回
/// 写出的文件路径。任何格式、资源或配置错误都会立即中止并返回。
pub fn run(config: &RunConfig, perf: &PerformanceStore) -> HeatResult<RunOutputs> {
    // ==================== 步骤 1: 参数验证 ====================
    config.validate()?;
    let registry = ParserRegistry::new();

    // ==================== 步骤 2: 准备输入（必要时下载） ====================
    let staged = perf.measure("fetch", &config.input, "", || stage_input(&config.input))?;
    let parser = registry.require_parser_for_file(staged.name())?;

    // ==================== 步骤 3: 读取标签体数据 ====================
    log::info!("[读取] {} ({})", staged.name().display(), parser.name());
    let (labels, header) = perf.measure("read", &config.input, parser.name(), || {
        parser.parse_from_file(staged.path())
    })?;
    log::debug!("[读取] 维度 {:?}", labels.get_shape());

    let output_dir = match &config.output_dir {
        Some(dir) => dir.clone(),
        None if staged.is_remote() => PathBuf::from("."),
        None => staged
            .name()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let input_name = staged.name().to_path_buf();
    // 读完即可删除临时文件
    drop(staged);

    // ==================== 步骤 4: 标签分类 ====================
    let (roles, initial) = classify(&labels, &config.labels);
    let simulated_voxels = roles
        .get_data()
        .iter()
        .filter(|role| **role == Role::Simulate)
        .count();

    // ==================== 步骤 5: 扩散模拟 ====================
    log::info!(
        "[模拟] ω = {}，{} 次迭代，{} 个模拟体素",
        config.solver.omega,
        config.solver.iterations,
        simulated_voxels
    );
    let msg = format!("{} 次迭代", config.solver.iterations);
    let field = perf.measure("simulate", &config.input, &msg, || {
        simulate(&roles, initial, &config.solver)
    })?;

    let writer = OutputWriter {
        registry: &registry,
        input_name: &input_name,
        output_dir: &output_dir,
    };

    // ==================== 步骤 6: 距离分段（可选） ====================
    let label = match config.segments {
        Some(segments) => {
            let distance = perf.measure("segment", &config.input, "", || {
                distance_field(&field, &roles, segments)
            })?;
            Some(writer.write(perf, LABEL_SUFFIX, VolumePayload::Labels(&distance), &header)?)
        }
        None => None,
    };

    // ==================== 步骤 7: 梯度场（可选） ====================
    let gradient = if config.gradient {
        let vectors = perf.measure("gradient", &config.input, "", || {
            gradient_field(&field, &roles)
        })?;
        Some(writer.write(
            perf,
            GRADIENT_SUFFIX,
            VolumePayload::Gradient(&vectors),
            &header,
        )?)
    } else {
        None
    };

    // ==================== 步骤 8: 温度场 ====================
    let temperature =
        writer.write(perf, TEMPERATURE_SUFFIX, VolumePayload::Scalars(&field), &header)?;

    Ok(RunOutputs {
        temperature,
        label,
        gradient,
        shape: labels.get_shape(),
        simulated_voxels,
    })
}

/// 输出文件与输入同名，按后缀区分，容器格式跟随扩展名
struct OutputWriter<'a> {
    registry: &'a ParserRegistry,
    input_name: &'a Path,
    output_dir: &'a Path,
}

impl OutputWriter<'_> {
    fn write(
        &self,
        perf: &PerformanceStore,
        suffix: &str,
        payload: VolumePayload<'_>,
        header: &VolumeHeader,
    ) -> HeatResult<PathBuf> {
        let path = output_path(self.input_name, self.output_dir, suffix)?;
        let parser = self.registry.require_parser_for_file(&path)?;
        let name = path.display().to_string();
        perf.measure("write", &name, parser.name(), || {
            parser.write_to_file(&path, &payload, header)
        })?;
        log::info!("[写出] {}", name);
        Ok(path)
    }
}
