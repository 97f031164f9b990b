use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use heat_distance::config::{LabelSets, RunConfig, SolverParams};
use heat_distance::performance::PerformanceStore;
use heat_distance::pipeline;

/// 在三维标签场上求解热方程
#[derive(Parser)]
#[command(name = "heat")]
#[command(about = "Solving the heat equation on a 3D grid", long_about = None)]
#[command(version)]
struct Cli {
    /// 输出详细日志
    #[arg(long, global = true)]
    verbose: bool,

    /// 把各阶段耗时写入该 JSON 文件
    #[arg(long, global = true, value_name = "FILE")]
    cpuprofile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 对指定标签求解热方程，得到基于距离的细分
    ///
    /// --temp0 / --temp1 的标签固定为低温 / 高温，--simulate 的标签参与扩散，
    /// 其余标签视为反射边界。指定 --label <N> 时额外输出 N 段体素数相近的距离分段。
    ///
    /// 示例: heat --verbose on aseg.mgz --t0 1 --t0 2 --t1 4 -s 3 -s 5 --label 3
    On {
        /// 输入标签文件 (mgh/mgz)，本地路径或 http(s) URL
        input: String,

        /// 低温标签，可重复
        #[arg(long = "temp0", visible_alias = "t0", value_name = "LABEL")]
        temp0: Vec<u8>,

        /// 高温标签，可重复
        #[arg(long = "temp1", visible_alias = "t1", value_name = "LABEL")]
        temp1: Vec<u8>,

        /// 参与模拟的标签，可重复
        #[arg(short = 's', long = "simulate", value_name = "LABEL")]
        simulate: Vec<u8>,

        /// 模拟步长，过大会发散
        #[arg(long, default_value_t = SolverParams::default().omega)]
        stepsize: f32,

        /// 迭代次数
        #[arg(long, default_value_t = SolverParams::default().iterations)]
        iterations: usize,

        /// 输出 N 段距离分段
        #[arg(long, value_name = "N")]
        label: Option<usize>,

        /// 保留所有体素的温度，而不只是模拟体素
        #[arg(long = "show-all-temps", visible_alias = "showAllTemps")]
        show_all_temps: bool,

        /// 输出温度场梯度 (nframes = 3)
        #[arg(long)]
        gradient: bool,

        /// 输出目录，默认与输入文件相同
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let perf = PerformanceStore::new();
    let result = match cli.command {
        Commands::On {
            input,
            temp0,
            temp1,
            simulate,
            stepsize,
            iterations,
            label,
            show_all_temps,
            gradient,
            output_dir,
        } => {
            let config = RunConfig {
                input,
                labels: LabelSets {
                    low: temp0,
                    high: temp1,
                    simulate,
                },
                solver: SolverParams {
                    omega: stepsize,
                    iterations,
                    show_all: show_all_temps,
                },
                segments: label,
                gradient,
                output_dir,
            };
            pipeline::run(&config, &perf)
        }
    };

    // 失败时也写出已经记录的阶段
    if let Some(path) = &cli.cpuprofile {
        perf.write_json(path)
            .with_context(|| format!("无法写入性能数据 {}", path.display()))?;
        log::info!("[性能] 已写入 {}", path.display());
    }

    let outputs = result?;
    log::debug!(
        "[完成] {:?} 中 {} 个模拟体素，输出 {}",
        outputs.shape,
        outputs.simulated_voxels,
        outputs.temperature.display()
    );
    Ok(())
}
