//! # Tactile Servo CLI
//!
//! Command-line interface for tactile pose servoing.
//!
//! ```bash
//! # 导出任务预设（标签配置 + 控制参数）
//! tactile-servo-cli preset --task edge_2d --out ./model
//!
//! # 校验训练产物
//! tactile-servo-cli validate --labels model/model_label_params.json --control model/control_params.json
//!
//! # 仿真一个 episode 并录制
//! tactile-servo-cli simulate --task edge_2d --stimulus edge --noise 0.05 --record episode.bin
//!
//! # 查看录制统计
//! tactile-servo-cli stats episode.bin
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{PresetCommand, SimulateCommand, StatsCommand, ValidateCommand};

/// Tactile Servo CLI - 触觉位姿伺服命令行工具
#[derive(Parser, Debug)]
#[command(name = "tactile-servo-cli")]
#[command(about = "Command-line interface for tactile pose servoing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 加载并校验标签配置与控制参数
    Validate {
        #[command(flatten)]
        args: ValidateCommand,
    },

    /// 导出任务预设
    Preset {
        #[command(flatten)]
        args: PresetCommand,
    },

    /// 用仿真协作者运行一个 episode
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },

    /// 打印录制文件的统计
    Stats {
        #[command(flatten)]
        args: StatsCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tactile_servo::init_logging("tactile_servo_cli=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { args } => args.execute(),
        Commands::Preset { args } => args.execute(),
        Commands::Simulate { args } => args.execute(),
        Commands::Stats { args } => args.execute(),
    }
}
