use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use svcad_config::{AppConfig, ConfigError};
use svcad_core::classify::CodePrecedence;
use svcad_frontend::loader::InputOverrides;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// 将测量 CSV 与要素库转换为分层图纸快照。
#[derive(Debug, Parser)]
#[command(name = "svcad", version, about)]
struct Args {
    /// 要素库文件（.fxl）
    #[arg(long)]
    library: Option<PathBuf>,
    /// 测量数据文件（.csv）
    #[arg(long)]
    survey: Option<PathBuf>,
    /// 输出的图纸快照
    #[arg(long)]
    output: Option<PathBuf>,
    /// 配置文件，默认按 SVCAD_CONFIG 与 ./config/default.toml 查找
    #[arg(long)]
    config: Option<PathBuf>,
    /// 日志过滤级别，覆盖配置中的 logging.level
    #[arg(long)]
    log_level: Option<String>,
    /// 代码同时出现在点表与线表时的归类
    #[arg(long, value_enum)]
    code_precedence: Option<PrecedenceArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PrecedenceArg {
    Point,
    Line,
}

impl From<PrecedenceArg> for CodePrecedence {
    fn from(value: PrecedenceArg) -> Self {
        match value {
            PrecedenceArg::Point => CodePrecedence::Point,
            PrecedenceArg::Line => CodePrecedence::Line,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 日志尚未初始化，配置错误只能直接写到 stderr
    let mut config = match load_configuration(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("配置加载失败: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config);
    info!("启动测量图纸转换");

    let overrides = InputOverrides {
        library: args.library,
        survey: args.survey,
        output: args.output,
        code_precedence: args.code_precedence.map(CodePrecedence::from),
    };

    match svcad_frontend::run_batch(&config, overrides) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "转换中止");
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// 显式 `--config`、`SVCAD_CONFIG` 或 `./config/default.toml` 中的任一文件存在但无法读取或解析时均视为致命错误；
/// 只有未找到任何配置文件时才使用内建默认值。
fn load_configuration(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match explicit {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
