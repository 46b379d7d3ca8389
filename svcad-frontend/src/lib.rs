pub mod cli;
pub mod errors;
pub mod loader;
pub mod resource_locator;

use errors::FrontendError;
use loader::{InputOverrides, RunInputs};
use svcad_config::AppConfig;
use tracing::info;

/// 解析输入路径后执行一次批量转换并打印统计。
pub fn run_batch(config: &AppConfig, overrides: InputOverrides) -> Result<cli::RunReport, FrontendError> {
    let inputs = RunInputs::resolve(config, overrides);
    info!(
        library = %inputs.library.display(),
        survey = %inputs.survey.display(),
        output = %inputs.output.display(),
        "开始转换测量数据"
    );
    let report = cli::run_pipeline(&inputs, config)?;
    cli::print_report(&inputs, &report);
    Ok(report)
}
