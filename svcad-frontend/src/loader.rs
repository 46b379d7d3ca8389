use std::env;
use std::path::{Path, PathBuf};

use svcad_config::AppConfig;
use svcad_core::classify::{CodeClassifier, CodePrecedence};
use svcad_core::feature::FeatureLibrary;
use svcad_core::survey::SurveyIndex;
use svcad_io::{FxlFacade, LibraryLoader, SurveyCsvReader, SurveyLoader};
use tracing::{error, info, warn};

use crate::errors::FrontendError;
use crate::resource_locator::LibraryLocator;

/// 命令行传入的覆盖项，优先于配置文件。
#[derive(Debug, Clone, Default)]
pub struct InputOverrides {
    pub library: Option<PathBuf>,
    pub survey: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub code_precedence: Option<CodePrecedence>,
}

/// 一次运行最终使用的文件与分类策略。
#[derive(Debug, Clone, PartialEq)]
pub struct RunInputs {
    pub library: PathBuf,
    pub survey: PathBuf,
    pub output: PathBuf,
    pub code_precedence: CodePrecedence,
}

impl RunInputs {
    pub fn resolve(config: &AppConfig, overrides: InputOverrides) -> Self {
        let library = overrides
            .library
            .unwrap_or_else(|| config.inputs.library_file.clone());
        let cwd = env::current_dir().ok();
        let locator = LibraryLocator::from_config(cwd.as_deref(), config);

        Self {
            library: locator.resolve(&library),
            survey: overrides
                .survey
                .unwrap_or_else(|| config.inputs.survey_file.clone()),
            output: overrides
                .output
                .unwrap_or_else(|| config.inputs.output_file.clone()),
            code_precedence: overrides
                .code_precedence
                .unwrap_or(config.survey.code_precedence),
        }
    }
}

/// 要素库无法读取或解析属于致命错误。
pub fn load_library(path: &Path) -> Result<FeatureLibrary, FrontendError> {
    FxlFacade::new().load(path).map_err(|err| {
        error!(path = %path.display(), error = %err, "要素库加载失败");
        FrontendError::Library(err)
    })
}

/// 测量文件缺失或无权限时返回 `SurveyUnavailable`，调用方应直接中止且不写出任何文件。
pub fn load_survey(
    path: &Path,
    library: &FeatureLibrary,
    precedence: CodePrecedence,
) -> Result<SurveyIndex, FrontendError> {
    let reader = SurveyCsvReader::new(library, CodeClassifier::new(precedence));
    match reader.load(path) {
        Ok(index) => {
            info!(path = %path.display(), points = index.len(), "测量数据加载完成");
            Ok(index)
        }
        Err(err) if err.is_survey_unavailable() => {
            warn!(path = %path.display(), error = %err, "测量文件不可用，中止本次运行");
            Err(FrontendError::SurveyUnavailable(err))
        }
        Err(err) => Err(FrontendError::Survey(err)),
    }
}
