use std::path::PathBuf;

use svcad_engine::EngineError;
use svcad_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("无法加载要素库: {0}")]
    Library(#[source] IoError),
    #[error("测量文件不可用: {0}")]
    SurveyUnavailable(#[source] IoError),
    #[error("读取测量数据失败: {0}")]
    Survey(#[source] IoError),
    #[error("生成图纸失败: {0}")]
    Engine(#[from] EngineError),
    #[error("保存图纸 {path:?} 失败: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: IoError,
    },
}

impl FrontendError {
    /// 测量文件缺失属于可恢复的中止，返回 2；其余错误返回 1。
    pub fn exit_code(&self) -> i32 {
        match self {
            FrontendError::SurveyUnavailable(_) => 2,
            _ => 1,
        }
    }
}
