mod fxl;
mod snapshot;
mod survey_csv;

use std::path::{Path, PathBuf};

use thiserror::Error;
use svcad_core::document::Document;
use svcad_core::feature::FeatureLibrary;
use svcad_core::survey::SurveyIndex;

pub use fxl::{FXL_NAMESPACE, FxlFacade, parse_codes, parse_layers, parse_library};
pub use snapshot::JsonSnapshotSaver;
pub use survey_csv::{FIXED_COLUMNS, SurveyCsvReader};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read feature library {path:?}: {source}")]
    LibraryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed feature library {path:?}: {source}")]
    MalformedLibrary {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("survey file {path:?} not found")]
    SurveyNotFound { path: PathBuf },
    #[error("permission denied to access survey file {path:?}")]
    SurveyPermissionDenied { path: PathBuf },
    #[error("failed to read survey file {path:?}: {source}")]
    SurveyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid survey csv at record {record}: {source}")]
    Csv {
        record: u64,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize drawing for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl IoError {
    /// 测量文件缺失或无权限：调用方应中止本次运行，但不属于致命错误。
    pub fn is_survey_unavailable(&self) -> bool {
        matches!(
            self,
            IoError::SurveyNotFound { .. }
                | IoError::SurveyPermissionDenied { .. }
                | IoError::SurveyRead { .. }
        )
    }
}

pub trait LibraryLoader {
    fn load(&self, path: &Path) -> Result<FeatureLibrary, IoError>;
}

pub trait SurveyLoader {
    fn load(&self, path: &Path) -> Result<SurveyIndex, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}
