use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use svcad_core::classify::CodePrecedence;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "SVCAD_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub survey: SurveyConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `SVCAD_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 输入输出文件。相对的要素库路径会在 `library_roots` 中查找。
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_library_file")]
    pub library_file: PathBuf,
    #[serde(default = "InputConfig::default_survey_file")]
    pub survey_file: PathBuf,
    #[serde(default = "InputConfig::default_output_file")]
    pub output_file: PathBuf,
    #[serde(default)]
    pub library_roots: Vec<PathBuf>,
}

impl InputConfig {
    fn default_library_file() -> PathBuf {
        PathBuf::from("Global_v3.fxl")
    }

    fn default_survey_file() -> PathBuf {
        PathBuf::from("tr3.csv")
    }

    fn default_output_file() -> PathBuf {
        PathBuf::from("output.json")
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            library_file: Self::default_library_file(),
            survey_file: Self::default_survey_file(),
            output_file: Self::default_output_file(),
            library_roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyConfig {
    /// 代码同时出现在点表与线表时的归类。
    #[serde(default)]
    pub code_precedence: CodePrecedence,
}

/// 绘图参数覆盖项，未设置的字段沿用内置默认值。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrawingConfig {
    pub text_height: Option<f64>,
    pub line_factor: Option<f64>,
    pub offset_right: Option<f64>,
    pub offset_up: Option<f64>,
    pub block_text_height: Option<f64>,
    pub symbol_radius: Option<f64>,
    pub view_margin: Option<f64>,
    pub view_aspect: Option<f64>,
    pub point_display_mode: Option<i16>,
    pub point_size: Option<f64>,
    pub text_style: Option<String>,
    pub text_font: Option<String>,
    #[serde(default)]
    pub leader: LeaderConfig,
    /// 额外的点代码 → 符号文字，覆盖同名的内置项。
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderConfig {
    pub style_name: Option<String>,
    pub landing_gap: Option<f64>,
    pub dogleg_length: Option<f64>,
    pub arrow_size: Option<f64>,
    pub scale: Option<f64>,
    pub text_height: Option<f64>,
    pub gap: Option<f64>,
    pub angle: Option<f64>,
    pub length: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
