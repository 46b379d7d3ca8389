use std::env;
use std::path::{Path, PathBuf};

use svcad_config::AppConfig;
use tracing::{debug, trace};

const LIBRARY_ROOTS_ENV: &str = "SVCAD_LIBRARY_ROOTS";

/// 在工作目录、配置的 `library_roots` 以及环境变量 `SVCAD_LIBRARY_ROOTS` 中查找要素库文件。
pub struct LibraryLocator {
    search_roots: Vec<PathBuf>,
}

impl LibraryLocator {
    pub fn from_config(base_dir: Option<&Path>, config: &AppConfig) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();

        if let Some(dir) = base_dir {
            roots.push(dir.to_path_buf());
        }

        roots.extend(
            config
                .inputs
                .library_roots
                .iter()
                .cloned()
                .filter(|path| path.is_dir()),
        );

        if let Some(env_paths) = env::var_os(LIBRARY_ROOTS_ENV) {
            for path in env::split_paths(&env_paths) {
                if path.is_dir() {
                    roots.push(path);
                }
            }
        }

        // 去重，保持靠前优先级。
        let mut deduped: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !deduped.iter().any(|existing| existing == &root) {
                deduped.push(root);
            }
        }

        LibraryLocator {
            search_roots: deduped,
        }
    }

    #[inline]
    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// 找不到时返回原路径，由加载器报告读取错误。
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        for root in &self.search_roots {
            let candidate = root.join(path);
            trace!(candidate = %candidate.display(), "library locator candidate");
            if candidate.is_file() {
                return candidate;
            }
        }
        debug!(path = %path.display(), "未在搜索目录中找到要素库");
        path.to_path_buf()
    }
}
