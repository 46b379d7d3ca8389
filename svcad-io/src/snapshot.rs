use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use svcad_core::document::Document;
use tracing::info;

use crate::{DocumentSaver, IoError};

/// 将文档模型以 JSON 快照写出。先写入同目录临时文件，成功后再改名，避免留下残缺输出。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSnapshotSaver;

impl JsonSnapshotSaver {
    pub fn new() -> Self {
        Self
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        path.with_file_name(name)
    }

    fn write_to(&self, document: &Document, staging: &Path, target: &Path) -> Result<(), IoError> {
        let write_error = |source| IoError::WriteError {
            path: target.to_path_buf(),
            source,
        };
        let file = File::create(staging).map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document).map_err(|source| IoError::Serialize {
            path: target.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(write_error)?;
        Ok(())
    }
}

impl DocumentSaver for JsonSnapshotSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        let staging = Self::staging_path(path);
        if let Err(err) = self.write_to(document, &staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }
        fs::rename(&staging, path).map_err(|source| {
            let _ = fs::remove_file(&staging);
            IoError::WriteError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        info!(path = %path.display(), "图纸快照已保存");
        Ok(())
    }
}
