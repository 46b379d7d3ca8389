use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use svcad_core::classify::{Classification, CodeClassifier};
use svcad_core::feature::{FeatureKind, FeatureLibrary};
use svcad_core::geometry::Point3;
use svcad_core::survey::{
    Sequence, SurveyAttributes, SurveyIndex, SurveyPoint, UNCLASSIFIED_CODE,
};
use tracing::{debug, info, warn};

use crate::{IoError, SurveyLoader};

/// 固定的前五列，之后的列为成对出现的属性。
pub const FIXED_COLUMNS: [&str; 5] = ["PointNumber", "Easting", "Northing", "Height", "Point_code"];

const EASTING: usize = 1;
const NORTHING: usize = 2;
const HEIGHT: usize = 3;
const POINT_CODE: usize = 4;

/// 读取测量 CSV，逐行分类并构建 [`SurveyIndex`]。
pub struct SurveyCsvReader<'a> {
    library: &'a FeatureLibrary,
    classifier: CodeClassifier,
}

impl<'a> SurveyCsvReader<'a> {
    pub fn new(library: &'a FeatureLibrary, classifier: CodeClassifier) -> Self {
        Self {
            library,
            classifier,
        }
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<SurveyIndex, IoError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);

        let mut index = SurveyIndex::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|source| IoError::Csv {
                record: row as u64 + 1,
                source,
            })?;
            index.stats_mut().rows_read += 1;
            self.ingest_record(row + 1, &record, &mut index);
        }

        let stats = index.stats();
        info!(
            rows = stats.rows_read,
            points = index.len(),
            codes = index.needed_codes().len(),
            rejected = stats.rows_rejected,
            misses = stats.classification_misses,
            "测量数据读取完成"
        );
        Ok(index)
    }

    fn ingest_record(&self, row: usize, record: &StringRecord, index: &mut SurveyIndex) {
        let code = field(record, POINT_CODE);
        let is_header = row == 1 && code.eq_ignore_ascii_case(FIXED_COLUMNS[POINT_CODE]);
        if code.is_empty() || is_header {
            // 表头与临时测站没有代码
            index.stats_mut().rows_without_code += 1;
            return;
        }

        let point_number = field(record, 0).to_string();
        let coordinates = [EASTING, NORTHING, HEIGHT].map(|column| parse_coordinate(field(record, column)));
        let [Ok(easting), Ok(northing), Ok(height)] = coordinates else {
            warn!(row, point_number = %point_number, "坐标无法解析为数值，跳过该行");
            index.stats_mut().rows_rejected += 1;
            return;
        };

        let (base_code, kind, sequence) = match self.classifier.classify(code, self.library) {
            Classification::Matched(classified) => {
                if classified.kind == FeatureKind::Unknown {
                    debug!(row, code, base = %classified.base_code, "代码未在要素库中定义");
                } else {
                    debug!(
                        row,
                        code,
                        base = %classified.base_code,
                        kind = classified.kind.as_str(),
                        sequence = %classified.sequence,
                        "代码分类"
                    );
                }
                (classified.base_code, classified.kind, classified.sequence)
            }
            Classification::Unmatched => {
                warn!(row, code, "代码不符合格式，归入未分类");
                index.stats_mut().classification_misses += 1;
                (
                    UNCLASSIFIED_CODE.to_string(),
                    FeatureKind::Unknown,
                    Sequence::Unset,
                )
            }
        };

        // 空白高程按 0 标注，其余保留原始文本
        let height_text = match field(record, HEIGHT) {
            "" => height.to_string(),
            raw => raw.to_string(),
        };
        let attributes = (record.len() > FIXED_COLUMNS.len())
            .then(|| SurveyAttributes::from_columns(record.iter().skip(FIXED_COLUMNS.len())));

        index.insert(SurveyPoint {
            point_number,
            position: Point3::new(easting, northing, height),
            height_text,
            raw_code: code.to_string(),
            base_code,
            kind,
            sequence,
            attributes,
        });
    }
}

/// 打开测量文件失败时的错误归类：缺失与无权限可恢复，其余按读取失败处理。
fn survey_open_error(path: &Path, source: io::Error) -> IoError {
    let path = path.to_path_buf();
    match source.kind() {
        io::ErrorKind::NotFound => IoError::SurveyNotFound { path },
        io::ErrorKind::PermissionDenied => IoError::SurveyPermissionDenied { path },
        _ => IoError::SurveyRead { path, source },
    }
}

impl SurveyLoader for SurveyCsvReader<'_> {
    fn load(&self, path: &Path) -> Result<SurveyIndex, IoError> {
        let file = File::open(path).map_err(|source| survey_open_error(path, source))?;
        self.read_from(file)
    }
}

fn field(record: &StringRecord, column: usize) -> &str {
    record.get(column).map(str::trim).unwrap_or("")
}

/// 空白或缺失的坐标取 0.0。
fn parse_coordinate(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    if raw.is_empty() {
        Ok(0.0)
    } else {
        raw.parse::<f64>()
    }
}
