//! 测量数据模型：单个测量点、属性对以及按 类型 → 代码 → 序号 分组的索引。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feature::FeatureKind;
use crate::geometry::Point3;

/// 语法不匹配的代码统一归入的占位代码。
pub const UNCLASSIFIED_CODE: &str = "sprl";

/// 测量点所属的连线序号。
///
/// `Continuous` 与 `Unset` 都表示"没有显式序号"，但含义不同：前者是线要素的整条链，
/// 后者是彼此独立的点。两者在索引中保持为不同的键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sequence {
    /// 线要素未带数字：所有同代码点连成一条线。
    Continuous,
    /// 点要素或未知要素未带数字。
    Unset,
    Explicit(u64),
}

impl Sequence {
    /// 标注文字中跟在代码后的序号部分，两个哨兵值都留空。
    pub fn label_suffix(self) -> String {
        match self {
            Sequence::Explicit(value) => value.to_string(),
            Sequence::Continuous | Sequence::Unset => String::new(),
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequence::Continuous => write!(f, "-1"),
            Sequence::Unset => write!(f, "None"),
            Sequence::Explicit(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAttribute {
    pub key: String,
    pub value: String,
}

impl SurveyAttribute {
    /// 显示标签：原始键按冒号拆分后的第二段，没有冒号时使用整个键。
    pub fn label(&self) -> &str {
        self.key.split(':').nth(1).unwrap_or(&self.key)
    }
}

/// 一行测量记录附带的属性，保持列顺序；重复键保留首次位置、采用最后的值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAttributes(Vec<SurveyAttribute>);

impl SurveyAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// 两两读取 `(key, value)`，末尾落单的键取空字符串作为值。
    pub fn from_columns<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut attributes = Self::new();
        let mut columns = columns.into_iter();
        while let Some(key) = columns.next() {
            let value = columns.next().unwrap_or("");
            attributes.insert(key, value);
        }
        attributes
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.0.iter_mut().find(|attr| attr.key == key) {
            existing.value = value;
        } else {
            self.0.push(SurveyAttribute { key, value });
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SurveyAttribute> {
        self.0.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 一条带代码的测量记录，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    pub point_number: String,
    /// Easting / Northing / Height，缺失或空白字段为 0.0。
    pub position: Point3,
    /// 高程字段的原始文本（去除首尾空白），标注时按原样输出以保留测量精度。
    pub height_text: String,
    pub raw_code: String,
    pub base_code: String,
    pub kind: FeatureKind,
    pub sequence: Sequence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SurveyAttributes>,
}

impl SurveyPoint {
    #[inline]
    pub fn easting(&self) -> f64 {
        self.position.x()
    }

    #[inline]
    pub fn northing(&self) -> f64 {
        self.position.y()
    }
}

/// 代码 → 序号 → 按输入顺序排列的点。
pub type CodeGroups = BTreeMap<String, BTreeMap<Sequence, Vec<SurveyPoint>>>;

/// 读取过程的统计信息。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub rows_read: usize,
    /// 无代码的行（表头、临时测站）。
    pub rows_without_code: usize,
    /// 坐标字段无法解析而被跳过的行。
    pub rows_rejected: usize,
    /// 代码不符合语法、归入未分类桶的行。
    pub classification_misses: usize,
}

/// 一次测量读取的完整结果。每个点恰好属于一个 (类型, 代码, 序号) 桶。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyIndex {
    lines: CodeGroups,
    points: CodeGroups,
    unknown: CodeGroups,
    needed_codes: Vec<String>,
    stats: IngestStats,
}

impl SurveyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按点的类型、基础代码与序号追加到对应桶末尾，并登记所需代码。
    pub fn insert(&mut self, point: SurveyPoint) {
        if !self.needed_codes.iter().any(|code| code == &point.base_code) {
            self.needed_codes.push(point.base_code.clone());
        }
        let groups = match point.kind {
            FeatureKind::Line => &mut self.lines,
            FeatureKind::Point => &mut self.points,
            FeatureKind::Unknown => &mut self.unknown,
        };
        groups
            .entry(point.base_code.clone())
            .or_default()
            .entry(point.sequence)
            .or_default()
            .push(point);
    }

    pub fn groups(&self, kind: FeatureKind) -> &CodeGroups {
        match kind {
            FeatureKind::Line => &self.lines,
            FeatureKind::Point => &self.points,
            FeatureKind::Unknown => &self.unknown,
        }
    }

    #[inline]
    pub fn lines(&self) -> &CodeGroups {
        &self.lines
    }

    #[inline]
    pub fn points(&self) -> &CodeGroups {
        &self.points
    }

    #[inline]
    pub fn unknown(&self) -> &CodeGroups {
        &self.unknown
    }

    pub fn sequence(&self, kind: FeatureKind, code: &str, sequence: Sequence) -> Option<&[SurveyPoint]> {
        self.groups(kind)
            .get(code)
            .and_then(|sequences| sequences.get(&sequence))
            .map(Vec::as_slice)
    }

    /// 出现过的基础代码，按首次出现顺序、无重复。
    #[inline]
    pub fn needed_codes(&self) -> &[String] {
        &self.needed_codes
    }

    #[inline]
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    #[inline]
    pub fn stats_mut(&mut self) -> &mut IngestStats {
        &mut self.stats
    }

    pub fn point_count(&self, kind: FeatureKind) -> usize {
        self.groups(kind)
            .values()
            .flat_map(|sequences| sequences.values())
            .map(Vec::len)
            .sum()
    }

    pub fn len(&self) -> usize {
        [FeatureKind::Line, FeatureKind::Point, FeatureKind::Unknown]
            .into_iter()
            .map(|kind| self.point_count(kind))
            .sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 遍历所有点，附带其所在桶的类型。
    pub fn iter(&self) -> impl Iterator<Item = &SurveyPoint> + '_ {
        [&self.lines, &self.points, &self.unknown]
            .into_iter()
            .flat_map(|groups| groups.values())
            .flat_map(|sequences| sequences.values())
            .flatten()
    }
}
