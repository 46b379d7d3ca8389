//! 要素库（FXL）在内存中的表示：图层定义、点/线要素代码以及代码到图层的映射。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 中性颜色（白/黑），用于未知颜色与固定图层。
pub const NEUTRAL_COLOR: u8 = 7;

/// 要素库颜色（ARGB 十六进制）到 CAD 颜色索引的固定映射。
const ARGB_TO_ACI: [(&str, u8); 20] = [
    ("FF804000", 36),
    ("FFD3D3D3", 254),
    ("FFFFFF00", 2),
    ("FF008000", 96),
    ("FF0080FF", 150),
    ("FFFF7F00", 30),
    ("FFFF003F", 240),
    ("FF000040", 178),
    ("FFFFA500", 40),
    ("FFADADAD", 253),
    ("FFFF00FF", 6),
    ("FF3F00FF", 180),
    ("FF800080", 216),
    ("FF0000A0", 174),
    ("FF0000FF", 5),
    ("FF003FFF", 160),
    ("FF009926", 104),
    ("FF00FF00", 3),
    ("FFFF0000", 1),
    ("FFFFFFFF", 7),
];

/// 查表得到颜色索引，表中不存在时返回 `None`。
pub fn aci_from_argb(argb: &str) -> Option<u8> {
    let key = argb.trim();
    ARGB_TO_ACI
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, index)| *index)
}

/// 测量点的类型分桶。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    Line,
    Point,
    Unknown,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Line => "Line",
            FeatureKind::Point => "Point",
            FeatureKind::Unknown => "Unknown",
        }
    }
}

/// 要素库中声明的一个代码。加载后只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCode {
    pub base_code: String,
    pub kind: FeatureKind,
    pub layer: String,
    /// 定义元素上的全部属性，原样保留（包括 `Code` 与 `Layer`）。
    pub raw_attributes: BTreeMap<String, String>,
}

/// 图层定义：名称加任意显示属性（`Color`、`LineWeight` 等）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl LayerSpec {
    pub const COLOR_PROPERTY: &'static str = "Color";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// ARGB 颜色键，例如 `FFFF0000`。
    pub fn color_source(&self) -> Option<&str> {
        self.properties
            .get(Self::COLOR_PROPERTY)
            .map(String::as_str)
    }

    /// 按需解析颜色索引；缺失或不在映射表中时回退为中性色。
    pub fn resolved_color(&self) -> u8 {
        self.color_source()
            .and_then(aci_from_argb)
            .unwrap_or(NEUTRAL_COLOR)
    }
}

/// 分类器查询代码表所需的最小接口。
pub trait CodeLookup {
    fn is_line_code(&self, code: &str) -> bool;
    fn is_point_code(&self, code: &str) -> bool;
}

/// 解析后的完整要素库。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureLibrary {
    layers: BTreeMap<String, LayerSpec>,
    point_codes: BTreeMap<String, FeatureCode>,
    line_codes: BTreeMap<String, FeatureCode>,
    code_layers: BTreeMap<String, String>,
}

impl FeatureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并图层属性：同名图层重复声明时后出现的属性覆盖先前的值。
    pub fn merge_layer(
        &mut self,
        name: impl Into<String>,
        properties: impl IntoIterator<Item = (String, String)>,
    ) {
        let name = name.into();
        let layer = self
            .layers
            .entry(name.clone())
            .or_insert_with(|| LayerSpec::new(name));
        layer.properties.extend(properties);
    }

    /// 注册代码，重复声明保留首次出现的定义。返回是否为新代码。
    ///
    /// `Unknown` 类型的代码不会进入任何代码表。
    pub fn insert_code(&mut self, code: FeatureCode) -> bool {
        let table = match code.kind {
            FeatureKind::Point => &mut self.point_codes,
            FeatureKind::Line => &mut self.line_codes,
            FeatureKind::Unknown => return false,
        };
        if table.contains_key(&code.base_code) {
            return false;
        }
        self.code_layers
            .entry(code.base_code.clone())
            .or_insert_with(|| code.layer.clone());
        table.insert(code.base_code.clone(), code);
        true
    }

    #[inline]
    pub fn layer(&self, name: &str) -> Option<&LayerSpec> {
        self.layers.get(name)
    }

    #[inline]
    pub fn layers(&self) -> impl Iterator<Item = &LayerSpec> {
        self.layers.values()
    }

    #[inline]
    pub fn point_code(&self, code: &str) -> Option<&FeatureCode> {
        self.point_codes.get(code)
    }

    #[inline]
    pub fn line_code(&self, code: &str) -> Option<&FeatureCode> {
        self.line_codes.get(code)
    }

    #[inline]
    pub fn point_codes(&self) -> &BTreeMap<String, FeatureCode> {
        &self.point_codes
    }

    #[inline]
    pub fn line_codes(&self) -> &BTreeMap<String, FeatureCode> {
        &self.line_codes
    }

    /// 代码 → 目标图层，覆盖点、线两张表。
    #[inline]
    pub fn code_layers(&self) -> &BTreeMap<String, String> {
        &self.code_layers
    }

    #[inline]
    pub fn layer_for_code(&self, code: &str) -> Option<&str> {
        self.code_layers.get(code).map(String::as_str)
    }
}

impl CodeLookup for FeatureLibrary {
    fn is_line_code(&self, code: &str) -> bool {
        self.line_codes.contains_key(code)
    }

    fn is_point_code(&self, code: &str) -> bool {
        self.point_codes.contains_key(code)
    }
}
