//! 根据测量中实际出现的代码推导所需图层，并解析每个图层的显示颜色。

use std::collections::{BTreeMap, BTreeSet};

use svcad_core::document::Layer;
use svcad_core::feature::{FeatureLibrary, NEUTRAL_COLOR};
use tracing::{debug, warn};

/// 默认图层。
pub const DEFAULT_LAYER: &str = "0";
/// 始终存在的基础图层。
pub const BASE_LAYER: &str = "Points";
/// 未映射代码的回退图层。
pub const SPARE_LAYER: &str = "Spare";
pub const ATTRIBUTE_PREFIX: &str = "attrib_";
pub const MARKER_PREFIX: &str = "points_";

pub const CODE_LABEL_LAYER: &str = "Point Code";
pub const HEIGHT_LABEL_LAYER: &str = "Point Height";
pub const NUMBER_LABEL_LAYER: &str = "Point Number";

/// 三个标注图层及其固定颜色。
pub const LABEL_LAYERS: [(&str, u8); 3] = [
    (CODE_LABEL_LAYER, 1),
    (HEIGHT_LABEL_LAYER, 5),
    (NUMBER_LABEL_LAYER, 3),
];

#[inline]
pub fn attribute_layer(layer: &str) -> String {
    format!("{ATTRIBUTE_PREFIX}{layer}")
}

#[inline]
pub fn marker_layer(layer: &str) -> String {
    format!("{MARKER_PREFIX}{layer}")
}

/// 待创建的图层及其颜色、线型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    pub name: String,
    pub color: u8,
    pub linetype: String,
}

impl ResolvedLayer {
    fn new(name: impl Into<String>, color: u8) -> Self {
        Self {
            name: name.into(),
            color,
            linetype: Layer::DEFAULT_LINETYPE.to_string(),
        }
    }
}

/// 图层推导结果：所需图层集合以及未在要素库中映射的代码。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerResolution {
    layers: BTreeSet<String>,
    unmapped_codes: Vec<String>,
}

impl LayerResolution {
    #[inline]
    pub fn layers(&self) -> &BTreeSet<String> {
        &self.layers
    }

    #[inline]
    pub fn contains(&self, layer: &str) -> bool {
        self.layers.contains(layer)
    }

    /// 回退到 Spare 的代码，按首次出现顺序。
    #[inline]
    pub fn unmapped_codes(&self) -> &[String] {
        &self.unmapped_codes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn insert_family(&mut self, layer: &str) {
        self.layers.insert(layer.to_string());
        self.layers.insert(attribute_layer(layer));
        self.layers.insert(marker_layer(layer));
    }
}

pub struct LayerResolver;

impl LayerResolver {
    /// 为每个所需代码加入其映射图层（或 Spare）以及两个伴随图层。
    pub fn resolve<S>(needed_codes: &[S], code_layers: &BTreeMap<String, String>) -> LayerResolution
    where
        S: AsRef<str>,
    {
        let mut resolution = LayerResolution::default();
        resolution.layers.insert(BASE_LAYER.to_string());

        for code in needed_codes {
            let code = code.as_ref();
            match mapped_layer(code, code_layers) {
                Some(layer) => resolution.insert_family(layer),
                None => {
                    if !resolution.unmapped_codes.iter().any(|c| c == code) {
                        warn!(code, fallback = SPARE_LAYER, "代码未映射到图层，使用备用图层");
                        resolution.unmapped_codes.push(code.to_string());
                    }
                    resolution.insert_family(SPARE_LAYER);
                }
            }
        }

        debug!(
            layers = resolution.len(),
            unmapped = resolution.unmapped_codes.len(),
            "图层推导完成"
        );
        resolution
    }

    /// 代码绘制所用的图层：映射图层或 Spare。
    pub fn layer_for_code<'a>(code: &str, code_layers: &'a BTreeMap<String, String>) -> &'a str {
        mapped_layer(code, code_layers).unwrap_or(SPARE_LAYER)
    }

    /// 三个标注图层在前且颜色固定，其余按名称排序；`0` 与 `Points` 固定为中性色，未知颜色同样回退为中性色。
    pub fn styled_layers(resolution: &LayerResolution, library: &FeatureLibrary) -> Vec<ResolvedLayer> {
        let mut styled: Vec<ResolvedLayer> = LABEL_LAYERS
            .iter()
            .map(|(name, color)| ResolvedLayer::new(*name, *color))
            .collect();

        let is_label_layer = |name: &str| LABEL_LAYERS.iter().any(|(label, _)| *label == name);
        for name in resolution.layers().iter().filter(|name| !is_label_layer(name.as_str())) {
            let color = if name == DEFAULT_LAYER || name == BASE_LAYER {
                NEUTRAL_COLOR
            } else {
                library
                    .layer(name)
                    .map(|spec| spec.resolved_color())
                    .unwrap_or(NEUTRAL_COLOR)
            };
            styled.push(ResolvedLayer::new(name.as_str(), color));
        }
        styled
    }
}

/// 空图层名视为未映射。
fn mapped_layer<'a>(code: &str, code_layers: &'a BTreeMap<String, String>) -> Option<&'a str> {
    code_layers
        .get(code)
        .map(String::as_str)
        .filter(|layer| !layer.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_layers() -> BTreeMap<String, String> {
        [("bm", "BenchMarks"), ("kb", "Kerb"), ("blank", "")]
            .into_iter()
            .map(|(code, layer)| (code.to_string(), layer.to_string()))
            .collect()
    }

    fn library() -> FeatureLibrary {
        let mut library = FeatureLibrary::new();
        library.merge_layer("BenchMarks", [("Color".to_string(), "FFFF0000".to_string())]);
        library.merge_layer("Kerb", [("Color".to_string(), "FF123456".to_string())]);
        library.merge_layer("Points", [("Color".to_string(), "FFFF0000".to_string())]);
        library
    }

    #[test]
    fn mapped_code_adds_layer_family() {
        let resolution = LayerResolver::resolve(&["bm"], &code_layers());
        let expected: BTreeSet<String> = ["Points", "BenchMarks", "attrib_BenchMarks", "points_BenchMarks"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(resolution.layers(), &expected);
        assert!(resolution.unmapped_codes().is_empty());
    }

    #[test]
    fn unmapped_codes_fall_back_to_spare_once() {
        let resolution = LayerResolver::resolve(&["xyz", "sprl", "xyz", "blank"], &code_layers());
        assert!(resolution.contains("Spare"));
        assert!(resolution.contains("attrib_Spare"));
        assert!(resolution.contains("points_Spare"));
        assert_eq!(resolution.len(), 4);
        assert_eq!(resolution.unmapped_codes(), ["xyz", "sprl", "blank"]);
    }

    #[test]
    fn each_code_gets_exactly_one_family() {
        let layers = code_layers();
        let resolution = LayerResolver::resolve(&["bm", "kb", "nope"], &layers);
        for code in ["bm", "kb", "nope"] {
            let layer = LayerResolver::layer_for_code(code, &layers);
            assert!(resolution.contains(layer));
            assert!(resolution.contains(&attribute_layer(layer)));
            assert!(resolution.contains(&marker_layer(layer)));
        }
        assert_eq!(resolution.unmapped_codes(), ["nope"]);
        assert_eq!(resolution.len(), 10);
    }

    #[test]
    fn empty_survey_still_has_base_layer() {
        let resolution = LayerResolver::resolve::<&str>(&[], &code_layers());
        assert_eq!(resolution.len(), 1);
        assert!(resolution.contains(BASE_LAYER));
    }

    #[test]
    fn styled_layers_resolve_colours() {
        let resolution = LayerResolver::resolve(&["bm", "kb"], &code_layers());
        let styled = LayerResolver::styled_layers(&resolution, &library());

        assert_eq!(styled[0].name, CODE_LABEL_LAYER);
        assert_eq!(styled[1].color, 5);
        assert_eq!(styled[2].color, 3);

        let color_of = |name: &str| styled.iter().find(|l| l.name == name).map(|l| l.color);
        assert_eq!(color_of("BenchMarks"), Some(1));
        assert_eq!(color_of("Kerb"), Some(NEUTRAL_COLOR));
        assert_eq!(color_of("Points"), Some(NEUTRAL_COLOR));
        assert_eq!(color_of("attrib_Kerb"), Some(NEUTRAL_COLOR));
        assert!(styled.iter().all(|l| l.linetype == "Continuous"));
    }

    #[test]
    fn library_layer_named_like_label_layer_keeps_fixed_colour() {
        let code_layers: BTreeMap<String, String> = [("ph", HEIGHT_LABEL_LAYER)]
            .into_iter()
            .map(|(code, layer)| (code.to_string(), layer.to_string()))
            .collect();
        let mut library = FeatureLibrary::new();
        library.merge_layer(HEIGHT_LABEL_LAYER, [("Color".to_string(), "FFFF0000".to_string())]);

        let resolution = LayerResolver::resolve(&["ph"], &code_layers);
        assert!(resolution.contains(HEIGHT_LABEL_LAYER));

        let styled = LayerResolver::styled_layers(&resolution, &library);
        let heights: Vec<u8> = styled
            .iter()
            .filter(|l| l.name == HEIGHT_LABEL_LAYER)
            .map(|l| l.color)
            .collect();
        assert_eq!(heights, [5]);
        assert!(styled.iter().any(|l| l.name == marker_layer(HEIGHT_LABEL_LAYER)));
    }
}
