use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};
use svcad_core::feature::{FeatureCode, FeatureKind, FeatureLibrary, LayerSpec};
use tracing::{debug, info, warn};

use crate::{IoError, LibraryLoader};

/// 要素库文件使用的固定命名空间。
pub const FXL_NAMESPACE: &str = "http://trimble.com/schema/fxl";

const LAYER_SECTION: &str = "LayerDefinitions";
const LAYER_ENTRY: &str = "LayerDefinition";
const FEATURE_SECTION: &str = "FeatureDefinitions";
const POINT_FEATURE: &str = "PointFeatureDefinition";
const LINE_FEATURE: &str = "LineFeatureDefinition";

pub struct FxlFacade;

impl FxlFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FxlFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryLoader for FxlFacade {
    fn load(&self, path: &Path) -> Result<FeatureLibrary, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::LibraryRead {
            path: path.to_path_buf(),
            source,
        })?;
        let library = parse_library(&data).map_err(|source| IoError::MalformedLibrary {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            layers = library.layers().count(),
            point_codes = library.point_codes().len(),
            line_codes = library.line_codes().len(),
            "要素库加载完成"
        );
        Ok(library)
    }
}

/// 一次性解析图层与代码表。
pub fn parse_library(source: &str) -> Result<FeatureLibrary, roxmltree::Error> {
    let document = Document::parse(strip_bom(source))?;
    let root = document.root_element();

    let mut library = FeatureLibrary::new();
    for (name, properties) in collect_layers(root) {
        library.merge_layer(name, properties);
    }
    for code in collect_codes(root) {
        library.insert_code(code);
    }
    Ok(library)
}

/// 图层名 → 图层定义，同名图层的属性合并。
pub fn parse_layers(source: &str) -> Result<BTreeMap<String, LayerSpec>, roxmltree::Error> {
    let document = Document::parse(strip_bom(source))?;
    let mut layers: BTreeMap<String, LayerSpec> = BTreeMap::new();
    for (name, properties) in collect_layers(document.root_element()) {
        layers
            .entry(name.clone())
            .or_insert_with(|| LayerSpec::new(name))
            .properties
            .extend(properties);
    }
    Ok(layers)
}

/// 返回 (点代码表, 线代码表, 代码 → 图层)。
pub fn parse_codes(
    source: &str,
) -> Result<
    (
        BTreeMap<String, FeatureCode>,
        BTreeMap<String, FeatureCode>,
        BTreeMap<String, String>,
    ),
    roxmltree::Error,
> {
    let library = parse_library(source)?;
    Ok((
        library.point_codes().clone(),
        library.line_codes().clone(),
        library.code_layers().clone(),
    ))
}

fn strip_bom(source: &str) -> &str {
    source.strip_prefix('\u{feff}').unwrap_or(source)
}

fn is_fxl(node: &Node, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace() == Some(FXL_NAMESPACE)
}

fn sections<'a, 'input>(
    root: Node<'a, 'input>,
    local_name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    root.children().filter(move |child| is_fxl(child, local_name))
}

fn collect_layers(root: Node) -> Vec<(String, BTreeMap<String, String>)> {
    let mut layers = Vec::new();
    for section in sections(root, LAYER_SECTION) {
        for entry in section.children().filter(|n| is_fxl(n, LAYER_ENTRY)) {
            let mut name: Option<String> = None;
            let mut properties: BTreeMap<String, String> = BTreeMap::new();
            for property in entry.children().filter(Node::is_element) {
                let key = property.tag_name().name();
                let value = property.text().unwrap_or_default().to_string();
                if key == "Name" {
                    name = Some(value);
                } else {
                    properties.entry(key.to_string()).or_insert(value);
                }
            }
            match name.filter(|name| !name.is_empty()) {
                Some(name) => layers.push((name, properties)),
                None => warn!(
                    position = entry.range().start,
                    "图层定义缺少 Name，已跳过"
                ),
            }
        }
    }
    layers
}

fn collect_codes(root: Node) -> Vec<FeatureCode> {
    let mut codes = Vec::new();
    for section in sections(root, FEATURE_SECTION) {
        for definition in section.children().filter(Node::is_element) {
            let kind = if is_fxl(&definition, POINT_FEATURE) {
                FeatureKind::Point
            } else if is_fxl(&definition, LINE_FEATURE) {
                FeatureKind::Line
            } else {
                debug!(tag = definition.tag_name().name(), "忽略非点/线要素定义");
                continue;
            };

            let raw_attributes: BTreeMap<String, String> = definition
                .attributes()
                .map(|attr| (attr.name().to_string(), attr.value().to_string()))
                .collect();
            let Some(base_code) = raw_attributes.get("Code").filter(|c| !c.is_empty()).cloned()
            else {
                warn!(
                    kind = kind.as_str(),
                    position = definition.range().start,
                    "要素定义缺少 Code，已跳过"
                );
                continue;
            };
            let layer = raw_attributes.get("Layer").cloned().unwrap_or_default();
            codes.push(FeatureCode {
                base_code,
                kind,
                layer,
                raw_attributes,
            });
        }
    }
    codes
}
