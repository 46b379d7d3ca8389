use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feature::NEUTRAL_COLOR;
use crate::geometry::{Bounds2D, Point2, Point3, Vector2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// CAD 颜色索引。
    pub color: u8,
    pub linetype: String,
}

impl Layer {
    pub const DEFAULT_LINETYPE: &'static str = "Continuous";

    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: NEUTRAL_COLOR,
            linetype: Self::DEFAULT_LINETYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Entity {
    Line(Line),
    Circle(Circle),
    Point(PointMarker),
    Polyline(Polyline3D),
    Text(Text),
    MText(MText),
    BlockReference(BlockReference),
    Hatch(Hatch),
    MLeader(MLeader),
}

impl Entity {
    #[inline]
    pub fn layer_name(&self) -> &str {
        match self {
            Entity::Line(line) => &line.layer,
            Entity::Circle(circle) => &circle.layer,
            Entity::Point(point) => &point.layer,
            Entity::Polyline(polyline) => &polyline.layer,
            Entity::Text(text) => &text.layer,
            Entity::MText(mtext) => &mtext.layer,
            Entity::BlockReference(reference) => &reference.layer,
            Entity::Hatch(hatch) => &hatch.layer,
            Entity::MLeader(mleader) => &mleader.layer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
    pub layer: String,
}

/// 点标记（POINT），显示样式由文档头的点模式决定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointMarker {
    pub position: Point3,
    pub layer: String,
}

/// 三维多段线，顶点顺序即连线顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline3D {
    pub vertices: Vec<Point3>,
    pub is_closed: bool,
    pub layer: String,
}

/// 单行文字的水平/垂直对齐方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    BaselineLeft,
    BottomLeft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub insert: Point2,
    pub content: String,
    pub height: f64,
    pub rotation: f64,
    #[serde(default)]
    pub align: TextAlign,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MText {
    pub insert: Point2,
    pub content: String,
    pub height: f64,
    /// 附着点（1-9），7 表示左下。
    pub attachment_point: i16,
    pub style: Option<String>,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockReference {
    pub name: String,
    pub insert: Point3,
    pub scale: Vector2,
    pub rotation: f64,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HatchLoop {
    pub edges: Vec<HatchEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HatchEdge {
    Line {
        start: Point2,
        end: Point2,
    },
    /// 角度以度为单位，逆时针。
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hatch {
    pub pattern_name: String,
    pub is_solid: bool,
    pub loops: Vec<HatchLoop>,
    pub color: Option<u8>,
    pub layer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderLine {
    pub vertices: Vec<Point2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLeader {
    pub layer: String,
    pub style_name: Option<String>,
    pub leader_lines: Vec<LeaderLine>,
    /// 文字内容与其插入点。
    pub text: String,
    pub text_location: Point2,
    pub arrow_size: f64,
    pub dogleg_length: f64,
    pub landing_gap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    pub base_point: Point2,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub name: String,
    pub font: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MLeaderStyle {
    pub name: String,
    pub text_style: Option<String>,
    pub scale: f64,
    pub char_height: f64,
    pub landing_gap: f64,
}

/// 模型空间视图：中心点与可见高度。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelView {
    pub center: Point2,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingHeader {
    /// 点显示样式（PDMODE）。
    pub point_display_mode: i16,
    /// 点显示尺寸（PDSIZE），正数表示绝对尺寸。
    pub point_size: f64,
    pub limits: Option<Bounds2D>,
    pub view: Option<ModelView>,
}

impl Default for DrawingHeader {
    fn default() -> Self {
        Self {
            point_display_mode: 0,
            point_size: 0.0,
            limits: None,
            view: None,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Document {
    header: DrawingHeader,
    layers: BTreeMap<String, Layer>,
    entities: Vec<(EntityId, Entity)>,
    next_entity_id: u64,
    blocks: BTreeMap<String, BlockDefinition>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    text_styles: BTreeMap<String, TextStyle>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    mleader_styles: BTreeMap<String, MLeaderStyle>,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self::default();
        doc.ensure_layer("0");
        doc
    }

    pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
        let key = name.as_ref();
        self.layers
            .entry(key.to_string())
            .or_insert_with(|| Layer::new(key));
    }

    /// 创建图层或更新已有图层的颜色与线型。
    pub fn add_layer(&mut self, name: impl AsRef<str>, color: u8, linetype: impl Into<String>) {
        let key = name.as_ref();
        let layer = self
            .layers
            .entry(key.to_string())
            .or_insert_with(|| Layer::new(key));
        layer.color = color;
        layer.linetype = linetype.into();
    }

    #[inline]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    #[inline]
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    #[inline]
    pub fn header(&self) -> &DrawingHeader {
        &self.header
    }

    #[inline]
    pub fn header_mut(&mut self) -> &mut DrawingHeader {
        &mut self.header
    }

    pub fn add_text_style(&mut self, style: TextStyle) {
        self.text_styles.entry(style.name.clone()).or_insert(style);
    }

    #[inline]
    pub fn text_style(&self, name: &str) -> Option<&TextStyle> {
        self.text_styles.get(name)
    }

    pub fn add_mleader_style(&mut self, style: MLeaderStyle) {
        self.mleader_styles.insert(style.name.clone(), style);
    }

    #[inline]
    pub fn mleader_style(&self, name: &str) -> Option<&MLeaderStyle> {
        self.mleader_styles.get(name)
    }

    pub fn add_point(&mut self, position: Point3, layer: impl Into<String>) -> EntityId {
        self.push(Entity::Point(PointMarker {
            position,
            layer: layer.into(),
        }))
    }

    pub fn add_polyline3d<I>(&mut self, vertices: I, is_closed: bool, layer: impl Into<String>) -> EntityId
    where
        I: IntoIterator<Item = Point3>,
    {
        self.push(Entity::Polyline(Polyline3D {
            vertices: vertices.into_iter().collect(),
            is_closed,
            layer: layer.into(),
        }))
    }

    pub fn add_block_reference(
        &mut self,
        name: impl Into<String>,
        insert: Point3,
        layer: impl Into<String>,
    ) -> EntityId {
        self.push(Entity::BlockReference(BlockReference {
            name: name.into(),
            insert,
            scale: Vector2::new(1.0, 1.0),
            rotation: 0.0,
            layer: layer.into(),
        }))
    }

    pub fn add_mleader(&mut self, mleader: MLeader) -> EntityId {
        self.push(Entity::MLeader(mleader))
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.push(entity)
    }

    #[inline]
    pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
        self.entities.iter()
    }

    /// 指定图层上的实体。
    pub fn entities_on<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .iter()
            .map(|(_, entity)| entity)
            .filter(move |entity| entity.layer_name() == layer)
    }

    /// 注册块定义，已存在同名块时保留原定义并返回 `false`。
    pub fn add_block_definition(&mut self, definition: BlockDefinition) -> bool {
        if self.blocks.contains_key(&definition.name) {
            return false;
        }
        for entity in &definition.entities {
            self.ensure_layer(entity.layer_name());
        }
        self.blocks.insert(definition.name.clone(), definition);
        true
    }

    #[inline]
    pub fn block(&self, name: &str) -> Option<&BlockDefinition> {
        self.blocks.get(name)
    }

    #[inline]
    pub fn blocks(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.values()
    }

    fn push(&mut self, entity: Entity) -> EntityId {
        self.ensure_layer(entity.layer_name());
        let id = self.next_id();
        self.entities.push((id, entity));
        id
    }

    #[inline]
    fn next_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        EntityId(id)
    }
}
