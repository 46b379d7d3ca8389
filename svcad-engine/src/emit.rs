//! 几何输出：把分组后的测量数据转换为绘图调用。
//!
//! 具体的绘图后端通过 [`DrawingSink`] 接入，内存中的 [`Document`] 是默认实现。

use std::collections::BTreeMap;

use svcad_core::document::{
    BlockDefinition, Circle, Document, Entity, Hatch, HatchEdge, HatchLoop, LeaderLine, Line,
    MLeader, MLeaderStyle, MText, ModelView, Text, TextAlign, TextStyle,
};
use svcad_core::feature::{FeatureKind, NEUTRAL_COLOR};
use svcad_core::geometry::{Bounds2D, Point2, Point3, Vector2};
use svcad_core::survey::{Sequence, SurveyIndex, SurveyPoint};
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::layers::{
    CODE_LABEL_LAYER, DEFAULT_LAYER, HEIGHT_LABEL_LAYER, NUMBER_LABEL_LAYER, ResolvedLayer,
    attribute_layer, marker_layer,
};
use crate::pipeline::PipelineContext;

/// 多行文字左下角附着。
const ATTACH_BOTTOM_LEFT: i16 = 7;
/// 符号块文字相对半径的位置比例。
const SYMBOL_TEXT_RATIO: f64 = 0.9;
const SOLID_PATTERN: &str = "SOLID";

/// 特殊点代码与其符号文字的默认对应表。
pub const DEFAULT_SYMBOLS: [(&str, &str); 15] = [
    ("wmf_av", "A.V."),
    ("wmf_bb", "BB"),
    ("wmf_bm", "B.M."),
    ("wmf_conn", "Connection\nEasting: ###\nNorthing: ###"),
    ("wmf_dc", "D.C"),
    ("wmf_fh", "F.H."),
    ("wmf_fm", "FM"),
    ("wmf_sv", "S.V"),
    ("wmf_marker", "MarkerPlate"),
    ("wmf_sc", "S.C."),
    ("wmf_scv", "Sc.V"),
    ("wmf_scmh", "Sc.MH"),
    ("wmf_rd", "RD"),
    ("wmf_sd", "S.D."),
    ("wmf_tp", "Tee"),
];

/// 单个标注：单行文字或属性多行文字。
#[derive(Debug, Clone)]
pub enum Label {
    Text(Text),
    Attribute(MText),
}

/// 图纸范围与模型空间视图。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub limits: Bounds2D,
    pub view: ModelView,
}

impl ViewBounds {
    /// 范围外扩 `margin`；宽高比超过 `aspect` 时按宽度抬高视图高度。
    pub fn from_extent(extent: &Bounds2D, margin: f64, aspect: f64) -> Self {
        let (min, max) = if extent.is_empty() {
            (Point2::new(0.0, 0.0), Point2::new(0.0, 0.0))
        } else {
            (extent.min(), extent.max())
        };
        let limits = Bounds2D::new(
            min.translate(Vector2::new(-margin, -margin)),
            max.translate(Vector2::new(margin, margin)),
        );

        let width = max.x() - min.x() + margin;
        let mut height = max.y() - min.y() + margin;
        if height > 0.0 && width / height > aspect {
            height = width / aspect;
        }
        let center = Point2::new((min.x() + max.x()) * 0.5, (min.y() + max.y()) * 0.5);
        Self {
            limits,
            view: ModelView { center, height },
        }
    }
}

/// 文档级样式：点显示、文字样式与多重引线样式。
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyles {
    pub point_display_mode: i16,
    pub point_size: f64,
    pub text_style: TextStyle,
    pub leader_style: MLeaderStyle,
}

/// 绘图后端接口。
pub trait DrawingSink {
    fn apply_styles(&mut self, styles: &DocumentStyles);
    fn emit_layer(&mut self, layer: &ResolvedLayer);
    fn emit_polyline(&mut self, vertices: &[Point3], layer: &str);
    fn emit_point_marker(&mut self, position: Point3, layer: &str);
    fn emit_label(&mut self, label: Label);
    /// 注册符号块，已存在时返回 `false`。
    fn define_symbol(&mut self, block: BlockDefinition) -> bool;
    fn emit_symbol(&mut self, block: &str, insert: Point3, layer: &str) -> Result<(), EngineError>;
    fn emit_leader(&mut self, leader: MLeader);
    fn set_view_bounds(&mut self, bounds: &ViewBounds);
}

impl DrawingSink for Document {
    fn apply_styles(&mut self, styles: &DocumentStyles) {
        let header = self.header_mut();
        header.point_display_mode = styles.point_display_mode;
        header.point_size = styles.point_size;
        self.add_text_style(styles.text_style.clone());
        self.add_mleader_style(styles.leader_style.clone());
    }

    fn emit_layer(&mut self, layer: &ResolvedLayer) {
        self.add_layer(&layer.name, layer.color, layer.linetype.clone());
    }

    fn emit_polyline(&mut self, vertices: &[Point3], layer: &str) {
        self.add_polyline3d(vertices.iter().copied(), false, layer);
    }

    fn emit_point_marker(&mut self, position: Point3, layer: &str) {
        self.add_point(position, layer);
    }

    fn emit_label(&mut self, label: Label) {
        match label {
            Label::Text(text) => self.add_entity(Entity::Text(text)),
            Label::Attribute(mtext) => self.add_entity(Entity::MText(mtext)),
        };
    }

    fn define_symbol(&mut self, block: BlockDefinition) -> bool {
        self.add_block_definition(block)
    }

    fn emit_symbol(&mut self, block: &str, insert: Point3, layer: &str) -> Result<(), EngineError> {
        if self.block(block).is_none() {
            return Err(EngineError::BlockNotDefined(block.to_string()));
        }
        self.add_block_reference(block, insert, layer);
        Ok(())
    }

    fn emit_leader(&mut self, leader: MLeader) {
        self.add_mleader(leader);
    }

    fn set_view_bounds(&mut self, bounds: &ViewBounds) {
        let header = self.header_mut();
        header.limits = Some(bounds.limits);
        header.view = Some(bounds.view);
    }
}

/// 多重引线参数。
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderSettings {
    pub style_name: String,
    pub landing_gap: f64,
    pub dogleg_length: f64,
    pub arrow_size: f64,
    pub scale: f64,
    pub text_height: f64,
    pub gap: f64,
    /// 引线方向（度）与长度。
    pub angle: f64,
    pub length: f64,
}

impl Default for LeaderSettings {
    fn default() -> Self {
        Self {
            style_name: "SURVEY".to_string(),
            landing_gap: 0.4,
            dogleg_length: 0.5,
            arrow_size: 0.2,
            scale: 1.0,
            text_height: 0.3,
            gap: 0.1,
            angle: 15.0,
            length: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmitSettings {
    pub text_height: f64,
    pub line_factor: f64,
    pub offset_right: f64,
    pub offset_up: f64,
    pub block_text_height: f64,
    pub symbol_radius: f64,
    pub view_margin: f64,
    pub view_aspect: f64,
    pub point_display_mode: i16,
    pub point_size: f64,
    pub text_style: String,
    pub text_font: String,
    pub leader: LeaderSettings,
    /// 点代码 → 符号文字。
    pub symbols: BTreeMap<String, String>,
}

impl Default for EmitSettings {
    fn default() -> Self {
        Self {
            text_height: 0.01,
            line_factor: 1.4,
            offset_right: 0.005,
            offset_up: 0.004,
            block_text_height: 0.08,
            symbol_radius: 0.1,
            view_margin: 20.0,
            view_aspect: 2.0,
            point_display_mode: 34,
            point_size: 0.2,
            text_style: "OpenSans".to_string(),
            text_font: "OpenSans.ttf".to_string(),
            leader: LeaderSettings::default(),
            symbols: DEFAULT_SYMBOLS
                .iter()
                .map(|(code, text)| (code.to_string(), text.to_string()))
                .collect(),
        }
    }
}

impl EmitSettings {
    fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("text_height", self.text_height),
            ("line_factor", self.line_factor),
            ("block_text_height", self.block_text_height),
            ("symbol_radius", self.symbol_radius),
            ("view_aspect", self.view_aspect),
            ("leader.length", self.leader.length),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidSetting { name, value });
            }
        }
        if !(self.view_margin.is_finite() && self.view_margin >= 0.0) {
            return Err(EngineError::InvalidSetting {
                name: "view_margin",
                value: self.view_margin,
            });
        }
        Ok(())
    }
}

/// 一次输出的统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub layers: usize,
    pub polylines: usize,
    pub markers: usize,
    pub labels: usize,
    pub symbols: usize,
    pub leaders: usize,
}

impl EmitSummary {
    #[inline]
    pub fn entities(&self) -> usize {
        self.polylines + self.markers + self.labels + self.symbols + self.leaders
    }
}

pub struct GeometryEmitter {
    settings: EmitSettings,
}

impl GeometryEmitter {
    pub fn new(settings: EmitSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    #[inline]
    pub fn settings(&self) -> &EmitSettings {
        &self.settings
    }

    /// 点代码对应的符号文字，不在表中时返回 `None`。
    pub fn symbol_label(&self, code: &str) -> Option<&str> {
        self.settings.symbols.get(code).map(String::as_str)
    }

    #[inline]
    pub fn block_name(label: &str) -> String {
        format!("{label}_Block")
    }

    pub fn document_styles(&self) -> DocumentStyles {
        let leader = &self.settings.leader;
        DocumentStyles {
            point_display_mode: self.settings.point_display_mode,
            point_size: self.settings.point_size,
            text_style: TextStyle {
                name: self.settings.text_style.clone(),
                font: self.settings.text_font.clone(),
            },
            leader_style: MLeaderStyle {
                name: leader.style_name.clone(),
                text_style: Some(self.settings.text_style.clone()),
                scale: leader.scale,
                char_height: leader.text_height,
                landing_gap: leader.gap,
            },
        }
    }

    /// 只统计线要素点的范围。
    pub fn view_bounds(&self, survey: &SurveyIndex) -> ViewBounds {
        let mut extent = Bounds2D::empty();
        for point in survey.lines().values().flat_map(|chains| chains.values()).flatten() {
            extent.include_point(point.position.planar());
        }
        ViewBounds::from_extent(&extent, self.settings.view_margin, self.settings.view_aspect)
    }

    /// 圆、十字、文字，以及填充第一、第三象限的图案。
    pub fn symbol_block(&self, label: &str) -> BlockDefinition {
        let r = self.settings.symbol_radius;
        let origin = Point2::new(0.0, 0.0);
        let quadrant = |start: Point2, end: Point2, start_angle: f64| HatchLoop {
            edges: vec![
                HatchEdge::Line { start: origin, end: start },
                HatchEdge::Arc {
                    center: origin,
                    radius: r,
                    start_angle,
                    end_angle: start_angle + 90.0,
                },
                HatchEdge::Line { start: end, end: origin },
            ],
        };

        let entities = vec![
            Entity::Circle(Circle {
                center: origin,
                radius: r,
                layer: DEFAULT_LAYER.to_string(),
            }),
            Entity::Line(Line {
                start: Point2::new(-r, 0.0),
                end: Point2::new(r, 0.0),
                layer: DEFAULT_LAYER.to_string(),
            }),
            Entity::Line(Line {
                start: Point2::new(0.0, -r),
                end: Point2::new(0.0, r),
                layer: DEFAULT_LAYER.to_string(),
            }),
            Entity::Text(Text {
                insert: Point2::new(r * SYMBOL_TEXT_RATIO, r * SYMBOL_TEXT_RATIO),
                content: label.to_string(),
                height: self.settings.block_text_height,
                rotation: 0.0,
                align: TextAlign::BottomLeft,
                layer: DEFAULT_LAYER.to_string(),
            }),
            Entity::Hatch(Hatch {
                pattern_name: SOLID_PATTERN.to_string(),
                is_solid: true,
                loops: vec![
                    quadrant(Point2::new(r, 0.0), Point2::new(0.0, r), 0.0),
                    quadrant(Point2::new(-r, 0.0), Point2::new(0.0, -r), 180.0),
                ],
                color: Some(NEUTRAL_COLOR),
                layer: DEFAULT_LAYER.to_string(),
            }),
        ];

        BlockDefinition {
            name: Self::block_name(label),
            base_point: origin,
            entities,
        }
    }

    /// 从目标点按固定角度引出的多重引线。
    pub fn leader_for(&self, target: Point2, text: &str, layer: &str) -> MLeader {
        let leader = &self.settings.leader;
        let elbow = target.translate(Vector2::from_degrees(leader.angle, leader.length));
        let text_location = elbow.translate(Vector2::new(leader.dogleg_length + leader.landing_gap, 0.0));
        MLeader {
            layer: layer.to_string(),
            style_name: Some(leader.style_name.clone()),
            leader_lines: vec![LeaderLine {
                vertices: vec![target, elbow],
            }],
            text: text.to_string(),
            text_location,
            arrow_size: leader.arrow_size,
            dogleg_length: leader.dogleg_length,
            landing_gap: leader.landing_gap,
        }
    }

    /// 点标记以及代码、高程、点号三行文字；属性文字自点右上方逐行向上排列。
    /// 返回输出的文字数量。
    pub fn annotate<S>(&self, sink: &mut S, point: &SurveyPoint, layer: &str) -> usize
    where
        S: DrawingSink + ?Sized,
    {
        let settings = &self.settings;
        let step = settings.text_height * settings.line_factor;
        let x = point.easting() + settings.offset_right;
        let y = point.northing();
        let mut labels = 0;

        if let Some(attributes) = &point.attributes {
            let attribute_layer = attribute_layer(layer);
            for (row, attribute) in attributes.iter().enumerate() {
                sink.emit_label(Label::Attribute(MText {
                    insert: Point2::new(x, y + settings.offset_up + step * row as f64),
                    content: format!("\\H0.5x;{}: \\H1x;{}", attribute.label(), attribute.value),
                    height: settings.text_height,
                    attachment_point: ATTACH_BOTTOM_LEFT,
                    style: None,
                    layer: attribute_layer.clone(),
                }));
                labels += 1;
            }
        }

        sink.emit_point_marker(point.position, &marker_layer(layer));

        let lines = [
            (
                CODE_LABEL_LAYER,
                format!("Code: {}{}", point.base_code, point.sequence.label_suffix()),
            ),
            (HEIGHT_LABEL_LAYER, format!("Z = {}", point.height_text)),
            (NUMBER_LABEL_LAYER, format!("PtNum: {}", point.point_number)),
        ];
        for (row, (label_layer, content)) in lines.into_iter().enumerate() {
            sink.emit_label(Label::Text(Text {
                insert: Point2::new(x, y - step * (row + 1) as f64),
                content,
                height: settings.text_height,
                rotation: 0.0,
                align: TextAlign::BaselineLeft,
                layer: label_layer.to_string(),
            }));
            labels += 1;
        }
        labels
    }

    /// 依次输出样式、图层、线要素、未知要素与点要素，最后设置视图。
    pub fn emit<S>(&self, context: &PipelineContext<'_>, sink: &mut S) -> Result<EmitSummary, EngineError>
    where
        S: DrawingSink + ?Sized,
    {
        let mut summary = EmitSummary::default();
        let survey = context.survey();

        sink.apply_styles(&self.document_styles());
        for layer in context.styled_layers() {
            sink.emit_layer(&layer);
            summary.layers += 1;
        }

        for kind in [FeatureKind::Line, FeatureKind::Unknown] {
            for (code, chains) in survey.groups(kind) {
                let layer = context.layer_for_code(code);
                for (sequence, points) in chains {
                    for point in points {
                        summary.labels += self.annotate(sink, point, layer);
                        summary.markers += 1;
                    }
                    // 未知代码只有带显式序号时才连线
                    if kind == FeatureKind::Line || *sequence != Sequence::Unset {
                        let vertices: Vec<Point3> = points.iter().map(|p| p.position).collect();
                        sink.emit_polyline(&vertices, layer);
                        summary.polylines += 1;
                    }
                    debug!(kind = kind.as_str(), code, sequence = %sequence, points = points.len(), "输出点链");
                }
            }
        }

        for (code, chains) in survey.points() {
            let layer = context.layer_for_code(code);
            let symbol = self.symbol_label(code).map(|label| {
                let name = Self::block_name(label);
                if sink.define_symbol(self.symbol_block(label)) {
                    debug!(code, block = %name, "已定义符号块");
                }
                (label, name)
            });
            for point in chains.values().flatten() {
                if let Some((label, block)) = &symbol {
                    sink.emit_leader(self.leader_for(point.position.planar(), label, layer));
                    sink.emit_symbol(block, point.position, layer)?;
                    summary.leaders += 1;
                    summary.symbols += 1;
                }
                summary.labels += self.annotate(sink, point, layer);
                summary.markers += 1;
            }
        }

        let bounds = self.view_bounds(survey);
        sink.set_view_bounds(&bounds);

        info!(
            layers = summary.layers,
            polylines = summary.polylines,
            markers = summary.markers,
            labels = summary.labels,
            symbols = summary.symbols,
            "几何输出完成"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use svcad_core::survey::SurveyAttributes;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        layers: Vec<String>,
        polylines: Vec<(Vec<Point3>, String)>,
        markers: Vec<String>,
        labels: Vec<Label>,
        blocks: Vec<String>,
        symbols: Vec<String>,
        leaders: Vec<MLeader>,
        bounds: Option<ViewBounds>,
    }

    impl DrawingSink for RecordingSink {
        fn apply_styles(&mut self, _styles: &DocumentStyles) {}

        fn emit_layer(&mut self, layer: &ResolvedLayer) {
            self.layers.push(layer.name.clone());
        }

        fn emit_polyline(&mut self, vertices: &[Point3], layer: &str) {
            self.polylines.push((vertices.to_vec(), layer.to_string()));
        }

        fn emit_point_marker(&mut self, _position: Point3, layer: &str) {
            self.markers.push(layer.to_string());
        }

        fn emit_label(&mut self, label: Label) {
            self.labels.push(label);
        }

        fn define_symbol(&mut self, block: BlockDefinition) -> bool {
            if self.blocks.contains(&block.name) {
                return false;
            }
            self.blocks.push(block.name);
            true
        }

        fn emit_symbol(&mut self, block: &str, _insert: Point3, _layer: &str) -> Result<(), EngineError> {
            if !self.blocks.iter().any(|name| name == block) {
                return Err(EngineError::BlockNotDefined(block.to_string()));
            }
            self.symbols.push(block.to_string());
            Ok(())
        }

        fn emit_leader(&mut self, leader: MLeader) {
            self.leaders.push(leader);
        }

        fn set_view_bounds(&mut self, bounds: &ViewBounds) {
            self.bounds = Some(*bounds);
        }
    }

    fn point(number: &str, x: f64, y: f64, code: &str, sequence: Sequence) -> SurveyPoint {
        SurveyPoint {
            point_number: number.to_string(),
            position: Point3::new(x, y, 10.5),
            height_text: "10.5".to_string(),
            raw_code: code.to_string(),
            base_code: code.to_string(),
            kind: FeatureKind::Point,
            sequence,
            attributes: None,
        }
    }

    fn text_contents(labels: &[Label]) -> Vec<&str> {
        labels
            .iter()
            .filter_map(|label| match label {
                Label::Text(text) => Some(text.content.as_str()),
                Label::Attribute(_) => None,
            })
            .collect()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = EmitSettings {
            text_height: 0.0,
            ..EmitSettings::default()
        };
        let err = GeometryEmitter::new(settings).err().expect("should fail");
        assert!(matches!(err, EngineError::InvalidSetting { name: "text_height", .. }));
    }

    #[test]
    fn annotate_stacks_labels_below_point() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let mut sink = RecordingSink::default();
        let survey_point = point("42", 100.0, 200.0, "kb", Sequence::Explicit(3));

        let count = emitter.annotate(&mut sink, &survey_point, "Kerb");
        assert_eq!(count, 3);
        assert_eq!(sink.markers, ["points_Kerb"]);
        assert_eq!(text_contents(&sink.labels), ["Code: kb3", "Z = 10.5", "PtNum: 42"]);

        let Label::Text(number) = &sink.labels[2] else {
            panic!("expected text label");
        };
        assert_eq!(number.layer, NUMBER_LABEL_LAYER);
        assert!((number.insert.x() - 100.005).abs() < 1e-9);
        assert!((number.insert.y() - (200.0 - 3.0 * 0.014)).abs() < 1e-9);
    }

    #[test]
    fn height_label_keeps_surveyed_precision() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let mut sink = RecordingSink::default();
        let mut survey_point = point("8", 1.0, 2.0, "bm", Sequence::Unset);
        survey_point.position = Point3::new(1.0, 2.0, 50.0);
        survey_point.height_text = "50.000".to_string();

        emitter.annotate(&mut sink, &survey_point, "BenchMarks");
        assert_eq!(text_contents(&sink.labels)[1], "Z = 50.000");
    }

    #[test]
    fn both_sentinel_sequences_blank_the_suffix() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        for sequence in [Sequence::Continuous, Sequence::Unset] {
            let mut sink = RecordingSink::default();
            emitter.annotate(&mut sink, &point("1", 0.0, 0.0, "kb", sequence), "Kerb");
            assert_eq!(text_contents(&sink.labels)[0], "Code: kb");
        }
    }

    #[test]
    fn attributes_become_multiline_text_stacked_upward() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let mut sink = RecordingSink::default();
        let mut survey_point = point("7", 10.0, 20.0, "wmf_fm", Sequence::Continuous);
        survey_point.attributes = Some(SurveyAttributes::from_columns([
            "wmf_fm:Diameter",
            "150",
            "Material",
        ]));

        assert_eq!(emitter.annotate(&mut sink, &survey_point, "Water"), 5);
        let attributes: Vec<&MText> = sink
            .labels
            .iter()
            .filter_map(|label| match label {
                Label::Attribute(mtext) => Some(mtext),
                Label::Text(_) => None,
            })
            .collect();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].content, "\\H0.5x;Diameter: \\H1x;150");
        assert_eq!(attributes[1].content, "\\H0.5x;Material: \\H1x;");
        assert_eq!(attributes[0].layer, "attrib_Water");
        assert_eq!(attributes[0].attachment_point, 7);
        assert!((attributes[0].insert.y() - 20.004).abs() < 1e-9);
        assert!((attributes[1].insert.y() - (20.004 + 0.014)).abs() < 1e-9);
    }

    #[test]
    fn symbol_block_has_circle_cross_text_and_two_quadrants() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let block = emitter.symbol_block("A.V.");
        assert_eq!(block.name, "A.V._Block");
        assert_eq!(block.entities.len(), 5);

        let hatch = block
            .entities
            .iter()
            .find_map(|entity| match entity {
                Entity::Hatch(hatch) => Some(hatch),
                _ => None,
            })
            .expect("hatch");
        assert_eq!(hatch.loops.len(), 2);
        assert_eq!(hatch.color, Some(NEUTRAL_COLOR));
        let arcs: Vec<(f64, f64)> = hatch
            .loops
            .iter()
            .flat_map(|l| l.edges.iter())
            .filter_map(|edge| match edge {
                HatchEdge::Arc { start_angle, end_angle, .. } => Some((*start_angle, *end_angle)),
                HatchEdge::Line { .. } => None,
            })
            .collect();
        assert_eq!(arcs, vec![(0.0, 90.0), (180.0, 270.0)]);

        let text = block
            .entities
            .iter()
            .find_map(|entity| match entity {
                Entity::Text(text) => Some(text),
                _ => None,
            })
            .expect("text");
        assert_eq!(text.align, TextAlign::BottomLeft);
        assert!((text.insert.x() - 0.09).abs() < 1e-12);
        assert!((text.height - 0.08).abs() < 1e-12);
    }

    #[test]
    fn leader_points_at_target_with_configured_angle() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let leader = emitter.leader_for(Point2::new(5.0, 5.0), "BB", "Water");
        let vertices = &leader.leader_lines[0].vertices;
        assert_eq!(vertices[0], Point2::new(5.0, 5.0));
        let angle = (vertices[1].y() - 5.0).atan2(vertices[1].x() - 5.0).to_degrees();
        assert!((angle - 15.0).abs() < 1e-9);
        assert_eq!(leader.style_name.as_deref(), Some("SURVEY"));
        assert_eq!(leader.arrow_size, 0.2);
    }

    #[test]
    fn view_bounds_apply_margin_and_aspect() {
        let mut extent = Bounds2D::empty();
        extent.include_point(Point2::new(0.0, 0.0));
        extent.include_point(Point2::new(100.0, 10.0));

        let bounds = ViewBounds::from_extent(&extent, 20.0, 2.0);
        assert_eq!(bounds.limits.min(), Point2::new(-20.0, -20.0));
        assert_eq!(bounds.limits.max(), Point2::new(120.0, 30.0));
        assert_eq!(bounds.view.center, Point2::new(50.0, 5.0));
        assert!((bounds.view.height - 60.0).abs() < 1e-9);

        let mut tall = Bounds2D::empty();
        tall.include_point(Point2::new(0.0, 0.0));
        tall.include_point(Point2::new(10.0, 100.0));
        let bounds = ViewBounds::from_extent(&tall, 20.0, 2.0);
        assert!((bounds.view.height - 120.0).abs() < 1e-9);
    }

    #[test]
    fn empty_extent_centres_on_origin() {
        let bounds = ViewBounds::from_extent(&Bounds2D::empty(), 20.0, 2.0);
        assert_eq!(bounds.view.center, Point2::new(0.0, 0.0));
        assert!((bounds.view.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn document_sink_rejects_undefined_block() {
        let mut document = Document::new();
        let err = document
            .emit_symbol("Missing_Block", Point3::new(0.0, 0.0, 0.0), "0")
            .unwrap_err();
        assert!(matches!(err, EngineError::BlockNotDefined(name) if name == "Missing_Block"));
    }

    #[test]
    fn document_sink_records_styles_and_view() {
        let emitter = GeometryEmitter::new(EmitSettings::default()).unwrap();
        let mut document = Document::new();
        document.apply_styles(&emitter.document_styles());
        document.set_view_bounds(&ViewBounds::from_extent(&Bounds2D::empty(), 20.0, 2.0));

        assert_eq!(document.header().point_display_mode, 34);
        assert_eq!(document.header().point_size, 0.2);
        assert_eq!(
            document.text_style("OpenSans").map(|s| s.font.as_str()),
            Some("OpenSans.ttf")
        );
        let style = document.mleader_style("SURVEY").expect("leader style");
        assert_eq!(style.char_height, 0.3);
        assert_eq!(style.landing_gap, 0.1);
        assert!(document.header().view.is_some());
    }
}
