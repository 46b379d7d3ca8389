use svcad_config::{AppConfig, DrawingConfig};
use svcad_core::feature::FeatureKind;
use svcad_engine::{EmitSettings, EmitSummary, GeometryEmitter, PipelineContext};
use svcad_io::{DocumentSaver, JsonSnapshotSaver};
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{RunInputs, load_library, load_survey};

/// 一次成功运行的统计。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub rows_read: usize,
    pub rows_without_code: usize,
    pub rows_rejected: usize,
    pub classification_misses: usize,
    pub line_points: usize,
    pub point_points: usize,
    pub unknown_points: usize,
    pub codes_seen: Vec<String>,
    pub unmapped_codes: Vec<String>,
    pub emitted: EmitSummary,
}

/// 在内置默认值上应用配置中的绘图覆盖项。
pub fn emit_settings(config: &DrawingConfig) -> EmitSettings {
    let mut settings = EmitSettings::default();
    let overrides = [
        (&mut settings.text_height, config.text_height),
        (&mut settings.line_factor, config.line_factor),
        (&mut settings.offset_right, config.offset_right),
        (&mut settings.offset_up, config.offset_up),
        (&mut settings.block_text_height, config.block_text_height),
        (&mut settings.symbol_radius, config.symbol_radius),
        (&mut settings.view_margin, config.view_margin),
        (&mut settings.view_aspect, config.view_aspect),
        (&mut settings.point_size, config.point_size),
        (&mut settings.leader.landing_gap, config.leader.landing_gap),
        (&mut settings.leader.dogleg_length, config.leader.dogleg_length),
        (&mut settings.leader.arrow_size, config.leader.arrow_size),
        (&mut settings.leader.scale, config.leader.scale),
        (&mut settings.leader.text_height, config.leader.text_height),
        (&mut settings.leader.gap, config.leader.gap),
        (&mut settings.leader.angle, config.leader.angle),
        (&mut settings.leader.length, config.leader.length),
    ];
    for (target, value) in overrides {
        if let Some(value) = value {
            *target = value;
        }
    }
    if let Some(mode) = config.point_display_mode {
        settings.point_display_mode = mode;
    }
    if let Some(style) = &config.text_style {
        settings.text_style = style.clone();
    }
    if let Some(font) = &config.text_font {
        settings.text_font = font.clone();
    }
    if let Some(name) = &config.leader.style_name {
        settings.leader.style_name = name.clone();
    }
    settings.symbols.extend(
        config
            .symbols
            .iter()
            .map(|(code, text)| (code.clone(), text.clone())),
    );
    settings
}

/// 要素库 → 测量数据 → 图层推导 → 几何输出 → 保存。任一阶段失败都不会写出输出文件。
pub fn run_pipeline(inputs: &RunInputs, config: &AppConfig) -> Result<RunReport, FrontendError> {
    let library = load_library(&inputs.library)?;
    let survey = load_survey(&inputs.survey, &library, inputs.code_precedence)?;

    let emitter = GeometryEmitter::new(emit_settings(&config.drawing))?;
    let context = PipelineContext::new(&library, &survey);
    let (document, emitted) = context.render_document(&emitter)?;

    JsonSnapshotSaver::new()
        .save(&document, &inputs.output)
        .map_err(|source| FrontendError::Save {
            path: inputs.output.clone(),
            source,
        })?;

    let stats = survey.stats();
    let report = RunReport {
        rows_read: stats.rows_read,
        rows_without_code: stats.rows_without_code,
        rows_rejected: stats.rows_rejected,
        classification_misses: stats.classification_misses,
        line_points: survey.point_count(FeatureKind::Line),
        point_points: survey.point_count(FeatureKind::Point),
        unknown_points: survey.point_count(FeatureKind::Unknown),
        codes_seen: survey.needed_codes().to_vec(),
        unmapped_codes: context.layers().unmapped_codes().to_vec(),
        emitted,
    };
    info!(
        output = %inputs.output.display(),
        entities = report.emitted.entities(),
        unmapped = report.unmapped_codes.len(),
        "转换完成"
    );
    Ok(report)
}

pub fn print_report(inputs: &RunInputs, report: &RunReport) {
    println!("要素库：{}", inputs.library.display());
    println!("测量文件：{}", inputs.survey.display());
    println!("输出文件：{}", inputs.output.display());
    println!(
        "读取行数={}, 无代码行={}, 跳过行={}, 分类失败={}",
        report.rows_read, report.rows_without_code, report.rows_rejected, report.classification_misses
    );
    println!(
        "线要素点={}, 点要素点={}, 未知要素点={}",
        report.line_points, report.point_points, report.unknown_points
    );
    println!("出现的代码：{}", report.codes_seen.join(", "));
    if report.unmapped_codes.is_empty() {
        println!("所有代码均已映射到图层。");
    } else {
        println!("未映射代码（使用 Spare 图层）：{}", report.unmapped_codes.join(", "));
    }
    let emitted = &report.emitted;
    println!(
        "图层={}, 多段线={}, 点标记={}, 文字={}, 符号={}, 引线={}",
        emitted.layers,
        emitted.polylines,
        emitted.markers,
        emitted.labels,
        emitted.symbols,
        emitted.leaders
    );
}
