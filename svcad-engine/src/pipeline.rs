use svcad_core::document::Document;
use svcad_core::feature::FeatureLibrary;
use svcad_core::survey::SurveyIndex;

use crate::emit::{DrawingSink, EmitSummary, GeometryEmitter};
use crate::errors::EngineError;
use crate::layers::{LayerResolution, LayerResolver, ResolvedLayer};

/// 一次运行的只读状态：要素库、测量索引以及由两者推导出的图层集合。
pub struct PipelineContext<'a> {
    library: &'a FeatureLibrary,
    survey: &'a SurveyIndex,
    layers: LayerResolution,
}

impl<'a> PipelineContext<'a> {
    pub fn new(library: &'a FeatureLibrary, survey: &'a SurveyIndex) -> Self {
        let layers = LayerResolver::resolve(survey.needed_codes(), library.code_layers());
        Self {
            library,
            survey,
            layers,
        }
    }

    #[inline]
    pub fn library(&self) -> &'a FeatureLibrary {
        self.library
    }

    #[inline]
    pub fn survey(&self) -> &'a SurveyIndex {
        self.survey
    }

    #[inline]
    pub fn layers(&self) -> &LayerResolution {
        &self.layers
    }

    pub fn layer_for_code(&self, code: &str) -> &'a str {
        LayerResolver::layer_for_code(code, self.library.code_layers())
    }

    pub fn styled_layers(&self) -> Vec<ResolvedLayer> {
        LayerResolver::styled_layers(&self.layers, self.library)
    }

    pub fn render<S>(&self, emitter: &GeometryEmitter, sink: &mut S) -> Result<EmitSummary, EngineError>
    where
        S: DrawingSink + ?Sized,
    {
        emitter.emit(self, sink)
    }

    /// 输出到新的内存文档。
    pub fn render_document(&self, emitter: &GeometryEmitter) -> Result<(Document, EmitSummary), EngineError> {
        let mut document = Document::new();
        let summary = self.render(emitter, &mut document)?;
        Ok((document, summary))
    }
}
