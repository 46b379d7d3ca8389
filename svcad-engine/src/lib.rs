pub mod emit;
pub mod layers;
pub mod pipeline;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("block {0} is not defined")]
        BlockNotDefined(String),
        #[error("invalid drawing setting {name}: {value}")]
        InvalidSetting { name: &'static str, value: f64 },
    }
}

pub use emit::{
    DEFAULT_SYMBOLS, DocumentStyles, DrawingSink, EmitSettings, EmitSummary, GeometryEmitter, Label,
    LeaderSettings, ViewBounds,
};
pub use errors::EngineError;
pub use layers::{LayerResolution, LayerResolver, ResolvedLayer};
pub use pipeline::PipelineContext;
