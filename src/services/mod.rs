pub mod analysis;

pub use analysis::{
    AnalysisError, AnalysisRequest, AnalysisService, ExtractionGateway, SearchGateway,
};
