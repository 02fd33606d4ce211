pub use super::analysis_history::Entity as AnalysisHistory;
