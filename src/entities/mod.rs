pub mod prelude;

pub mod analysis_history;
