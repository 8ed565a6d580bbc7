pub mod analyze;
pub mod inspect;

pub use analyze::{analyze, AnalyzeOptions};
pub use inspect::inspect;
