pub mod cli;
pub mod commands;
pub mod coordinates;
pub mod drift;
pub mod error;
pub mod fits;
pub mod plot;
pub mod report;
pub mod session;
pub mod table;
pub mod timeseries;
pub mod utils;
pub mod wcs;

// Re-export commonly used items
pub use drift::{DriftAggregator, FrameOffsets, PixelOffset, SkySample, PLATE_SCALE_ARCSEC_PER_PIXEL};
pub use error::DriftError;
pub use session::{aggregate_session, DriftReport, Exposure};
pub use table::{FrameRecord, FrameRow, ResultTable, SessionSummary};
