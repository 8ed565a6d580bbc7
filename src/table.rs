use serde::Serialize;

use crate::coordinates::{format_sexagesimal, format_sexagesimal_hours};
use crate::drift::{FrameOffsets, PixelOffset, SkySample};
use crate::error::DriftError;
use crate::timeseries::FrameTiming;
use crate::utils::{min_max, round_to};

/// One aggregated exposure. Values are kept at full precision; rounding for
/// display happens in [`FrameRecord::to_row`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub identifier: String,
    pub elapsed_seconds: f64,
    pub delta_seconds: f64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub ra_sexagesimal_deg: String,
    pub dec_sexagesimal_deg: String,
    pub ra_sexagesimal_hour: String,
    pub dec_sexagesimal_hour: String,
    pub cumulative: PixelOffset,
    pub step: PixelOffset,
}

impl FrameRecord {
    pub fn new(
        index: usize,
        identifier: &str,
        sample: &SkySample,
        timing: FrameTiming,
        offsets: FrameOffsets,
    ) -> Self {
        Self {
            index,
            identifier: identifier.to_string(),
            elapsed_seconds: timing.elapsed_seconds,
            delta_seconds: timing.delta_seconds,
            ra_deg: sample.ra_deg,
            dec_deg: sample.dec_deg,
            ra_sexagesimal_deg: format_sexagesimal(sample.ra_deg),
            dec_sexagesimal_deg: format_sexagesimal(sample.dec_deg),
            ra_sexagesimal_hour: format_sexagesimal_hours(sample.ra_deg),
            dec_sexagesimal_hour: format_sexagesimal(sample.dec_deg),
            cumulative: offsets.cumulative,
            step: offsets.step,
        }
    }

    /// Rounded view used by every writer: times and offsets to 0.1,
    /// coordinates to 5 decimals.
    pub fn to_row(&self) -> FrameRow {
        FrameRow {
            identifier: self.identifier.clone(),
            elapsed_seconds: round_to(self.elapsed_seconds, 1),
            delta_seconds: round_to(self.delta_seconds, 1),
            ra_deg: round_to(self.ra_deg, 5),
            dec_deg: round_to(self.dec_deg, 5),
            ra_sexagesimal_deg: self.ra_sexagesimal_deg.clone(),
            dec_sexagesimal_deg: self.dec_sexagesimal_deg.clone(),
            ra_sexagesimal_hour: self.ra_sexagesimal_hour.clone(),
            dec_sexagesimal_hour: self.dec_sexagesimal_hour.clone(),
            cumulative_ra_pixels: round_to(self.cumulative.ra_pixels, 1),
            cumulative_dec_pixels: round_to(self.cumulative.dec_pixels, 1),
            cumulative_total_pixels: round_to(self.cumulative.total_pixels, 1),
            step_ra_pixels: round_to(self.step.ra_pixels, 1),
            step_dec_pixels: round_to(self.step.dec_pixels, 1),
            step_total_pixels: round_to(self.step.total_pixels, 1),
        }
    }
}

/// Output row, in the column order of the drift report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRow {
    pub identifier: String,
    pub elapsed_seconds: f64,
    pub delta_seconds: f64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub ra_sexagesimal_deg: String,
    pub dec_sexagesimal_deg: String,
    pub ra_sexagesimal_hour: String,
    pub dec_sexagesimal_hour: String,
    pub cumulative_ra_pixels: f64,
    pub cumulative_dec_pixels: f64,
    pub cumulative_total_pixels: f64,
    pub step_ra_pixels: f64,
    pub step_dec_pixels: f64,
    pub step_total_pixels: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frame_count: usize,
    pub object_name: String,
    pub session_date: Option<String>,
    pub ra_dispersion_arcmin: f64,
    pub dec_dispersion_arcmin: f64,
    pub total_elapsed_seconds: f64,
    pub max_cumulative_pixels: f64,
    pub max_step_pixels: f64,
}

/// Append-only, input-ordered table of frame records.
#[derive(Debug, Default, Clone)]
pub struct ResultTable {
    records: Vec<FrameRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, record: FrameRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn rows(&self) -> Vec<FrameRow> {
        self.records.iter().map(FrameRecord::to_row).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dispersion and extremes over the whole table.
    pub fn summarize(
        &self,
        object_name: &str,
        session_date: Option<String>,
    ) -> Result<SessionSummary, DriftError> {
        let last = self.records.last().ok_or(DriftError::EmptyTable)?;

        let (ra_min, ra_max) = min_max(self.records.iter().map(|r| r.ra_deg));
        let (dec_min, dec_max) = min_max(self.records.iter().map(|r| r.dec_deg));
        let (_, max_cumulative) = min_max(self.records.iter().map(|r| r.cumulative.total_pixels));
        let (_, max_step) = min_max(self.records.iter().map(|r| r.step.total_pixels));

        Ok(SessionSummary {
            frame_count: self.records.len(),
            object_name: object_name.to_string(),
            session_date,
            ra_dispersion_arcmin: (ra_max - ra_min) * 60.0,
            dec_dispersion_arcmin: (dec_max - dec_min) * 60.0,
            total_elapsed_seconds: last.elapsed_seconds,
            max_cumulative_pixels: max_cumulative,
            max_step_pixels: max_step,
        })
    }
}
