use serde::Serialize;
use tracing::{debug, info};

use crate::drift::{DriftAggregator, SkySample};
use crate::error::DriftError;
use crate::table::{FrameRecord, ResultTable, SessionSummary};
use crate::timeseries::{parse_time_of_day, session_date, TimeSeriesTracker};

/// One input exposure as handed over by the header reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exposure {
    pub identifier: String,
    pub object_name: String,
    /// Sky coordinate of the reference pixel.
    pub ra_deg: f64,
    pub dec_deg: f64,
    /// Raw `DATE-OBS` header value.
    pub date_obs: String,
    /// Mount pointing from the `RA`/`DEC` keywords.
    pub target_ra_deg: f64,
    pub target_dec_deg: f64,
}

impl Exposure {
    pub fn to_sky_sample(&self) -> Result<SkySample, DriftError> {
        Ok(SkySample {
            object_name: self.object_name.clone(),
            ra_deg: self.ra_deg,
            dec_deg: self.dec_deg,
            observed_at: parse_time_of_day(&self.identifier, &self.date_obs)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DriftReport {
    pub table: ResultTable,
    pub summary: SessionSummary,
}

/// Aggregate drift over `exposures` in the order given.
///
/// The caller is responsible for chronological order; nothing here sorts.
/// Any error aborts the whole pass and no table is returned.
pub fn aggregate_session(
    exposures: &[Exposure],
    plate_scale: f64,
) -> Result<DriftReport, DriftError> {
    let (first, _) = exposures.split_first().ok_or(DriftError::NoInput)?;

    let samples = exposures
        .iter()
        .map(Exposure::to_sky_sample)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Aggregating {} exposures of {} at {}\"/px",
        exposures.len(),
        first.object_name,
        plate_scale
    );

    let mut tracker = TimeSeriesTracker::new();
    let mut table = ResultTable::with_capacity(exposures.len());

    let reference = &samples[0];
    let (offsets, mut aggregator) = DriftAggregator::start(reference, plate_scale);
    let timing = tracker.observe(reference.observed_at);
    table.append(FrameRecord::new(0, &first.identifier, reference, timing, offsets));

    for (index, (exposure, sample)) in exposures.iter().zip(&samples).enumerate().skip(1) {
        let timing = tracker.observe(sample.observed_at);
        let (offsets, next) = aggregator.advance(sample);
        aggregator = next;

        debug!(
            "{} t={:.1}s cumulative={:.2}px step={:.2}px",
            exposure.identifier,
            timing.elapsed_seconds,
            offsets.cumulative.total_pixels,
            offsets.step.total_pixels
        );

        table.append(FrameRecord::new(
            index,
            &exposure.identifier,
            sample,
            timing,
            offsets,
        ));
    }

    let summary = table.summarize(&first.object_name, session_date(&first.date_obs))?;

    info!(
        "RA dispersion {:.2}', Dec dispersion {:.2}' over {:.1}s",
        summary.ra_dispersion_arcmin, summary.dec_dispersion_arcmin, summary.total_elapsed_seconds
    );

    Ok(DriftReport { table, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{PixelOffset, PLATE_SCALE_ARCSEC_PER_PIXEL};

    fn exposure(identifier: &str, ra_deg: f64, dec_deg: f64, date_obs: &str) -> Exposure {
        Exposure {
            identifier: identifier.to_string(),
            object_name: "M 42".to_string(),
            ra_deg,
            dec_deg,
            date_obs: date_obs.to_string(),
            target_ra_deg: 83.82,
            target_dec_deg: -5.39,
        }
    }

    fn scenario() -> Vec<Exposure> {
        vec![
            exposure("f0", 10.0, 20.0, "2024-03-14T00:00:00.0"),
            exposure("f1", 10.0005, 20.0003, "2024-03-14T00:00:10.0"),
            exposure("f2", 10.0002, 20.0001, "2024-03-14T00:00:25.0"),
        ]
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = aggregate_session(&[], PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap_err();
        assert_eq!(err, DriftError::NoInput);
    }

    #[test]
    fn test_three_frame_scenario() {
        let report = aggregate_session(&scenario(), PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap();
        let records = report.table.records();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.elapsed_seconds, 0.0);
        assert_eq!(first.delta_seconds, 0.0);
        assert_eq!(first.cumulative, PixelOffset::ZERO);
        assert_eq!(first.step, PixelOffset::ZERO);

        let second = records[1].to_row();
        assert_eq!(second.elapsed_seconds, 10.0);
        assert_eq!(second.delta_seconds, 10.0);
        assert_eq!(second.cumulative_ra_pixels, -0.8);
        assert_eq!(second.cumulative_dec_pixels, 0.5);
        assert_eq!(records[1].step, records[1].cumulative);

        let third = &records[2];
        assert_eq!(third.elapsed_seconds, 25.0);
        assert_eq!(third.delta_seconds, 15.0);
        assert_ne!(third.step, third.cumulative);

        assert_eq!(report.summary.session_date.as_deref(), Some("2024-03-14"));
        assert_eq!(report.summary.object_name, "M 42");
    }

    #[test]
    fn test_malformed_timestamp_aborts() {
        let mut exposures = scenario();
        exposures[2].date_obs = "2024-03-14T00-00-25".to_string();
        let err = aggregate_session(&exposures, PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap_err();
        assert_eq!(err.kind(), "TimestampParseError");
        assert_eq!(err.exposure(), Some("f2"));
    }

    #[test]
    fn test_rerun_is_identical() {
        let exposures = scenario();
        let a = aggregate_session(&exposures, PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap();
        let b = aggregate_session(&exposures, PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap();
        assert_eq!(a.table.records(), b.table.records());
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_input_order_is_kept() {
        let mut exposures = scenario();
        exposures.reverse();
        let report = aggregate_session(&exposures, PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap();
        let ids: Vec<_> = report
            .table
            .records()
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["f2", "f1", "f0"]);
        assert!(report.table.records()[1].elapsed_seconds < 0.0);
    }
}
