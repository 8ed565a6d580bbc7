//! Cumulative and frame-to-frame drift in pixels.
//!
//! The aggregator is a small value threaded through the session: each call to
//! [`DriftAggregator::advance`] consumes it and hands back a new one whose
//! previous sample is the frame just processed. The reference (first) sample
//! never changes during a pass.

use chrono::NaiveTime;
use serde::Serialize;

use crate::coordinates::ARCSEC_PER_DEGREE;

/// Arcseconds per pixel for the Seestar S50 sensor and optics.
pub const PLATE_SCALE_ARCSEC_PER_PIXEL: f64 = 2.37;

/// Sky coordinate of the reference pixel of one exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct SkySample {
    pub object_name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub observed_at: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PixelOffset {
    pub ra_pixels: f64,
    pub dec_pixels: f64,
    pub total_pixels: f64,
}

impl PixelOffset {
    pub const ZERO: PixelOffset = PixelOffset {
        ra_pixels: 0.0,
        dec_pixels: 0.0,
        total_pixels: 0.0,
    };

    /// Displacement of `current` relative to `origin`, in pixels.
    ///
    /// Flat-sky approximation: the RA difference is not scaled by cos(dec).
    /// Declination is negated so that positive values follow the image
    /// Y axis of the Seestar frames. RA wrap at 0/360 is not handled.
    /// Coordinates are used at full precision, not the 5-decimal CSV values.
    pub fn between(origin: &SkySample, current: &SkySample, plate_scale: f64) -> Self {
        let ra_pixels = (origin.ra_deg - current.ra_deg) / plate_scale * ARCSEC_PER_DEGREE;
        let dec_pixels = -(origin.dec_deg - current.dec_deg) / plate_scale * ARCSEC_PER_DEGREE;
        Self {
            ra_pixels,
            dec_pixels,
            total_pixels: ra_pixels.hypot(dec_pixels),
        }
    }
}

/// Offsets of one frame from the session start and from the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameOffsets {
    pub cumulative: PixelOffset,
    pub step: PixelOffset,
}

#[derive(Debug, Clone, Copy)]
pub struct DriftAggregator<'a> {
    plate_scale: f64,
    reference: &'a SkySample,
    previous: &'a SkySample,
}

impl<'a> DriftAggregator<'a> {
    /// Begin a session at `reference`. Its own offsets are all zero.
    pub fn start(reference: &'a SkySample, plate_scale: f64) -> (FrameOffsets, Self) {
        let aggregator = Self {
            plate_scale,
            reference,
            previous: reference,
        };
        (FrameOffsets::default(), aggregator)
    }

    /// Offsets for `current`, and the context for the frame after it.
    pub fn advance(self, current: &'a SkySample) -> (FrameOffsets, Self) {
        let offsets = FrameOffsets {
            cumulative: PixelOffset::between(self.reference, current, self.plate_scale),
            step: PixelOffset::between(self.previous, current, self.plate_scale),
        };
        let next = Self {
            previous: current,
            ..self
        };
        (offsets, next)
    }

    pub fn reference(&self) -> &'a SkySample {
        self.reference
    }

    pub fn previous(&self) -> &'a SkySample {
        self.previous
    }

    pub fn plate_scale(&self) -> f64 {
        self.plate_scale
    }
}
