//! Linear TAN world coordinate system.
//!
//! Pixel → sky through the gnomonic projection:
//!
//! 1. `(xi, eta) = M × (x - CRPIX1, y - CRPIX2)` in degrees
//! 2. de-project `(xi, eta)` around `(CRVAL1, CRVAL2)`
//!
//! `M` comes from the CD matrix, from PC × CDELT, or from CDELT and CROTA2,
//! in that order of preference. SIP distortion terms are ignored.

use nalgebra::{Matrix2, Vector2};

/// Reference pixel used by the drift measurement (0-based, Seestar 1080x1920 frame).
pub const DEFAULT_REFERENCE_PIXEL: (f64, f64) = (540.0, 960.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    /// Reference pixel (CRPIX1, CRPIX2), 1-based as stored in FITS.
    pub crpix: Vector2<f64>,
    /// Reference sky coordinate (CRVAL1 = RA, CRVAL2 = Dec) in degrees.
    pub crval: Vector2<f64>,
    /// Pixel offset → intermediate world coordinates, degrees per pixel.
    pub linear: Matrix2<f64>,
}

impl Wcs {
    pub fn new(crpix: (f64, f64), crval: (f64, f64), linear: Matrix2<f64>) -> Self {
        Self {
            crpix: Vector2::new(crpix.0, crpix.1),
            crval: Vector2::new(crval.0, crval.1),
            linear,
        }
    }

    /// Build the linear part from CDELT and a CROTA2 rotation in degrees.
    pub fn linear_from_cdelt(cdelt: (f64, f64), crota2_deg: f64) -> Matrix2<f64> {
        let (sin_r, cos_r) = crota2_deg.to_radians().sin_cos();
        Matrix2::new(
            cdelt.0 * cos_r,
            -cdelt.1 * sin_r,
            cdelt.0 * sin_r,
            cdelt.1 * cos_r,
        )
    }

    /// Build the linear part from a PC matrix and CDELT scale.
    pub fn linear_from_pc(pc: Matrix2<f64>, cdelt: (f64, f64)) -> Matrix2<f64> {
        Matrix2::from_diagonal(&Vector2::new(cdelt.0, cdelt.1)) * pc
    }

    /// Sky coordinate (RA, Dec in degrees) of a 0-based pixel position.
    ///
    /// RA is normalised to [0, 360).
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> (f64, f64) {
        // FITS pixel indices start at 1
        let offset = Vector2::new(x + 1.0, y + 1.0) - self.crpix;
        let intermediate = self.linear * offset;

        let xi = intermediate.x.to_radians();
        let eta = intermediate.y.to_radians();
        let ra0 = self.crval.x.to_radians();
        let (sin_dec0, cos_dec0) = self.crval.y.to_radians().sin_cos();

        let denom = cos_dec0 - eta * sin_dec0;
        let ra = ra0 + xi.atan2(denom);
        let dec = (sin_dec0 + eta * cos_dec0).atan2(xi.hypot(denom));

        (ra.to_degrees().rem_euclid(360.0), dec.to_degrees())
    }

    /// Mean pixel scale in arcseconds per pixel.
    pub fn pixel_scale_arcsec(&self) -> f64 {
        let scale_x = self.linear.column(0).norm();
        let scale_y = self.linear.column(1).norm();
        (scale_x + scale_y) / 2.0 * 3600.0
    }

    /// Position angle of the image Y axis, degrees from North through East.
    pub fn rotation_degrees(&self) -> f64 {
        self.linear[(1, 0)].atan2(self.linear[(1, 1)]).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE_DEG: f64 = 2.37 / 3600.0;

    fn seestar_wcs() -> Wcs {
        Wcs::new(
            (541.0, 961.0),
            (83.8221, -5.391),
            Matrix2::new(-SCALE_DEG, 0.0, 0.0, SCALE_DEG),
        )
    }

    #[test]
    fn test_reference_pixel_maps_to_crval() {
        let wcs = seestar_wcs();
        let (ra, dec) = wcs.pixel_to_sky(DEFAULT_REFERENCE_PIXEL.0, DEFAULT_REFERENCE_PIXEL.1);
        assert!((ra - 83.8221).abs() < 1e-10);
        assert!((dec - (-5.391)).abs() < 1e-10);
    }

    #[test]
    fn test_one_pixel_in_y_is_one_plate_scale_in_dec() {
        let wcs = seestar_wcs();
        let (_, dec0) = wcs.pixel_to_sky(540.0, 960.0);
        let (_, dec1) = wcs.pixel_to_sky(540.0, 961.0);
        assert!(((dec1 - dec0) * 3600.0 - 2.37).abs() < 1e-6);
    }

    #[test]
    fn test_pixel_scale() {
        assert!((seestar_wcs().pixel_scale_arcsec() - 2.37).abs() < 1e-9);
    }

    #[test]
    fn test_ra_is_normalised() {
        let wcs = Wcs::new(
            (1.0, 1.0),
            (0.0, 10.0),
            Matrix2::new(SCALE_DEG, 0.0, 0.0, SCALE_DEG),
        );
        let (ra, _) = wcs.pixel_to_sky(-100.0, 0.0);
        assert!(ra > 359.0 && ra < 360.0);
    }

    #[test]
    fn test_cdelt_rotation_matches_cd() {
        let linear = Wcs::linear_from_cdelt((-SCALE_DEG, SCALE_DEG), 0.0);
        assert!((linear - Matrix2::new(-SCALE_DEG, 0.0, 0.0, SCALE_DEG)).norm() < 1e-15);

        let rotated = Wcs::linear_from_cdelt((SCALE_DEG, SCALE_DEG), 30.0);
        let wcs = Wcs::new((1.0, 1.0), (10.0, 0.0), rotated);
        assert!((wcs.rotation_degrees() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_pc_scaled_by_cdelt() {
        let linear = Wcs::linear_from_pc(Matrix2::identity(), (-SCALE_DEG, SCALE_DEG));
        assert_eq!(linear, Matrix2::new(-SCALE_DEG, 0.0, 0.0, SCALE_DEG));
    }
}
