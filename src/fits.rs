use anyhow::{Context, Result};
use fitrs::{Fits, HeaderValue};
use nalgebra::Matrix2;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DriftError;
use crate::session::Exposure;
use crate::utils::exposure_identifier;
use crate::wcs::Wcs;

/// Keywords read from the primary HDU. Anything else in the header is ignored.
const KEYWORDS: &[&str] = &[
    "OBJECT", "RA", "DEC", "DATE-OBS", "CTYPE1", "CTYPE2", "CRPIX1", "CRPIX2", "CRVAL1",
    "CRVAL2", "CD1_1", "CD1_2", "CD2_1", "CD2_2", "PC1_1", "PC1_2", "PC2_1", "PC2_2", "CDELT1",
    "CDELT2", "CROTA2", "NAXIS1", "NAXIS2", "EXPTIME", "FILTER", "TELESCOP", "INSTRUME",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeywordValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Logical(bool),
}

impl KeywordValue {
    fn from_fitrs(value: &HeaderValue) -> Option<Self> {
        match value {
            HeaderValue::CharacterString(s) => Some(KeywordValue::Text(s.trim().to_string())),
            HeaderValue::IntegerNumber(n) => Some(KeywordValue::Integer(*n as i64)),
            HeaderValue::RealFloatingNumber(f) => Some(KeywordValue::Real(*f)),
            HeaderValue::Logical(b) => Some(KeywordValue::Logical(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KeywordValue::Real(f) => Some(*f),
            KeywordValue::Integer(n) => Some(*n as f64),
            KeywordValue::Text(s) => s.trim().parse().ok(),
            KeywordValue::Logical(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            KeywordValue::Text(s) => s.clone(),
            KeywordValue::Integer(n) => n.to_string(),
            KeywordValue::Real(f) => f.to_string(),
            KeywordValue::Logical(b) => (if *b { "T" } else { "F" }).to_string(),
        }
    }
}

/// The subset of a primary header needed to locate an exposure on the sky.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FitsHeader {
    pub keywords: HashMap<String, KeywordValue>,
}

impl FitsHeader {
    /// Read the primary HDU header using fitrs
    pub fn from_file(path: &Path) -> Result<Self> {
        let fits = Fits::open(path)
            .with_context(|| format!("Failed to open FITS file: {}", path.display()))?;

        let hdu = fits
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("No primary HDU found in {}", path.display()))?;

        let keywords = KEYWORDS
            .iter()
            .filter_map(|&key| {
                hdu.value(key)
                    .and_then(KeywordValue::from_fitrs)
                    .map(|value| (key.to_string(), value))
            })
            .collect();

        Ok(Self { keywords })
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, KeywordValue)>,
        K: Into<String>,
    {
        Self {
            keywords: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&KeywordValue> {
        self.keywords.get(key)
    }

    pub fn text(&self, exposure: &str, key: &str) -> Result<String, DriftError> {
        let value = self
            .get(key)
            .ok_or_else(|| DriftError::missing_keyword(exposure, key))?
            .as_text();
        if value.is_empty() {
            return Err(DriftError::malformed_keyword(exposure, key, "empty value"));
        }
        Ok(value)
    }

    pub fn real(&self, exposure: &str, key: &str) -> Result<f64, DriftError> {
        let value = self
            .get(key)
            .ok_or_else(|| DriftError::missing_keyword(exposure, key))?;
        value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                DriftError::malformed_keyword(exposure, key, format!("not a number: {}", value.as_text()))
            })
    }

    fn optional_real(&self, exposure: &str, key: &str) -> Result<Option<f64>, DriftError> {
        match self.get(key) {
            Some(_) => self.real(exposure, key).map(Some),
            None => Ok(None),
        }
    }

    /// Assemble the TAN solution from CD, PC + CDELT, or CDELT + CROTA2.
    pub fn wcs(&self, exposure: &str) -> Result<Wcs, DriftError> {
        for key in ["CTYPE1", "CTYPE2"] {
            if let Some(ctype) = self.get(key) {
                let ctype = ctype.as_text();
                if !ctype.contains("-TAN") {
                    return Err(DriftError::malformed_keyword(
                        exposure,
                        key,
                        format!("unsupported projection {}", ctype),
                    ));
                }
            }
        }

        let crpix = (self.real(exposure, "CRPIX1")?, self.real(exposure, "CRPIX2")?);
        let crval = (self.real(exposure, "CRVAL1")?, self.real(exposure, "CRVAL2")?);

        let has_cd = ["CD1_1", "CD1_2", "CD2_1", "CD2_2"]
            .iter()
            .any(|key| self.get(key).is_some());

        let linear = if has_cd {
            Matrix2::new(
                self.optional_real(exposure, "CD1_1")?.unwrap_or(0.0),
                self.optional_real(exposure, "CD1_2")?.unwrap_or(0.0),
                self.optional_real(exposure, "CD2_1")?.unwrap_or(0.0),
                self.optional_real(exposure, "CD2_2")?.unwrap_or(0.0),
            )
        } else {
            let cdelt = (self.real(exposure, "CDELT1")?, self.real(exposure, "CDELT2")?);
            if self.get("PC1_1").is_some() || self.get("PC2_2").is_some() {
                let pc = Matrix2::new(
                    self.optional_real(exposure, "PC1_1")?.unwrap_or(1.0),
                    self.optional_real(exposure, "PC1_2")?.unwrap_or(0.0),
                    self.optional_real(exposure, "PC2_1")?.unwrap_or(0.0),
                    self.optional_real(exposure, "PC2_2")?.unwrap_or(1.0),
                );
                Wcs::linear_from_pc(pc, cdelt)
            } else {
                let crota2 = self.optional_real(exposure, "CROTA2")?.unwrap_or(0.0);
                Wcs::linear_from_cdelt(cdelt, crota2)
            }
        };

        if linear.determinant().abs() < f64::EPSILON * f64::EPSILON {
            return Err(DriftError::malformed_keyword(
                exposure,
                "CD1_1",
                "singular pixel-to-sky matrix",
            ));
        }

        Ok(Wcs::new(crpix, crval, linear))
    }

    /// Turn this header into an [`Exposure`] sampled at `reference_pixel`.
    pub fn to_exposure(
        &self,
        identifier: &str,
        reference_pixel: (f64, f64),
    ) -> Result<Exposure, DriftError> {
        let object_name = self.text(identifier, "OBJECT")?;
        let target_ra_deg = self.real(identifier, "RA")?;
        let target_dec_deg = self.real(identifier, "DEC")?;
        let date_obs = self.text(identifier, "DATE-OBS")?;

        let wcs = self.wcs(identifier)?;
        let (ra_deg, dec_deg) = wcs.pixel_to_sky(reference_pixel.0, reference_pixel.1);

        Ok(Exposure {
            identifier: identifier.to_string(),
            object_name,
            ra_deg,
            dec_deg,
            date_obs,
            target_ra_deg,
            target_dec_deg,
        })
    }
}

/// Read one exposure from disk.
pub fn read_exposure(path: &Path, reference_pixel: (f64, f64)) -> Result<Exposure> {
    let identifier = exposure_identifier(path);
    let header = FitsHeader::from_file(path)?;
    let exposure = header.to_exposure(&identifier, reference_pixel)?;

    debug!(
        "{}: RA {:.5} Dec {:.5} at pixel ({}, {}), DATE-OBS {}",
        identifier,
        exposure.ra_deg,
        exposure.dec_deg,
        reference_pixel.0,
        reference_pixel.1,
        exposure.date_obs
    );

    Ok(exposure)
}

/// Expand the command line inputs into an ordered list of FITS files.
///
/// Files are kept in the order given. A directory contributes its FITS files
/// (recursively) sorted by file name.
pub fn collect_exposure_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_file() {
            paths.push(input.clone());
        } else if input.is_dir() {
            let mut found = Vec::new();
            find_fits_files(input, &mut found)?;
            found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            debug!("{}: {} FITS files", input.display(), found.len());
            paths.extend(found);
        } else {
            return Err(anyhow::anyhow!(
                "Path does not exist or is not accessible: {}",
                input.display()
            ));
        }
    }

    Ok(paths)
}

fn find_fits_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();

        if path.is_dir() {
            find_fits_files(&path, files)?;
        } else if is_fits_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

pub fn is_fits_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            ext_lower == "fits" || ext_lower == "fit" || ext_lower == "fts"
        })
        .unwrap_or(false)
}
