use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::coordinates::{format_sexagesimal, format_sexagesimal_hours};
use crate::fits::{FitsHeader, KeywordValue};
use crate::utils::exposure_identifier;

#[derive(Debug, Serialize)]
struct InspectOutput<'a> {
    identifier: String,
    object: String,
    date_obs: String,
    reference_pixel: (f64, f64),
    ra_deg: f64,
    dec_deg: f64,
    ra_hms: String,
    dec_dms: String,
    target_ra_deg: f64,
    target_dec_deg: f64,
    pixel_scale_arcsec: f64,
    rotation_deg: f64,
    keywords: &'a std::collections::HashMap<String, KeywordValue>,
}

/// Print the reference pixel position and the WCS of one exposure.
pub fn inspect(path: &Path, reference_pixel: (f64, f64), format: &str) -> Result<()> {
    let identifier = exposure_identifier(path);
    let header = FitsHeader::from_file(path)?;
    let exposure = header.to_exposure(&identifier, reference_pixel)?;
    let wcs = header.wcs(&identifier)?;

    let output = InspectOutput {
        identifier,
        object: exposure.object_name.clone(),
        date_obs: exposure.date_obs.clone(),
        reference_pixel,
        ra_deg: exposure.ra_deg,
        dec_deg: exposure.dec_deg,
        ra_hms: format_sexagesimal_hours(exposure.ra_deg),
        dec_dms: format_sexagesimal(exposure.dec_deg),
        target_ra_deg: exposure.target_ra_deg,
        target_dec_deg: exposure.target_dec_deg,
        pixel_scale_arcsec: wcs.pixel_scale_arcsec(),
        rotation_deg: wcs.rotation_degrees(),
        keywords: &header.keywords,
    };

    match format.to_lowercase().as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&output)?),
        _ => print!("{}", format_inspect(&output)),
    }

    Ok(())
}

fn format_inspect(output: &InspectOutput) -> String {
    let mut text = String::new();

    text.push_str(&format!("FITS File: {}\n", output.identifier));
    text.push_str(&format!("  Object: {}\n", output.object));
    text.push_str(&format!("  Date: {}\n", output.date_obs));
    text.push_str(&format!(
        "  Pointing (RA/DEC keywords): {:.5} / {:.5}\n",
        output.target_ra_deg, output.target_dec_deg
    ));
    text.push_str(&format!(
        "\nReference pixel ({}, {}):\n",
        output.reference_pixel.0, output.reference_pixel.1
    ));
    text.push_str(&format!(
        "  RA:  {:.5} deg  ({})\n",
        output.ra_deg, output.ra_hms
    ));
    text.push_str(&format!(
        "  Dec: {:.5} deg  ({})\n",
        output.dec_deg, output.dec_dms
    ));
    text.push_str(&format!(
        "\nPlate scale: {:.3}\"/px, rotation {:.2} deg\n",
        output.pixel_scale_arcsec, output.rotation_deg
    ));

    let mut sorted_keys: Vec<_> = output.keywords.iter().collect();
    sorted_keys.sort_by_key(|&(k, _)| k);
    text.push_str("\nKeywords:\n");
    for (key, value) in sorted_keys {
        text.push_str(&format!("  {:<16} = {}\n", key, value.as_text()));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_inspect() {
        let mut keywords = HashMap::new();
        keywords.insert("OBJECT".to_string(), KeywordValue::Text("M 42".to_string()));
        keywords.insert("CRPIX1".to_string(), KeywordValue::Real(541.0));

        let output = InspectOutput {
            identifier: "Light_M42_0001".to_string(),
            object: "M 42".to_string(),
            date_obs: "2024-03-14T21:13:23.1".to_string(),
            reference_pixel: (540.0, 960.0),
            ra_deg: 83.8221,
            dec_deg: -5.391,
            ra_hms: "05:35:17".to_string(),
            dec_dms: "-05:23:27".to_string(),
            target_ra_deg: 83.82,
            target_dec_deg: -5.39,
            pixel_scale_arcsec: 2.37,
            rotation_deg: 0.0,
            keywords: &keywords,
        };

        let text = format_inspect(&output);
        assert!(text.contains("FITS File: Light_M42_0001"));
        assert!(text.contains("RA:  83.82210 deg  (05:35:17)"));
        assert!(text.contains("Dec: -5.39100 deg  (-05:23:27)"));
        assert!(text.contains("Plate scale: 2.370\"/px"));
        // keywords are listed alphabetically
        let crpix = text.find("CRPIX1").unwrap();
        let object = text.find("OBJECT  ").unwrap();
        assert!(crpix < object);
    }

    #[test]
    fn test_inspect_missing_file() {
        assert!(inspect(Path::new("/nonexistent/frame.fit"), (540.0, 960.0), "text").is_err());
    }
}
