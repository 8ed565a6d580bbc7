use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::session::DriftReport;
use crate::table::{FrameRow, SessionSummary};
use crate::utils::truncate_string;

pub const DEFAULT_CSV_FILE: &str = "object_coordinates.csv";

pub const CSV_HEADER: &str = "Observation file,time,dtime,RA_desim,DEC_desim,RA_sexad,DEC_sexad,RA_sexah,DEC_sexah,Xtot,Ytot,Pixel total,X,Y,Pixel single";

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(row: &FrameRow) -> String {
    format!(
        "{},{:.1},{:.1},{:.5},{:.5},{},{},{},{},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1}",
        escape_csv(&row.identifier),
        row.elapsed_seconds,
        row.delta_seconds,
        row.ra_deg,
        row.dec_deg,
        row.ra_sexagesimal_deg,
        row.dec_sexagesimal_deg,
        row.ra_sexagesimal_hour,
        row.dec_sexagesimal_hour,
        row.cumulative_ra_pixels,
        row.cumulative_dec_pixels,
        row.cumulative_total_pixels,
        row.step_ra_pixels,
        row.step_dec_pixels,
        row.step_total_pixels,
    )
}

pub fn write_csv<W: Write>(writer: &mut W, rows: &[FrameRow]) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for row in rows {
        writeln!(writer, "{}", csv_line(row))?;
    }
    Ok(())
}

pub fn write_csv_file(path: &Path, rows: &[FrameRow]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_csv(&mut writer, rows)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

pub fn to_json(report: &DriftReport) -> Result<String> {
    let json = serde_json::json!({
        "summary": report.summary,
        "frames": report.table.rows(),
    });
    Ok(serde_json::to_string_pretty(&json)?)
}

pub fn format_table(rows: &[FrameRow]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<32} {:>8} {:>6} {:>11} {:>10} {:>10} {:>10} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7}\n",
        "Observation file", "time", "dtime", "RA", "Dec", "RA (h)", "Dec", "Xtot", "Ytot",
        "Total", "X", "Y", "Single"
    ));
    output.push_str(&format!("{:-<140}\n", ""));

    for row in rows {
        output.push_str(&format!(
            "{:<32} {:>8.1} {:>6.1} {:>11.5} {:>10.5} {:>10} {:>10} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1} {:>7.1}\n",
            truncate_string(&row.identifier, 32),
            row.elapsed_seconds,
            row.delta_seconds,
            row.ra_deg,
            row.dec_deg,
            row.ra_sexagesimal_hour,
            row.dec_sexagesimal_deg,
            row.cumulative_ra_pixels,
            row.cumulative_dec_pixels,
            row.cumulative_total_pixels,
            row.step_ra_pixels,
            row.step_dec_pixels,
            row.step_total_pixels,
        ));
    }

    output
}

pub fn format_summary(summary: &SessionSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "RA dispersion:  {:.2} arc min\n",
        summary.ra_dispersion_arcmin
    ));
    output.push_str(&format!(
        "DEC dispersion: {:.2} arc min\n",
        summary.dec_dispersion_arcmin
    ));
    output.push_str(&format!(
        "Frames: {} over {:.1}s, max drift {:.1}px from start, {:.1}px frame to frame\n",
        summary.frame_count,
        summary.total_elapsed_seconds,
        summary.max_cumulative_pixels,
        summary.max_step_pixels
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::PLATE_SCALE_ARCSEC_PER_PIXEL;
    use crate::session::{aggregate_session, Exposure};

    fn report() -> DriftReport {
        let frames = [
            ("f0", 10.0, 20.0, "2024-03-14T00:00:00.0"),
            ("f1", 10.0005, 20.0003, "2024-03-14T00:00:10.0"),
            ("f,2", 10.0002, 20.0001, "2024-03-14T00:00:25.0"),
        ];
        let exposures: Vec<_> = frames
            .iter()
            .map(|(id, ra, dec, date)| Exposure {
                identifier: id.to_string(),
                object_name: "M 42".to_string(),
                ra_deg: *ra,
                dec_deg: *dec,
                date_obs: date.to_string(),
                target_ra_deg: 10.0,
                target_dec_deg: 20.0,
            })
            .collect();
        aggregate_session(&exposures, PLATE_SCALE_ARCSEC_PER_PIXEL).unwrap()
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_rows_in_order() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &report().table.rows()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "f0,0.0,0.0,10.00000,20.00000,10:00:00,20:00:00,00:40:00,20:00:00,0.0,0.0,0.0,0.0,0.0,0.0"
        );
        assert!(lines[2].starts_with("f1,10.0,10.0,10.00050,20.00030,"));
        assert!(lines[2].ends_with(",-0.8,0.5,0.9,-0.8,0.5,0.9"));
        assert!(lines[3].starts_with("\"f,2\",25.0,15.0,"));
    }

    #[test]
    fn test_json_has_summary_and_frames() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&report()).unwrap()).unwrap();
        assert_eq!(json["frames"].as_array().unwrap().len(), 3);
        assert_eq!(json["summary"]["frame_count"], 3);
        assert_eq!(json["frames"][1]["cumulative_ra_pixels"], -0.8);
    }

    #[test]
    fn test_table_and_summary_text() {
        let report = report();
        let table = format_table(&report.table.rows());
        assert_eq!(table.lines().count(), 5);
        assert!(table.contains("f1"));

        let summary = format_summary(&report.summary);
        assert!(summary.contains("RA dispersion:  0.03 arc min"));
        assert!(summary.contains("DEC dispersion: 0.02 arc min"));
    }
}
