//! PNG charts of a drift session.
//!
//! `<prefix>_position.png` holds the sky-coordinate scatter next to the
//! cumulative pixel-offset scatter; `<prefix>_timeline.png` plots drift in
//! pixels against seconds from the start of the session.

pub mod text_render;

use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use imageproc::drawing::{
    draw_cross_mut, draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut,
    draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::session::DriftReport;
use crate::table::FrameRecord;
use crate::utils::min_max;
use text_render::{draw_text, draw_text_centered, draw_text_with_bg, text_width, GLYPH_HEIGHT};

/// Half width of the RA window around the first frame, degrees.
pub const RA_HALF_WINDOW_DEG: f64 = 0.3611;
/// Half height of the Dec window around the first frame, degrees.
pub const DEC_HALF_WINDOW_DEG: f64 = 0.6347;

const POSITION_SIZE: (u32, u32) = (1290, 965);
const TIMELINE_SIZE: (u32, u32) = (1290, 725);
const MARGIN_LEFT: u32 = 110;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 60;
const MARGIN_BOTTOM: u32 = 70;
const TICKS: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const PANEL: Rgb<u8> = Rgb([245, 245, 245]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const RED: Rgb<u8> = Rgb([220, 0, 0]);
const WHEAT: Rgb<u8> = Rgb([245, 222, 179]);

/// Files written by [`render_charts`].
#[derive(Debug, Clone)]
pub struct ChartFiles {
    pub position: PathBuf,
    pub timeline: PathBuf,
}

/// Linear mapping from a data window onto a rectangle of the image.
///
/// `x_range` may be descending, which draws the axis increasing to the left.
#[derive(Debug, Clone, Copy)]
struct Panel {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Panel {
    fn new(left: u32, top: u32, width: u32, height: u32, x: (f64, f64), y: (f64, f64)) -> Self {
        Self {
            left,
            top,
            width,
            height,
            x_range: widen(x),
            y_range: widen(y),
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let fx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let fy = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        (
            self.left as f32 + (fx * self.width as f64) as f32,
            (self.top + self.height) as f32 - (fy * self.height as f64) as f32,
        )
    }

    fn contains(&self, (px, py): (f32, f32)) -> bool {
        px >= self.left as f32
            && px <= (self.left + self.width) as f32
            && py >= self.top as f32
            && py <= (self.top + self.height) as f32
    }

    fn draw_frame(&self, img: &mut RgbImage) {
        draw_filled_rect_mut(
            img,
            Rect::at(self.left as i32, self.top as i32).of_size(self.width, self.height),
            PANEL,
        );
        draw_hollow_rect_mut(
            img,
            Rect::at(self.left as i32, self.top as i32).of_size(self.width + 1, self.height + 1),
            AXIS,
        );
    }

    fn draw_ticks(&self, img: &mut RgbImage, x_decimals: usize, y_decimals: usize) {
        let bottom = self.top + self.height;
        for i in 0..=TICKS {
            let t = i as f64 / TICKS as f64;

            let x_value = self.x_range.0 + t * (self.x_range.1 - self.x_range.0);
            let px = self.left + (t * self.width as f64) as u32;
            draw_line_segment_mut(
                img,
                (px as f32, bottom as f32),
                (px as f32, bottom as f32 + 6.0),
                AXIS,
            );
            draw_text_centered(img, px, bottom + 10, &format!("{:.*}", x_decimals, x_value), AXIS, 1);

            let y_value = self.y_range.0 + t * (self.y_range.1 - self.y_range.0);
            let py = bottom - (t * self.height as f64) as u32;
            draw_line_segment_mut(
                img,
                (self.left as f32 - 6.0, py as f32),
                (self.left as f32, py as f32),
                AXIS,
            );
            let label = format!("{:.*}", y_decimals, y_value);
            let x = self.left.saturating_sub(10 + text_width(&label, 1));
            draw_text(img, x, py.saturating_sub(GLYPH_HEIGHT / 2), &label, AXIS, 1);
        }
    }

    fn draw_labels(&self, img: &mut RgbImage, title: &str, x_label: &str, y_label: &str) {
        let center_x = self.left + self.width / 2;
        draw_text_centered(img, center_x, self.top.saturating_sub(28), title, AXIS, 2);
        draw_text_centered(img, center_x, self.top + self.height + 32, x_label, AXIS, 2);
        draw_text(img, self.left.saturating_sub(100), self.top.saturating_sub(12), y_label, AXIS, 1);
    }
}

/// Give a degenerate range some extent so that a single point still plots.
fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if (hi - lo).abs() > f64::EPSILON {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn chart_title(kind: &str, report: &DriftReport) -> String {
    let summary = &report.summary;
    match &summary.session_date {
        Some(date) => format!("{} - {} - {}", kind, summary.object_name, date),
        None => format!("{} - {}", kind, summary.object_name),
    }
}

fn draw_position_chart(report: &DriftReport) -> RgbImage {
    let (width, height) = POSITION_SIZE;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let records = report.table.records();

    let panel_width = width / 2 - MARGIN_LEFT - MARGIN_RIGHT;
    let panel_height = height - MARGIN_TOP - MARGIN_BOTTOM;

    // Sky panel: fixed window around the first frame, RA increasing leftwards.
    let (ra0, dec0) = records
        .first()
        .map(|r| (r.ra_deg, r.dec_deg))
        .unwrap_or((0.0, 0.0));
    let sky = Panel::new(
        MARGIN_LEFT,
        MARGIN_TOP,
        panel_width,
        panel_height,
        (ra0 + RA_HALF_WINDOW_DEG, ra0 - RA_HALF_WINDOW_DEG),
        (dec0 - DEC_HALF_WINDOW_DEG, dec0 + DEC_HALF_WINDOW_DEG),
    );
    sky.draw_frame(&mut img);
    sky.draw_ticks(&mut img, 2, 2);
    for record in records {
        let (px, py) = sky.to_pixel(record.ra_deg, record.dec_deg);
        draw_filled_circle_mut(&mut img, (px as i32, py as i32), 2, BLUE);
    }
    sky.draw_labels(
        &mut img,
        &chart_title("Image center wandering", report),
        "RA (deg)",
        "Dec (deg)",
    );
    draw_text_with_bg(
        &mut img,
        sky.left + 8,
        sky.top + 8,
        &format!("RA width = {:.1} arc min", 2.0 * RA_HALF_WINDOW_DEG * 60.0),
        AXIS,
        WHEAT,
        1,
    );
    draw_text_with_bg(
        &mut img,
        sky.left + 8,
        sky.top + 26,
        &format!("Dec height = {:.1} arc min", 2.0 * DEC_HALF_WINDOW_DEG * 60.0),
        AXIS,
        WHEAT,
        1,
    );

    // Pixel panel: cumulative offsets, axes spanning the data.
    let x_range = min_max(records.iter().map(|r| r.cumulative.ra_pixels));
    let y_range = min_max(records.iter().map(|r| r.cumulative.dec_pixels));
    let pixels = Panel::new(
        width / 2 + MARGIN_LEFT,
        MARGIN_TOP,
        panel_width,
        panel_height,
        x_range,
        y_range,
    );
    pixels.draw_frame(&mut img);
    pixels.draw_ticks(&mut img, 1, 1);
    for record in records {
        let point = pixels.to_pixel(record.cumulative.ra_pixels, record.cumulative.dec_pixels);
        draw_hollow_circle_mut(&mut img, (point.0 as i32, point.1 as i32), 4, RED);
    }
    pixels.draw_labels(
        &mut img,
        &chart_title("Pixel center wandering", report),
        "X (pixels)",
        "Y (pixels)",
    );
    draw_text_with_bg(
        &mut img,
        pixels.left + 8,
        pixels.top + 8,
        &format!("Pixel X width = {:.1}", x_range.1 - x_range.0),
        AXIS,
        WHEAT,
        1,
    );
    draw_text_with_bg(
        &mut img,
        pixels.left + 8,
        pixels.top + 26,
        &format!("Pixel Y height = {:.1}", y_range.1 - y_range.0),
        AXIS,
        WHEAT,
        1,
    );

    img
}

fn draw_timeline_chart(report: &DriftReport) -> RgbImage {
    let (width, height) = TIMELINE_SIZE;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let records = report.table.records();

    let time_range = min_max(records.iter().map(|r| r.elapsed_seconds));
    let (_, drift_max) = min_max(
        records
            .iter()
            .flat_map(|r| [r.cumulative.total_pixels, r.step.total_pixels]),
    );
    let panel = Panel::new(
        MARGIN_LEFT,
        MARGIN_TOP,
        width - MARGIN_LEFT - MARGIN_RIGHT,
        height - MARGIN_TOP - MARGIN_BOTTOM,
        time_range,
        (0.0, drift_max.max(0.0) * 1.05),
    );
    panel.draw_frame(&mut img);
    panel.draw_ticks(&mut img, 0, 1);

    let cumulative: Vec<_> = records
        .iter()
        .map(|r| panel.to_pixel(r.elapsed_seconds, r.cumulative.total_pixels))
        .collect();
    for pair in cumulative.windows(2) {
        draw_line_segment_mut(&mut img, pair[0], pair[1], RED);
    }
    for &(px, py) in &cumulative {
        draw_cross_mut(&mut img, RED, px as i32, py as i32);
    }
    for record in records {
        let point = panel.to_pixel(record.elapsed_seconds, record.step.total_pixels);
        if panel.contains(point) {
            draw_filled_circle_mut(&mut img, (point.0 as i32, point.1 as i32), 4, RED);
        }
    }

    let title = chart_title("Movement in time in pixels", report);
    panel.draw_labels(&mut img, &title, "Seconds from start", "Wandering (pixels)");

    draw_filled_circle_mut(&mut img, (panel.left as i32 + 16, panel.top as i32 + 16), 4, RED);
    draw_text(&mut img, panel.left + 28, panel.top + 12, "From previous point", AXIS, 1);
    draw_cross_mut(&mut img, RED, panel.left as i32 + 16, panel.top as i32 + 32);
    draw_text(&mut img, panel.left + 28, panel.top + 28, "From start", AXIS, 1);

    img
}

fn write_png(img: &RgbImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(img, img.width(), img.height(), ColorType::Rgb8.into())
        .with_context(|| format!("Failed to write PNG image to {}", path.display()))?;

    Ok(())
}

/// Render both charts into `dir` as `<prefix>_position.png` and
/// `<prefix>_timeline.png`.
pub fn render_charts(report: &DriftReport, dir: &Path, prefix: &str) -> Result<ChartFiles> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;

    let files = ChartFiles {
        position: dir.join(format!("{}_position.png", prefix)),
        timeline: dir.join(format!("{}_timeline.png", prefix)),
    };

    write_png(&draw_position_chart(report), &files.position)?;
    debug!("Wrote {}", files.position.display());
    write_png(&draw_timeline_chart(report), &files.timeline)?;
    debug!("Wrote {}", files.timeline.display());

    Ok(files)
}

/// Frames whose RA or Dec differs from the first frame by more than the sky
/// window half-width, useful to warn that the position chart clips them.
pub fn frames_outside_sky_window(records: &[FrameRecord]) -> usize {
    let Some(first) = records.first() else {
        return 0;
    };
    records
        .iter()
        .filter(|r| {
            (r.ra_deg - first.ra_deg).abs() > RA_HALF_WINDOW_DEG
                || (r.dec_deg - first.dec_deg).abs() > DEC_HALF_WINDOW_DEG
        })
        .count()
}
