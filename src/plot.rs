//! Volume chart renderer
//!
//! One bar chart per event: relative position on the x-axis, volume on the
//! y-axis, a dashed marker at the anchor day. Rows without a volume are left
//! as gaps with a small cross on the baseline so they never read as zero.

use crate::data::Event;
use crate::error::{AnalysisError, Result};
use crate::join::EventActivity;
use crate::window::EventFailure;
use image::{ImageError, Rgb, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Common color definitions
pub mod colors {
    use image::Rgb;

    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const GRAY: Rgb<u8> = Rgb([150, 150, 150]);
    /// Blue at 60% opacity over white
    pub const BAR_BLUE: Rgb<u8> = Rgb([102, 102, 255]);
    pub const RED: Rgb<u8> = Rgb([220, 20, 20]);
}

/// Chart geometry
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub background: Rgb<u8>,
    pub bar_color: Rgb<u8>,
    pub marker_color: Rgb<u8>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            margin: 40,
            background: colors::WHITE,
            bar_color: colors::BAR_BLUE,
            marker_color: colors::RED,
        }
    }
}

/// Outcome of a plotting pass
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<EventFailure>,
}

impl RenderSummary {
    pub fn succeeded(&self) -> usize {
        self.rendered.len()
    }
}

fn draw_filled_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let (img_width, img_height) = img.dimensions();
    for py in y..(y + height).min(img_height) {
        for px in x..(x + width).min(img_width) {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_horizontal_line(img: &mut RgbImage, y: u32, x1: u32, x2: u32, color: Rgb<u8>) {
    let (start, end) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    if y < img.height() {
        for x in start..=end.min(img.width() - 1) {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_vertical_line(img: &mut RgbImage, x: u32, y1: u32, y2: u32, color: Rgb<u8>) {
    let (start, end) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    if x < img.width() {
        for y in start..=end.min(img.height() - 1) {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_dashed_vertical_line(img: &mut RgbImage, x: u32, y1: u32, y2: u32, thickness: u32, color: Rgb<u8>) {
    const DASH: u32 = 8;
    for y in y1..y2 {
        if (y - y1) / DASH % 2 == 0 {
            for dx in 0..thickness {
                if x + dx < img.width() && y < img.height() {
                    img.put_pixel(x + dx, y, color);
                }
            }
        }
    }
}

fn draw_cross(img: &mut RgbImage, cx: u32, cy: u32, size: u32, color: Rgb<u8>) {
    for d in 0..=size * 2 {
        let x = (cx + d).saturating_sub(size);
        let down = (cy + d).saturating_sub(size);
        let up = (cy + size).saturating_sub(d);
        if x < img.width() {
            if down < img.height() {
                img.put_pixel(x, down, color);
            }
            if up < img.height() {
                img.put_pixel(x, up, color);
            }
        }
    }
}

fn image_error(path: &Path, err: ImageError) -> AnalysisError {
    match err {
        ImageError::IoError(e) => AnalysisError::output_write(path, e),
        other => AnalysisError::output_write(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        ),
    }
}

/// Renders per-event volume charts into `<output_dir>/images/`
#[derive(Debug, Clone)]
pub struct ActivityVisualizer {
    image_dir: PathBuf,
    config: ChartConfig,
}

impl ActivityVisualizer {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            image_dir: output_dir.as_ref().join("images"),
            config: ChartConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ChartConfig) -> Self {
        self.config = config;
        self
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// `<output_dir>/images/<securityId>_<YYYY-MM-DD>.png`
    pub fn image_path(&self, event: &Event) -> PathBuf {
        self.image_dir.join(format!("{}.png", event.file_stem()))
    }

    /// Draw the chart for one event
    pub fn draw(&self, activity: &EventActivity) -> RgbImage {
        let cfg = &self.config;
        let mut img = RgbImage::from_pixel(cfg.width, cfg.height, cfg.background);

        let left = cfg.margin;
        let right = cfg.width.saturating_sub(cfg.margin / 2);
        let top = cfg.margin / 2;
        let baseline = cfg.height.saturating_sub(cfg.margin);

        // Axes
        draw_horizontal_line(&mut img, baseline, left, right, colors::BLACK);
        draw_vertical_line(&mut img, left, top, baseline, colors::BLACK);

        let n = activity.rows.len();
        if n == 0 || right <= left || baseline <= top {
            return img;
        }

        let max_volume = activity
            .rows
            .iter()
            .filter_map(|r| r.volume)
            .fold(0.0, f64::max);
        let scale = if max_volume > 0.0 { max_volume } else { 1.0 };

        let plot_width = (right - left) as f64;
        let plot_height = (baseline - top) as f64;
        let slot = plot_width / n as f64;
        let bar_width = ((slot * 0.8) as u32).max(1);

        for (i, row) in activity.rows.iter().enumerate() {
            let center = left as f64 + slot * (i as f64 + 0.5);
            let x = (center - bar_width as f64 / 2.0).max(left as f64 + 1.0) as u32;

            match row.volume {
                Some(volume) => {
                    let height = ((volume.max(0.0) / scale) * plot_height) as u32;
                    if height > 0 {
                        draw_filled_rect(&mut img, x, baseline - height, bar_width, height, cfg.bar_color);
                    }
                }
                None => {
                    let marker_y = baseline.saturating_sub(8);
                    draw_cross(&mut img, center as u32, marker_y, 5, colors::GRAY);
                }
            }

            if row.relative_position == 0 {
                let x = (center as u32).saturating_sub(1);
                draw_dashed_vertical_line(&mut img, x, top, baseline, 3, cfg.marker_color);
            }
        }

        img
    }

    /// Render and save one event's chart
    pub fn render(&self, activity: &EventActivity) -> Result<PathBuf> {
        let path = self.image_path(&activity.event);
        let img = self.draw(activity);
        img.save(&path).map_err(|e| image_error(&path, e))?;
        Ok(path)
    }

    /// Render every event; a failed chart is recorded and the pass continues
    pub fn render_all(&self, activities: &[EventActivity]) -> Result<RenderSummary> {
        std::fs::create_dir_all(&self.image_dir)
            .map_err(|e| AnalysisError::output_write(&self.image_dir, e))?;

        let pb = ProgressBar::new(activities.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Plotting volume");

        let mut summary = RenderSummary::default();
        for activity in activities {
            match self.render(activity) {
                Ok(path) => summary.rendered.push(path),
                Err(error) => {
                    warn!("Failed to plot {}: {}", activity.event, error);
                    summary.failed.push(EventFailure {
                        event: activity.event,
                        error,
                    });
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            "Plotted {} events, {} failed",
            summary.succeeded(),
            summary.failed.len()
        );
        Ok(summary)
    }
}
