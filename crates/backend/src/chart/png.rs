use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use common::chart::ChartDescription;
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;

const FONT: &str = "sans-serif";
const LABEL_FONT_SIZE: f64 = 15.0;
const DESC_FONT_SIZE: f64 = 20.0;
const X_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Chart generation error: {0}")]
    ChartGeneration(String),
    #[error("Invalid image size: {0}x{1}")]
    InvalidSize(u32, u32),
    #[error("Value range too wide to plot: {0} to {1}")]
    ValueRange(f64, f64),
}

/// 折れ線グラフを PNG にする
pub fn render(desc: &ChartDescription, (width, height): (u32, u32)) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSize(width, height).into());
    }
    let value_range = padded_value_range(desc.value_bounds())?;
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    draw(desc, value_range, &mut buf, (width, height))?;

    let image = RgbImage::from_raw(width, height, buf)
        .ok_or(RenderError::InvalidSize(width, height))?;
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}

fn draw(
    desc: &ChartDescription,
    value_range: Range<f64>,
    buf: &mut [u8],
    size: (u32, u32),
) -> Result<()> {
    let root = BitMapBackend::with_buffer(buf, size).into_drawing_area();

    root.fill(&WHITE)
        .map_err(|e| RenderError::ChartGeneration(format!("Failed to fill background: {}", e)))?;

    let time_range = padded_time_range(desc);

    let mut chart = ChartBuilder::on(&root)
        .caption(desc.title(), (FONT, DESC_FONT_SIZE).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(time_range, value_range)
        .map_err(|e| RenderError::ChartGeneration(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_desc(desc.x_label())
        .y_desc(desc.y_label())
        .label_style((FONT, LABEL_FONT_SIZE).into_font())
        .axis_desc_style((FONT, DESC_FONT_SIZE).into_font())
        .x_label_formatter(&|x| x.format(X_LABEL_FORMAT).to_string())
        .draw()
        .map_err(|e| RenderError::ChartGeneration(format!("Failed to configure mesh: {}", e)))?;

    chart
        .draw_series(LineSeries::new(
            desc.points().iter().map(|p| (p.time.and_utc(), p.value)),
            &BLUE,
        ))
        .map_err(|e| RenderError::ChartGeneration(format!("Failed to draw series: {}", e)))?;

    root.present()
        .map_err(|e| RenderError::ChartGeneration(format!("Failed to present chart: {}", e)))?;
    Ok(())
}

/// 1点だけの系列でも幅を持たせる
fn padded_time_range(desc: &ChartDescription) -> Range<DateTime<Utc>> {
    let bounds = desc.time_bounds();
    let (start, end) = (bounds.start.and_utc(), bounds.end.and_utc());
    if start == end {
        (start - Duration::minutes(1))..(end + Duration::minutes(1))
    } else {
        start..end
    }
}

/// 上下に 5% の余白
///
/// 幅が f64 で表せない場合は目盛りを計算できないのでエラー。
fn padded_value_range((min, max): (f64, f64)) -> Result<Range<f64>, RenderError> {
    // max - min は溢れうるので半分ずつ引く
    let half_span = max / 2.0 - min / 2.0;
    let pad = if half_span.abs() < f64::EPSILON {
        if min.abs() < f64::EPSILON {
            1.0
        } else {
            min.abs() * 0.05
        }
    } else {
        half_span * 0.1
    };
    let (lower, upper) = (min - pad, max + pad);
    if !(upper - lower).is_finite() {
        return Err(RenderError::ValueRange(min, max));
    }
    Ok(lower..upper)
}
