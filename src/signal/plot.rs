use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::signal::error::TelemetryError;
use crate::signal::pipeline::RenderFrame;
use crate::signal::sink::RenderSink;
/// Sample offset between the axes of the phase view.
pub const PHASE_LAG: usize = 6;
/// Phase (self-correlation) view: pairs `(s[i], s[i + lag])`.
pub fn phase_portrait(signal: &[f32], lag: usize) -> Vec<(f32, f32)> {
    signal
        .iter()
        .zip(signal.iter().skip(lag))
        .map(|(a, b)| (*a, *b))
        .collect()
}
/// Maps a `[0, 1]` intensity onto the spectrogram palette.
pub fn heat_rgb(value: f32) -> (u8, u8, u8) {
    let v = value.clamp(0.0, 1.0);
    (
        (20.0 + v * 235.0) as u8,
        (20.0 + v * 180.0) as u8,
        (60.0 + (1.0 - v) * 90.0) as u8,
    )
}
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
    pub accent: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            background: RGBColor(10, 10, 10),
            trace: CYAN,
            accent: YELLOW,
        }
    }
}
type Pane<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
/// Rasterizes the four chart views of `frame` into a PNG (2x2 grid).
pub fn render_frame_png(frame: &RenderFrame, style: &PlotStyle) -> Result<Vec<u8>, TelemetryError> {
    if frame.signal.is_empty() || frame.trend.is_empty() {
        return Err(TelemetryError::Plot("render frame has no samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let panes = root.split_evenly((2, 2));
        draw_trend(&panes[0], frame, style)?;
        draw_spectrum(&panes[1], frame, style)?;
        draw_phase(&panes[2], frame, style)?;
        draw_spectrogram(&panes[3], frame)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_trend(area: &Pane<'_>, frame: &RenderFrame, style: &PlotStyle) -> Result<(), TelemetryError> {
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(0f32..frame.trend.len() as f32, 0f32..1f32)?;
    let series = frame.trend.iter().enumerate().map(|(i, v)| (i as f32, *v));
    chart.draw_series(LineSeries::new(series, &style.trace))?;
    Ok(())
}
fn draw_spectrum(
    area: &Pane<'_>,
    frame: &RenderFrame,
    style: &PlotStyle,
) -> Result<(), TelemetryError> {
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(0f32..frame.spectrum.len().max(1) as f32, 0f32..1f32)?;
    chart.draw_series(frame.spectrum.iter().enumerate().map(|(k, m)| {
        let x = k as f32;
        Rectangle::new([(x + 0.1, 0.0), (x + 0.9, *m)], style.trace.filled())
    }))?;
    Ok(())
}
fn draw_phase(area: &Pane<'_>, frame: &RenderFrame, style: &PlotStyle) -> Result<(), TelemetryError> {
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(-1f32..1f32, -1f32..1f32)?;
    let points = phase_portrait(&frame.signal, PHASE_LAG);
    chart.draw_series(
        points
            .iter()
            .map(|p| Circle::new(*p, 2, style.accent.filled())),
    )?;
    Ok(())
}
fn draw_spectrogram(area: &Pane<'_>, frame: &RenderFrame) -> Result<(), TelemetryError> {
    let grid = frame.spectrogram_grid();
    let (rows, cols) = grid.dim();
    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d(0f32..cols.max(1) as f32, 0f32..rows.max(1) as f32)?;
    chart.draw_series(grid.indexed_iter().map(|((r, c), v)| {
        let (red, green, blue) = heat_rgb(*v);
        let (x, y) = (c as f32, r as f32);
        Rectangle::new(
            [(x, y), (x + 1.0, y + 1.0)],
            RGBColor(red, green, blue).filled(),
        )
    }))?;
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TelemetryError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| TelemetryError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
/// Headless renderer that keeps the most recent frame as PNG bytes.
#[derive(Debug, Default)]
pub struct PngSnapshotSink {
    style: PlotStyle,
    latest: Option<Vec<u8>>,
    frames: usize,
}
impl PngSnapshotSink {
    pub fn new(style: PlotStyle) -> Self {
        Self {
            style,
            latest: None,
            frames: 0,
        }
    }
    pub fn latest_png(&self) -> Option<&[u8]> {
        self.latest.as_deref()
    }
    pub fn frames_rendered(&self) -> usize {
        self.frames
    }
}
impl RenderSink for PngSnapshotSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), TelemetryError> {
        self.latest = Some(render_frame_png(frame, &self.style)?);
        self.frames += 1;
        Ok(())
    }
}
