// src/gui.rs
use std::sync::mpsc::Receiver;
use std::time::Duration;
use eframe::egui;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Vec2};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints, Points};
use log::{info, warn};
use crate::engine::EngineHandle;
use crate::signal::buffer::SPECTROGRAM_COLUMNS;
use crate::signal::plot::{heat_rgb, PlotStyle, PngSnapshotSink};
use crate::signal::{
    phase_portrait, ChannelRegistry, Readout, RenderFrame, RenderSink, TelemetryError, PHASE_LAG,
};
use crate::types::DashMessage;

const TRACE: Color32 = Color32::from_rgb(0, 255, 255);
const ACCENT: Color32 = Color32::from_rgb(255, 200, 0);
const PANEL_BG: Color32 = Color32::from_rgb(10, 10, 15);
const REPAINT_EVERY: Duration = Duration::from_millis(100);

pub struct DashboardApp {
    // Declared first: must stop before anything it renders into is released.
    engine: EngineHandle,
    registry: ChannelRegistry,
    selected: String,
    readouts: Vec<Readout>,
    frame: Option<RenderFrame>,
    log_messages: Vec<String>,
    snapshots: PngSnapshotSink,
    rx: Receiver<DashMessage>,
}

impl DashboardApp {
    pub fn new(
        engine: EngineHandle,
        registry: ChannelRegistry,
        default_channel: String,
        rx: Receiver<DashMessage>,
    ) -> Self {
        Self {
            engine,
            registry,
            selected: default_channel,
            readouts: Vec::new(),
            frame: None,
            log_messages: vec!["Dashboard ready.".to_owned()],
            snapshots: PngSnapshotSink::new(PlotStyle::default()),
            rx,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 {
            self.log_messages.remove(0);
        }
    }

    fn display_name(&self, id: &str) -> String {
        self.registry
            .lookup(id)
            .map(|channel| self.registry.spec(channel).display_name().to_owned())
            .unwrap_or_else(|_| id.to_owned())
    }

    /// Rasterizes the current frame into a PNG in the working directory.
    fn save_snapshot(&mut self) -> Result<String, TelemetryError> {
        let Some(frame) = &self.frame else {
            return Err(TelemetryError::Plot("no frame to save yet".into()));
        };
        let path = format!("teststand-{}-{}.png", frame.channel, frame.phase_tick);
        self.snapshots.present(frame)?;
        let png = self
            .snapshots
            .latest_png()
            .ok_or_else(|| TelemetryError::Plot("snapshot was not rendered".into()))?;
        std::fs::write(&path, png)
            .map_err(|err| TelemetryError::Plot(format!("writing {path}: {err}")))?;
        Ok(path)
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                DashMessage::Frame(frame) => self.frame = Some(frame),
                DashMessage::Readouts(readouts) => self.readouts = readouts,
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading("Test Stand Telemetry");
        ui.separator();
        for readout in &self.readouts {
            ui.monospace(&readout.text);
        }
        ui.separator();
        let previous = self.selected.clone();
        let current = self.display_name(&self.selected);
        let series: Vec<(String, String)> = self
            .registry
            .selectable_series()
            .map(|(_, spec)| (spec.id().to_owned(), spec.display_name().to_owned()))
            .collect();
        egui::ComboBox::from_label("Chart")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (id, name) in series {
                    ui.selectable_value(&mut self.selected, id, name);
                }
            });
        if self.selected != previous {
            self.engine.select_channel(&self.selected);
            let name = self.display_name(&self.selected);
            self.log(&format!("Charting {name}"));
        }
        if ui.button("Save PNG").clicked() {
            match self.save_snapshot() {
                Ok(path) => {
                    info!("snapshot written to {path}");
                    let count = self.snapshots.frames_rendered();
                    self.log(&format!("Saved {path} ({count} this session)"));
                }
                Err(err) => {
                    warn!("snapshot failed: {err}");
                    self.log(&format!("Snapshot failed: {err}"));
                }
            }
        }
        ui.add_space(10.0);
        egui::ScrollArea::vertical().max_height(120.0).show(ui, |ui| {
            for m in &self.log_messages {
                ui.monospace(m);
            }
        });
    }

    fn chart_panel(&self, ui: &mut egui::Ui) {
        let Some(frame) = &self.frame else {
            ui.label("Waiting for first tick...");
            return;
        };
        if let Ok(channel) = self.registry.lookup(&frame.channel) {
            let spec = self.registry.spec(channel);
            ui.label(
                egui::RichText::new(spec.format_readout(frame.latest_raw))
                    .strong()
                    .color(TRACE),
            );
        }
        let width = (ui.available_width() - 16.0) / 2.0;
        let height = (ui.available_height() - 60.0) / 2.0;
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label("TREND");
                trend_plot(ui, frame, width, height);
            });
            ui.vertical(|ui| {
                ui.label("SPECTRUM");
                spectrum_plot(ui, frame, width, height);
            });
        });
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label("PHASE");
                phase_plot(ui, frame, width, height);
            });
            ui.vertical(|ui| {
                ui.label("SPECTROGRAM");
                spectrogram_view(ui, frame, width, height);
            });
        });
    }
}

fn trend_plot(ui: &mut egui::Ui, frame: &RenderFrame, width: f32, height: f32) {
    let points: Vec<[f64; 2]> = frame
        .trend
        .iter()
        .enumerate()
        .map(|(i, v)| [i as f64, *v as f64])
        .collect();
    Plot::new("trend_plot")
        .width(width)
        .height(height)
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::new(points)).color(TRACE).name("trend"));
        });
}

fn spectrum_plot(ui: &mut egui::Ui, frame: &RenderFrame, width: f32, height: f32) {
    let bars: Vec<Bar> = frame
        .spectrum
        .iter()
        .enumerate()
        .map(|(k, m)| Bar::new(k as f64, *m as f64).width(0.8))
        .collect();
    Plot::new("spectrum_plot")
        .width(width)
        .height(height)
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(TRACE).name("magnitude"));
        });
}

fn phase_plot(ui: &mut egui::Ui, frame: &RenderFrame, width: f32, height: f32) {
    let points: Vec<[f64; 2]> = phase_portrait(&frame.signal, PHASE_LAG)
        .into_iter()
        .map(|(a, b)| [a as f64, b as f64])
        .collect();
    Plot::new("phase_plot")
        .width(width)
        .height(height)
        .data_aspect(1.0)
        .include_x(-1.0)
        .include_x(1.0)
        .include_y(-1.0)
        .include_y(1.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(PlotPoints::new(points)).radius(2.0).color(ACCENT));
        });
}

fn spectrogram_view(ui: &mut egui::Ui, frame: &RenderFrame, width: f32, height: f32) {
    let (response, painter) = ui.allocate_painter(Vec2::new(width, height), Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, Rounding::same(0.0), PANEL_BG);
    let grid = frame.spectrogram_grid();
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return;
    }
    let cell = Vec2::new(
        rect.width() / SPECTROGRAM_COLUMNS as f32,
        rect.height() / rows as f32,
    );
    // Newest column hugs the right edge; low frequencies at the bottom.
    let left = rect.right() - cols as f32 * cell.x;
    for ((r, c), value) in grid.indexed_iter() {
        let (red, green, blue) = heat_rgb(*value);
        let min = Pos2::new(
            left + c as f32 * cell.x,
            rect.bottom() - (r + 1) as f32 * cell.y,
        );
        painter.rect_filled(
            Rect::from_min_size(min, cell),
            Rounding::same(0.0),
            Color32::from_rgb(red, green, blue),
        );
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        ctx.request_repaint_after(REPAINT_EVERY);

        let mut visuals = egui::Visuals::dark();
        visuals.widgets.noninteractive.bg_fill = PANEL_BG;
        ctx.set_visuals(visuals);

        egui::SidePanel::left("readouts")
            .min_width(240.0)
            .show(ctx, |ui| self.side_panel(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.chart_panel(ui));
    }
}

impl Drop for DashboardApp {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}
