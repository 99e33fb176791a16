// src/main.rs
mod config;
mod engine;
mod gui;
mod signal;
mod types;
use std::sync::mpsc::channel;
use anyhow::{anyhow, Context, Result};
use eframe::egui;
use log::info;
use config::DashboardConfig;
use engine::{ChannelSink, Engine};

fn main() -> Result<()> {
    env_logger::init();
    let config = DashboardConfig::load()?;
    // Configuration errors are fatal here, before any window or timer exists.
    let registry = config.validate().context("invalid dashboard configuration")?;
    let (tx, rx) = channel();
    let worker = Engine::from_config(&config, ChannelSink::new(tx))?;
    let handle = engine::spawn(worker).context("starting engine thread")?;
    info!(
        "dashboard up: {} channels, tick {} ms",
        registry.len(),
        config.tick_interval_ms
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 800.0])
        .with_min_inner_size([960.0, 640.0])
        .with_title("Test Stand Telemetry");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    let default_channel = config.default_channel.clone();
    eframe::run_native(
        "teststand-scope",
        options,
        Box::new(move |_cc| {
            Box::new(gui::DashboardApp::new(handle, registry, default_channel, rx))
        }),
    )
    .map_err(|err| anyhow!("dashboard window failed: {err}"))
}
