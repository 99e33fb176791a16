// src/types.rs
use crate::signal::{Readout, RenderFrame};

// GUI -> engine
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    SelectChannel(String),
    Shutdown,
}

// engine -> GUI
#[derive(Clone, Debug)]
pub enum DashMessage {
    Frame(RenderFrame),
    Readouts(Vec<Readout>),
}
