//! egui rendering: selection panels and chart drawing.

pub mod panels;
pub mod plot;
