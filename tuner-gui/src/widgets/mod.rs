//! # Widgets Module
//!
//! Canvas widgets used by the main display.

pub mod plot;
