//! # UI Module
//!
//! Layout of the pitch tuner window.

pub mod main_display;
