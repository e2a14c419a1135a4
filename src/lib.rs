//! rhoboto - A Discord bot that collects team and shift registrations into Google Sheets.
//!
//! This crate provides a Discord bot implementation with features including:
//! - Per-channel feature toggles
//! - Team registration with a summary worksheet
//! - Shift registration into entry, draft and final schedule worksheets

pub mod bot;
pub mod config;
pub mod database;
pub mod error;
pub mod feature;
pub mod logging;
pub mod register;
pub mod service;
pub mod sheets;
