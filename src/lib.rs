//! AyurSutra — dosha assessment chat service.

pub mod assessment;
pub mod chat;
pub mod config;
pub mod error;
pub mod intent;
pub mod report;
