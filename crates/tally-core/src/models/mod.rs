//! Data models for extracted tables and configuration.

pub mod config;
pub mod table;
