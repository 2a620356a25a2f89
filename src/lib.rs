//! # Beacon Library
//!
//! Core of the Beacon wellbeing survey service: score mapping, risk
//! classification, dashboard aggregation, persistence, SMS delivery and the
//! HTTP surface.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod demo;
pub mod error;
pub mod export;
pub mod handlers;
pub mod links;
pub mod models;
pub mod repositories;
pub mod risk;
pub mod scoring;
pub mod server;
pub mod sms;
pub mod telemetry;
pub use migration;
