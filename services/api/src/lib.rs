//! services/api/src/lib.rs
//!
//! The HTTP service for the CBC Feedback Coach: concrete adapters for the core
//! ports, configuration, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
