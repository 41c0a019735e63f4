//! Biodiversity API Service Library
//!
//! This crate provides the HTTP server implementation for the EcoLens
//! biodiversity report endpoints.

pub mod common_names;
pub mod config;
pub mod handlers;
pub mod state;
