//! HTTP request handlers

pub mod clients;
pub mod resources;
