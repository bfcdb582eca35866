//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the operations transport layers call.
//! - Keep transport layers decoupled from storage details and store errors.

pub mod catalog_service;
