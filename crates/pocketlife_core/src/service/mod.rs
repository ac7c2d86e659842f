//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record stores into use-case level APIs.
//! - Keep callers decoupled from storage details.
//!
//! Feature services (`note_service`, `budget_service`) own payload edits;
//! `lifecycle_service` owns every transition in and out of the trash.

pub mod budget_service;
pub mod lifecycle_service;
pub mod note_service;
