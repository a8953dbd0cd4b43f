// WhatsUp - in-memory social platform core

// Data model - entity records and denormalized views
pub mod models;

// Entity Store - keyed in-memory storage with ID allocation
pub mod store;

// Repository Service - query/mutation operations over the store
pub mod repository;

// Realtime Fan-out - per-user channels for live message delivery
pub mod realtime;

// AI Responder - chat stub with completion backend and canned fallback
pub mod responder;

// Request layer - HTTP API, sessions, application state
pub mod api;
pub mod app_state;
pub mod session;

// Common utilities
pub mod config;
pub mod error;
pub mod seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};
