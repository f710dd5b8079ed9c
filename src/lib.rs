//! # Goal Tracker Backend
//!
//! Multi-tenant goal tracking backend.
//!
//! This crate provides a Rust backend for a goal tracking application: personal
//! and team goals, categories, custom status labels, team invitations, file
//! attachments and in-app notifications. The backend exposes a REST API via
//! Axum for a web frontend.
//!
//! ## Features
//!
//! - **Accounts**: Registration and bearer-token sessions
//! - **Goals**: CRUD with visibility levels and team assignment
//! - **Teams**: Nested teams, roles, invitations with shareable codes
//! - **Organization**: Per-user categories and per-user/per-team status labels
//! - **Notifications**: Fan-out on team events, read tracking
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Domain entities and input types shared across layers
//! - [`auth`]: Registration, session tokens, and request authentication
//! - [`db`]: Database operations, repository pattern, and persistence layer
//! - [`services`]: High-level business logic and access control
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]
//! ## Backends
//!
//! Storage is selected at compile time: an in-memory repository for tests and
//! local development, or PostgreSQL via Diesel for production. Both implement
//! the same repository traits, so the service layer is backend-agnostic.

pub mod api;

pub mod auth;

pub mod db;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
