//! # bakery-api
//!
//! HTTP API layer for the Sweet Paradise storefront backend.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Postgres order store (`sqlx`)
//! - SMTP order notifications (`lettre`)
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/orders` | Place an order |
//! | GET | `/api/v1/orders` | Look orders up by phone, email or id |
//! | GET/POST/PUT/PATCH | `/api/v1/admin?action=` | Admin panel |
//! | POST | `/api/v1/payments` | Create a hosted payment |
//! | GET | `/api/v1/payments?payment_id=` | Poll a payment |

pub mod handlers;
pub mod mail;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
