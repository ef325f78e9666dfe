//! Convene event-management kernel.
//!
//! Conference, session, speaker, and profile RPC backed by PostgreSQL, with
//! a compiled filter-query pipeline, transactional seat reservation, session
//! wishlists, and cached derived values.

pub mod cache;
pub mod config;
pub mod db;
pub mod derived;
pub mod error;
pub mod models;
pub mod query;
pub mod reservation;
pub mod routes;
pub mod state;
pub mod wishlist;
