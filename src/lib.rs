//! Local data layer for tracking TV shows and watched episodes.
//!
//! Shows and episodes live in a SQLite store ([`db::Database`]) addressed by
//! content URIs ([`address`]). Mutations are broadcast on a change channel
//! ([`notify`]) so derived views such as per-show episode counts
//! ([`aggregate`]) and the filtered show list ([`shows_list`]) recompute
//! when the data under them moves.

pub mod address;
pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod db;
pub mod filter;
pub mod interface;
pub mod models;
pub mod notify;
pub mod schema;
pub mod shows_list;
