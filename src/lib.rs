//! # tandem-rs
//!
//! Memory data engine for a couples' shared journal.
//!
//! Takes raw event and task records plus raw place-search coordinates and
//! derives consistent views from them: a reverse-chronological timeline,
//! month calendars, a month-sectioned photo gallery, frequency stats and
//! debounced text search. Task mutations are applied locally first and
//! reconciled with the backend, with a full reload on failure.
//!
//! Records live in Postgres (sqlx), photos in a directory-backed object store.

pub mod backend;
pub mod category;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod geo;
pub mod model;
pub mod place;
pub mod search;
pub mod stats;
pub mod storage;
pub mod telemetry;
pub mod timeline;
