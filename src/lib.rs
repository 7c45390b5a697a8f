//! # Course Discovery
//!
//! Merges an in-house course catalog with third-party catalogs and serves
//! fuzzy, ranked, paginated search over the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ┌─────────────────────────┐
//! │ SQLite store │  │ edX / fCC / Udemy / ... │
//! │  or dataset  │  │  (aggregator + cache)   │
//! └──────┬───────┘  └────────────┬────────────┘
//!        └────────────┬──────────┘
//!                     ▼
//!        merge ─▶ filter ─▶ fuzzy ─▶ score ─▶ page
//!                     │
//!           ┌─────────┴─────────┐
//!           ▼                   ▼
//!      ┌──────────┐       ┌──────────┐
//!      │   CLI    │       │   HTTP   │
//!      │(courses) │       │  (axum)  │
//!      └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! courses init                  # create database
//! courses seed                  # load the static dataset into the store
//! courses sync                  # refresh external catalogs
//! courses search "machine learning" --free
//! courses serve                 # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite course store and cache backend |
//! | [`dataset`] | Bundled static dataset |
//! | [`resolver`] | Primary store with dataset fallback |
//! | [`traits`] | Provider trait and registry |
//! | [`aggregate`] | Concurrent provider fetch |
//! | [`cache`] | External result cache with TTL |
//! | [`service`] | The wired pipeline |
//! | [`server`] | HTTP API |
//!
//! Ranking itself (merge, fuzzy index, scoring, pagination) lives in the
//! `course-discovery-core` crate.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod db;
pub mod get;
pub mod http;
pub mod migrate;
pub mod provider_coursera;
pub mod provider_edx;
pub mod provider_fcc;
pub mod provider_udemy;
pub mod resolver;
pub mod search;
pub mod server;
pub mod service;
pub mod sources;
pub mod sqlite_store;
pub mod sync;
pub mod traits;
