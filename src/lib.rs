//! # fortune2
//!
//! A fortune cookie jar. Fortune files (text records separated by `%` lines)
//! are ingested into SQLite, one table per jar, and served at random or by id
//! from the command line and over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────────┐
//! │ fortune file │──▶│  ingest  │──▶│   SQLite     │
//! │  a\n%\nb\n%  │   │  parser  │   │ table / jar  │
//! └──────────────┘   └──────────┘   └──────┬───────┘
//!                                          │
//!                                    ┌─────┴─────┐
//!                                    │  select   │  weighted / uniform
//!                                    └─────┬─────┘
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │(fortune2)│       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fortune2 ingest linux.txt science.txt   # jars "linux" and "science"
//! fortune2                                # weighted random fortune
//! fortune2 -ec linux science              # uniform jar choice, show jar
//! fortune2 search -i 'unix' linux
//! fortune2 info
//! fortune2 serve 8000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and store location |
//! | [`db`] | Database connection |
//! | [`store`] | Table-per-jar queries |
//! | [`ingest`] | Fortune file parsing, jar replacement and deletion |
//! | [`select`] | Weighted and uniform random selection |
//! | [`search`] | Regex search |
//! | [`info`] | Per-jar statistics |
//! | [`render`] | Plain, HTML, and JSON output |
//! | [`server`] | HTTP server |

pub mod config;
pub mod db;
pub mod error;
pub mod info;
pub mod ingest;
pub mod models;
pub mod render;
pub mod search;
pub mod select;
pub mod server;
pub mod store;

pub use error::{FortuneError, Result};
