//! # Teambase
//!
//! A SQLite-backed team knowledge base for small collaborating teams.
//!
//! One database holds everything the team knows: the bug tracker, the
//! changelog, learnings and decisions, tasks, a code documentation index
//! with a call graph, and an append-only coordination board. On top of the
//! plain CRUD sits the enforcement layer: work sessions that gate a bug's
//! path to review on a recorded root cause, fix summary, and changed files,
//! with test paths protected from modification during fixes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────┐
//! │  CLI (tb)    │──▶│  Enforcement  │──▶│  SQLite   │
//! │ clap derive  │   │ session/board │   │  (sqlx)   │
//! └──────────────┘   └───────────────┘   └──────────┘
//!                            │
//!                     typed vocabularies
//!                    + config roster/areas
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration: roster, areas, protected paths |
//! | [`vocab`] | Closed vocabularies (statuses, priorities, message types) |
//! | [`models`] | Row types shared across commands |
//! | [`migrate`] | Idempotent schema creation |
//! | [`bugs`] | Bug tracker CRUD and links to code docs |
//! | [`board`] | Append-only board with auto-routing and claim gating |
//! | [`session`] | Enforced work sessions (the workflow core) |
//! | [`docs`] | Code documentation index |
//! | [`calls`] | Call graph queries and trees |
//! | [`history`] | Changelog |
//! | [`learn`] | Learnings |
//! | [`decisions`] | Decision log |
//! | [`tasks`] | Task tracking |
//! | [`docs_index`] | Documentation index over the docs directory |
//! | [`curriculum`] | Normalized curriculum tables and import |
//! | [`stats`] | Database overview |

pub mod board;
pub mod bugs;
pub mod calls;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod decisions;
pub mod docs;
pub mod docs_index;
pub mod history;
pub mod learn;
pub mod migrate;
pub mod models;
pub mod render;
pub mod session;
pub mod stats;
pub mod tasks;
pub mod vocab;
