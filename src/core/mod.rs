//! # Core Application Logic
//!
//! Verdict's business logic: sessions, messages, the request lifecycle, and
//! the pure derivations the UI shows. It knows nothing about any specific UI
//! technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No UI. I/O via Effect. │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │  Gateway   │
//!     │  Adapter   │ ── SpawnRequest ───────▶ │  (reqwest) │
//!     │ (ratatui)  │ ◀── RequestFinished ──── │            │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`session`]: Session store and its durable storage
//! - [`message`]: Message and payload types
//! - [`attachment`]: Document validation
//! - [`format`]: Result text line classification
//! - [`reveal`]: Progressive character reveal
//! - [`presenter`]: Relative dates and session list rows
//! - [`config`]: Layered configuration

pub mod action;
pub mod attachment;
pub mod config;
pub mod format;
pub mod message;
pub mod presenter;
pub mod reveal;
pub mod session;
pub mod state;
