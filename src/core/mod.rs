//! # Core Application Logic
//!
//! Sprout's business logic. It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Chat state + reducer │
//!                    │  • Identity FSM + store │
//!                    │  • Catalog model        │
//!                    │  • Configuration        │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  session   │      │    api     │
//!     │  Adapter   │      │ (chat I/O) │      │ (HTTP I/O) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `ChatMessage`, one entry in the conversation
//! - [`state`]: The `App` struct, chat screen state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`identity`]: sign-in state machine, user id validation, remembered user
//! - [`catalog`]: marketplace products, search and number formatting
//! - [`config`]: layered configuration

pub mod action;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod message;
pub mod state;
