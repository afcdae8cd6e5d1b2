//! # Host Bridge Traits
//!
//! Contracts for the collaborators the catalog core needs but does not own.
//!
//! ## Traits
//!
//! - [`Mailer`](notification::Mailer) - Outbound notification after an album is created
//! - [`Clock`](time::Clock) - Time source used to stamp creation/modification times
//!
//! Each trait ships a default implementation (`LogMailer`, `SystemClock`) so
//! the core can run without host wiring.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert transport-specific failures into it with an actionable
//! message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! async tasks.

pub mod error;
pub mod notification;
pub mod time;

pub use error::BridgeError;

pub use notification::{LogMailer, Mailer};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
