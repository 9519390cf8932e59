//! Reactive state container for QR Studio.
//!
//! - [`State`]: plain values owned by the UI thread
//! - [`Compute`]: cached values written only by commands
//! - [`Command`]: async side effects, spawned from a [`CommandSnapshot`]
//! - [`StateCtx`]: owns all of the above and applies command results

mod command;
mod compute;
mod ctx;
mod error;
mod snapshot;
mod state;
mod task;
mod updater;

pub use command::{Command, CommandFuture};
pub use compute::{Compute, assign_impl};
pub use ctx::StateCtx;
pub use error::Error;
pub use snapshot::CommandSnapshot;
pub use state::State;
pub use task::{TaskHandle, TaskId};
pub use updater::{LatestOnlyUpdater, Updater};
