//! Identity and cancellation for spawned command attempts.
//!
//! - `TaskId`: which command spawned an attempt, and that attempt's generation
//! - `TaskHandle`: a `TaskId` plus the `CancellationToken` the attempt listens on
//!
//! `StateCtx` keeps the handle of the newest attempt per command type and
//! cancels it when a newer attempt of the same command is spawned.

use std::any::TypeId;

use tokio_util::sync::CancellationToken;

/// Identifier of one command attempt.
///
/// Generations come from a single counter in `StateCtx`, so they are
/// strictly increasing across every command, not just within one type.
///
/// ```ignore
/// let first = TaskId::new(TypeId::of::<GenerateQrCommand>(), 1);
/// let second = TaskId::new(TypeId::of::<GenerateQrCommand>(), 2);
///
/// assert_ne!(first, second);
/// assert!(first.generation() < second.generation());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    command: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(command: TypeId, generation: u64) -> Self {
        Self {
            command,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to a spawned command attempt.
///
/// Cancellation is cooperative: the attempt decides where it listens
/// (`tokio::select!` on `cancelled()`), and anything past that point runs to
/// completion.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}
