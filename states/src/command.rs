use std::any::Any;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::{CommandSnapshot, LatestOnlyUpdater};

pub type CommandFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A unit of side-effecting work (timers, IO, encoding).
///
/// Commands are the only place allowed to do async work. They read a
/// [`CommandSnapshot`], report progress through the updater, and should
/// watch `cancel` at their suspension points. Spawning a new attempt of the
/// same command cancels the previous attempt's token.
pub trait Command: Any + Debug {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture;
}
