use std::any::{Any, TypeId, type_name};

use flume::Sender;

use crate::Compute;

/// A pending compute replacement travelling back to the UI thread.
pub(crate) struct ComputeUpdate {
    pub(crate) compute: TypeId,
    pub(crate) name: &'static str,
    /// `None` for untagged updates, which are always applied.
    pub(crate) generation: Option<u64>,
    pub(crate) value: Box<dyn Any + Send>,
}

impl ComputeUpdate {
    fn new<T: Compute + Send>(compute: T, generation: Option<u64>) -> Self {
        Self {
            compute: TypeId::of::<T>(),
            name: type_name::<T>(),
            generation,
            value: Box::new(compute),
        }
    }
}

fn send(sender: &Sender<ComputeUpdate>, update: ComputeUpdate) {
    let name = update.name;
    if sender.send(update).is_err() {
        log::debug!("State context is gone, dropping update for {name}");
    }
}

/// Untagged updater: every value it sends is applied.
#[derive(Debug, Clone)]
pub struct Updater {
    send: Sender<ComputeUpdate>,
}

impl Updater {
    pub(crate) fn new(send: Sender<ComputeUpdate>) -> Self {
        Self { send }
    }

    pub fn set<T: Compute + Send>(&self, compute: T) {
        send(&self.send, ComputeUpdate::new(compute, None));
    }
}

/// Updater handed to a command attempt.
///
/// Every value is tagged with the attempt's generation. When the UI thread
/// syncs, a value is dropped if a newer generation has already been applied
/// to the same compute, so a slow attempt cannot overwrite a fresher one.
#[derive(Debug, Clone)]
pub struct LatestOnlyUpdater {
    send: Sender<ComputeUpdate>,
    generation: u64,
}

impl LatestOnlyUpdater {
    pub(crate) fn new(send: Sender<ComputeUpdate>, generation: u64) -> Self {
        Self { send, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set<T: Compute + Send>(&self, compute: T) {
        send(&self.send, ComputeUpdate::new(compute, Some(self.generation)));
    }
}
