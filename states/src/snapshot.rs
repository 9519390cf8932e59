use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use crate::{Error, State};

/// Cloned states taken when a command is spawned.
///
/// Commands run off the UI thread, so they only ever read this copy.
#[derive(Default)]
pub struct CommandSnapshot {
    states: BTreeMap<TypeId, Box<dyn Any + Send>>,
}

impl std::fmt::Debug for CommandSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSnapshot")
            .field("states", &self.states.len())
            .finish()
    }
}

impl CommandSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_state(&mut self, id: TypeId, value: Box<dyn Any + Send>) {
        self.states.insert(id, value);
    }

    pub fn state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or_else(Error::state_not_found::<T>)
    }
}
