use std::any::{TypeId, type_name};
use std::collections::BTreeMap;

use flume::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::updater::ComputeUpdate;
use crate::{
    Command, CommandSnapshot, Compute, Error, LatestOnlyUpdater, State, TaskHandle, TaskId,
    Updater,
};

/// Owner of every state, compute and command of one app instance.
///
/// All mutation happens on the thread that owns the context. Commands run
/// as Tokio tasks and talk back through a channel that
/// [`StateCtx::sync_computes`] drains, normally once per frame.
pub struct StateCtx {
    states: BTreeMap<TypeId, Box<dyn State>>,
    computes: BTreeMap<TypeId, Box<dyn Compute>>,
    commands: BTreeMap<TypeId, Box<dyn Command>>,

    // state -> commands re-enqueued when that state is updated
    triggers: BTreeMap<TypeId, Vec<TypeId>>,
    queue: Vec<TypeId>,

    next_generation: u64,
    // compute -> highest generation applied so far
    applied: BTreeMap<TypeId, u64>,
    running: BTreeMap<TypeId, TaskHandle>,
    tasks: JoinSet<()>,

    send: Sender<ComputeUpdate>,
    recv: Receiver<ComputeUpdate>,
}

impl std::fmt::Debug for StateCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCtx")
            .field("states", &self.states.len())
            .field("computes", &self.computes.len())
            .field("commands", &self.commands.len())
            .field("queued", &self.queue.len())
            .field("next_generation", &self.next_generation)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Default for StateCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCtx {
    pub fn new() -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            states: BTreeMap::new(),
            computes: BTreeMap::new(),
            commands: BTreeMap::new(),
            triggers: BTreeMap::new(),
            queue: Vec::new(),
            next_generation: 0,
            applied: BTreeMap::new(),
            running: BTreeMap::new(),
            tasks: JoinSet::new(),
            send,
            recv,
        }
    }

    pub fn add_state<T: State>(&mut self, state: T) {
        self.states.insert(TypeId::of::<T>(), Box::new(state));
    }

    pub fn record_compute<T: Compute>(&mut self, compute: T) {
        self.computes.insert(TypeId::of::<T>(), Box::new(compute));
    }

    pub fn record_command<T: Command>(&mut self, command: T) {
        self.commands.insert(TypeId::of::<T>(), Box::new(command));
    }

    /// Enqueue `C` every time `S` goes through [`StateCtx::update`].
    pub fn trigger_on<S: State, C: Command>(&mut self) {
        let commands = self.triggers.entry(TypeId::of::<S>()).or_default();
        let command = TypeId::of::<C>();
        if !commands.contains(&command) {
            commands.push(command);
        }
    }

    pub fn try_state<T: State>(&self) -> Result<&T, Error> {
        self.states
            .get(&TypeId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
            .ok_or_else(Error::state_not_found::<T>)
    }

    /// # Panics
    /// Panics if `T` was never added; registration happens once at startup.
    pub fn state<T: State>(&self) -> &T {
        match self.try_state::<T>() {
            Ok(state) => state,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutable access that does not fire triggers.
    ///
    /// # Panics
    /// Panics if `T` was never added.
    pub fn state_mut<T: State>(&mut self) -> &mut T {
        match self
            .states
            .get_mut(&TypeId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
        {
            Some(state) => state,
            None => panic!("{}", Error::state_not_found::<T>()),
        }
    }

    /// Mutate a state and enqueue every command triggered by it.
    pub fn update<T: State>(&mut self, f: impl FnOnce(&mut T)) {
        let id = TypeId::of::<T>();
        let Some(state) = self
            .states
            .get_mut(&id)
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
        else {
            log::error!("Cannot update unregistered state {}", type_name::<T>());
            return;
        };
        f(state);

        if let Some(commands) = self.triggers.get(&id) {
            for command in commands {
                if !self.queue.contains(command) {
                    self.queue.push(*command);
                }
            }
        }
    }

    pub fn cached<T: Compute>(&self) -> Option<&T> {
        self.computes
            .get(&TypeId::of::<T>())
            .and_then(|compute| compute.as_any().downcast_ref::<T>())
    }

    /// # Panics
    /// Panics if `T` was never recorded.
    pub fn compute<T: Compute>(&self) -> &T {
        match self.cached::<T>() {
            Some(compute) => compute,
            None => panic!("{}", Error::compute_not_found::<T>()),
        }
    }

    /// Untagged updater, for writes that do not race with command attempts.
    pub fn updater(&self) -> Updater {
        Updater::new(self.send.clone())
    }

    pub fn enqueue_command<T: Command>(&mut self) {
        let id = TypeId::of::<T>();
        if !self.queue.contains(&id) {
            self.queue.push(id);
        }
    }

    pub fn has_queued_commands(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Spawn every queued command on the current Tokio runtime.
    ///
    /// Each attempt takes the next generation number and cancels the token of
    /// the previous attempt of the same command.
    pub fn flush_commands(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let queue = std::mem::take(&mut self.queue);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::error!(
                "No Tokio runtime available, dropping {} queued command(s)",
                queue.len()
            );
            return;
        };

        for id in queue {
            if !self.commands.contains_key(&id) {
                log::warn!("Dropping unregistered command {id:?}");
                continue;
            }

            self.next_generation += 1;
            let generation = self.next_generation;

            if let Some(previous) = self.running.remove(&id) {
                log::debug!(
                    "Cancelling attempt {} in favour of {generation}",
                    previous.id().generation()
                );
                previous.cancel();
            }

            let token = CancellationToken::new();
            let snapshot = self.snapshot();
            let updater = LatestOnlyUpdater::new(self.send.clone(), generation);
            let Some(future) = self
                .commands
                .get(&id)
                .map(|command| command.run(snapshot, updater, token.clone()))
            else {
                continue;
            };

            self.tasks.spawn_on(future, &runtime);
            self.running
                .insert(id, TaskHandle::new(TaskId::new(id, generation), token));
        }
    }

    fn snapshot(&self) -> CommandSnapshot {
        let mut snapshot = CommandSnapshot::new();
        for (id, state) in &self.states {
            if let Some(value) = state.snapshot() {
                snapshot.insert_state(*id, value);
            }
        }
        snapshot
    }

    /// Apply every update sent by commands since the last call.
    pub fn sync_computes(&mut self) {
        while let Some(finished) = self.tasks.try_join_next() {
            if let Err(err) = finished
                && err.is_panic()
            {
                log::error!("Command task panicked: {err}");
            }
        }

        let updates: Vec<ComputeUpdate> = self.recv.try_iter().collect();
        for update in updates {
            self.apply(update);
        }
    }

    fn apply(&mut self, update: ComputeUpdate) {
        if let Some(generation) = update.generation {
            let latest = self.applied.get(&update.compute).copied().unwrap_or(0);
            if generation < latest {
                log::debug!(
                    "Discarding stale update for {} (generation {generation} < {latest})",
                    update.name
                );
                return;
            }
            self.applied.insert(update.compute, generation);
        }

        match self.computes.get_mut(&update.compute) {
            Some(compute) => compute.assign_box(update.value),
            None => log::warn!("Update for unregistered compute {}", update.name),
        }
    }

    /// Number of spawned tasks not yet joined.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_set_mut(&mut self) -> &mut JoinSet<()> {
        &mut self.tasks
    }

    /// The handle of the newest attempt of `T`, if one was spawned.
    pub fn running<T: Command>(&self) -> Option<&TaskHandle> {
        self.running.get(&TypeId::of::<T>())
    }

    fn cancel_all(&mut self) {
        self.queue.clear();
        for handle in self.running.values() {
            handle.cancel();
        }
        self.running.clear();
        self.tasks.abort_all();
    }

    /// Cancel pending work and wait for every task to stop.
    pub async fn shutdown(&mut self) {
        self.cancel_all();
        while self.tasks.join_next().await.is_some() {}
        log::debug!("State context shut down");
    }
}

impl Drop for StateCtx {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
