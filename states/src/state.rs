use std::any::Any;
use std::fmt::Debug;

/// Plain application state, owned by [`crate::StateCtx`].
///
/// States are mutated on the UI thread through `StateCtx::update` or
/// `StateCtx::state_mut`. Commands never see the live value, only the
/// clone returned by [`State::snapshot`].
pub trait State: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// A `Send` copy handed to commands.
    ///
    /// Returning `None` keeps the state out of command snapshots.
    fn snapshot(&self) -> Option<Box<dyn Any + Send>> {
        None
    }
}
