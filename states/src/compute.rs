use std::any::{Any, type_name};
use std::fmt::Debug;

/// A cached value that only commands write to.
///
/// The UI reads computes through `StateCtx::cached`; commands replace them
/// wholesale through an updater, and the replacement is applied on the next
/// `StateCtx::sync_computes`.
pub trait Compute: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    /// Replace `self` with a boxed value of the same concrete type.
    fn assign_box(&mut self, new_self: Box<dyn Any + Send>);
}

/// Shared body for [`Compute::assign_box`].
pub fn assign_impl<T: Compute>(target: &mut T, new_self: Box<dyn Any + Send>) {
    match new_self.downcast::<T>() {
        Ok(value) => *target = *value,
        Err(_) => log::warn!(
            "Ignoring update of mismatched type for compute {}",
            type_name::<T>()
        ),
    }
}
