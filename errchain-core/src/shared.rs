//! The shared error handle passed between chains and aggregates.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::chain::ChainError;
use crate::multi::MultiError;

/// Reference-counted handle to any thread-safe error.
///
/// Chain nodes and aggregates store their inner errors as `SharedError`, so
/// the value an aggregate hands back is the very allocation that went in.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Converts an owned error into a [`SharedError`].
///
/// When `err` already is a `SharedError` the handle is reused instead of
/// being wrapped in a second `Arc`, which keeps downcasting and identity
/// comparisons working on the original value. An `Arc<ChainError>` or
/// `Arc<MultiError>` is unpacked the same way; both are handles themselves,
/// so the stored value is still the same node or the same entries.
pub fn share<E>(err: E) -> SharedError
where
    E: StdError + Send + Sync + 'static,
{
    let any = &err as &dyn Any;
    if let Some(shared) = any.downcast_ref::<SharedError>() {
        return Arc::clone(shared);
    }
    if let Some(node) = any.downcast_ref::<Arc<ChainError>>() {
        return Arc::new(ChainError::clone(node));
    }
    if let Some(multi) = any.downcast_ref::<Arc<MultiError>>() {
        return Arc::new(MultiError::clone(multi));
    }
    Arc::new(err)
}

/// Converts a boxed error into a [`SharedError`] without re-boxing it.
#[must_use]
pub fn share_boxed(err: Box<dyn StdError + Send + Sync + 'static>) -> SharedError {
    let err = match err.downcast::<SharedError>() {
        Ok(shared) => return *shared,
        Err(err) => err,
    };
    let err = match err.downcast::<Arc<ChainError>>() {
        Ok(node) => return Arc::new(ChainError::clone(&node)),
        Err(err) => err,
    };
    match err.downcast::<Arc<MultiError>>() {
        Ok(multi) => Arc::new(MultiError::clone(&multi)),
        Err(err) => Arc::from(err),
    }
}

/// Views a shared handle as a plain error trait object.
pub(crate) fn as_dyn<'a>(err: &'a SharedError) -> &'a (dyn StdError + 'static) {
    &**err
}
