//! Value and type matching across chains and aggregates.
//!
//! An error "reaches" another when the second is found by following
//! [`source`](std::error::Error::source) links from the first, or, whenever a
//! [`MultiError`] is met on the way, by doing the same from any of its
//! entries. All predicates here are evaluated over that reachable set.

use std::error::Error as StdError;
use std::ptr;

use crate::chain::ChainError;
use crate::multi::MultiError;
use crate::shared::as_dyn;

/// Iterator over an error and its successive `source()`s.
#[derive(Clone)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Iterates `err` followed by each error reachable through shallow unwraps.
#[must_use]
pub fn chain_of<'a>(err: &'a (dyn StdError + 'static)) -> Chain<'a> {
    Chain { next: Some(err) }
}

/// Returns `true` if `predicate` holds for any error reachable from `err`.
///
/// The predicate is the equivalence test; this is the general rule that
/// [`is`] and [`is_same`] specialise.
pub fn matches<F>(err: &(dyn StdError + 'static), predicate: F) -> bool
where
    F: Fn(&(dyn StdError + 'static)) -> bool,
{
    matches_by(err, &predicate)
}

fn matches_by(
    err: &(dyn StdError + 'static),
    predicate: &dyn Fn(&(dyn StdError + 'static)) -> bool,
) -> bool {
    chain_of(err).any(|link| {
        predicate(link)
            || link.downcast_ref::<MultiError>().is_some_and(|multi| {
                multi
                    .errors()
                    .iter()
                    .any(|inner| matches_by(as_dyn(inner), predicate))
            })
    })
}

/// Returns `true` if some error reachable from `err` is a `T` equal to
/// `target`.
///
/// With `T = MultiError` this compares aggregates entry by entry, in order.
pub fn is<T>(err: &(dyn StdError + 'static), target: &T) -> bool
where
    T: StdError + PartialEq + 'static,
{
    matches(err, |candidate| {
        candidate.downcast_ref::<T>().is_some_and(|value| value == target)
    })
}

/// Returns `true` if `target` itself is reachable from `err`.
///
/// For targets known only as trait objects: identity of the value, of the
/// chain node, or entry-wise identity of two aggregates.
pub fn is_same(err: &(dyn StdError + 'static), target: &(dyn StdError + 'static)) -> bool {
    matches(err, |candidate| identical(candidate, target))
}

fn identical(a: &(dyn StdError + 'static), b: &(dyn StdError + 'static)) -> bool {
    if ptr::addr_eq(ptr::from_ref(a), ptr::from_ref(b)) {
        return true;
    }
    if let (Some(x), Some(y)) = (a.downcast_ref::<ChainError>(), b.downcast_ref::<ChainError>()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.downcast_ref::<MultiError>(), b.downcast_ref::<MultiError>()) {
        return x == y;
    }
    false
}

/// First reachable error of type `T`; aggregate entries are searched left to
/// right and the first success wins.
#[must_use]
pub fn as_type<'a, T>(err: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    chain_of(err).find_map(|link| {
        link.downcast_ref::<T>().or_else(|| {
            link.downcast_ref::<MultiError>().and_then(|multi| {
                multi
                    .errors()
                    .iter()
                    .find_map(|inner| as_type::<T>(as_dyn(inner)))
            })
        })
    })
}
