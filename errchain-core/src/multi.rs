//! Aggregation of independent errors into a single error value.
//!
//! [`Aggregator`] is the mutable builder; [`MultiError`] is the immutable
//! error it produces when it holds two or more errors.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::chain::ChainError;
use crate::matching::{self, chain_of};
use crate::shared::{as_dyn, share, share_boxed, SharedError};

/// Collects errors, dropping absent ones and flattening aggregates.
///
/// An entry that is itself a [`MultiError`] is spliced in place, keeping its
/// order. An aggregate hidden behind a wrap is kept as one opaque entry.
///
/// Reading the result with [`err`](Self::err) does not consume the builder;
/// later additions change what the next read produces. Appends take
/// `&mut self`, so one writer at a time.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    errors: Vec<SharedError>,
    comparators: Vec<Option<Comparator>>,
}

/// Value equality for one concrete entry type, recorded when an entry is added
/// with [`Aggregator::add_comparable`].
#[derive(Clone, Copy)]
struct Comparator(fn(&(dyn StdError + 'static), &(dyn StdError + 'static)) -> bool);

impl Comparator {
    fn of<E>() -> Self
    where
        E: StdError + PartialEq + 'static,
    {
        Self(|a: &(dyn StdError + 'static), b: &(dyn StdError + 'static)| {
            match (a.downcast_ref::<E>(), b.downcast_ref::<E>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator")
    }
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one error.
    ///
    /// When two aggregates are compared, an entry added this way matches its
    /// counterpart only if both are the same value or chain node.
    pub fn add<E>(&mut self, err: E) -> &mut Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.push(share(err), None);
        self
    }

    /// Adds one error whose type has value equality.
    ///
    /// When two aggregates are compared, this entry also matches a separately
    /// built entry of the same type that compares equal with `==`.
    pub fn add_comparable<E>(&mut self, err: E) -> &mut Self
    where
        E: StdError + PartialEq + Send + Sync + 'static,
    {
        self.push(share(err), Some(Comparator::of::<E>()));
        self
    }

    /// Adds `err` if present; `None` is "no error" and is dropped.
    pub fn add_opt<E>(&mut self, err: Option<E>) -> &mut Self
    where
        E: StdError + Send + Sync + 'static,
    {
        if let Some(err) = err {
            self.add(err);
        }
        self
    }

    /// Adds a boxed error.
    pub fn add_boxed(&mut self, err: Box<dyn StdError + Send + Sync + 'static>) -> &mut Self {
        self.push(share_boxed(err), None);
        self
    }

    fn push(&mut self, err: SharedError, comparator: Option<Comparator>) {
        match err.downcast_ref::<MultiError>() {
            Some(multi) => {
                self.errors.extend(multi.errors.iter().cloned());
                self.comparators.extend(multi.comparators.iter().copied());
            }
            None => {
                self.errors.push(err);
                self.comparators.push(comparator);
            }
        }
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The collected errors as one value.
    ///
    /// `None` when empty, the sole error's own handle when there is exactly
    /// one, a [`MultiError`] over all of them otherwise.
    #[must_use]
    pub fn err(&self) -> Option<SharedError> {
        match self.errors.as_slice() {
            [] => None,
            [only] => Some(Arc::clone(only)),
            _ => Some(Arc::new(MultiError {
                errors: self.errors.clone(),
                comparators: self.comparators.clone(),
            })),
        }
    }
}

impl<E> Extend<Option<E>> for Aggregator
where
    E: StdError + Send + Sync + 'static,
{
    fn extend<I: IntoIterator<Item = Option<E>>>(&mut self, iter: I) {
        for err in iter {
            self.add_opt(err);
        }
    }
}

impl<E> FromIterator<Option<E>> for Aggregator
where
    E: StdError + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = Option<E>>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}

/// Two or more errors reported together.
///
/// Renders as `N errors: e1; e2; ...; eN`. Never contains another
/// `MultiError` as a direct entry.
#[derive(Clone)]
pub struct MultiError {
    errors: Vec<SharedError>,
    // One per entry, same order as `errors`.
    comparators: Vec<Option<Comparator>>,
}

impl MultiError {
    /// The contained errors, in insertion order.
    #[must_use]
    pub fn errors(&self) -> &[SharedError] {
        &self.errors
    }

    /// Number of direct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always `false`: an aggregate has at least two entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Combines several aggregates into one, entries in order.
    ///
    /// Returns `None` when given no aggregates.
    pub fn merge<'a, I>(multis: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a MultiError>,
    {
        let mut merged = Self {
            errors: Vec::new(),
            comparators: Vec::new(),
        };
        for multi in multis {
            merged.errors.extend(multi.errors.iter().cloned());
            merged.comparators.extend(multi.comparators.iter().copied());
        }
        if merged.errors.is_empty() {
            return None;
        }
        Some(merged)
    }

    /// See [`matching::is`].
    pub fn is<T>(&self, target: &T) -> bool
    where
        T: StdError + PartialEq + 'static,
    {
        matching::is(self, target)
    }

    /// See [`matching::as_type`].
    #[must_use]
    pub fn as_type<T>(&self) -> Option<&T>
    where
        T: StdError + 'static,
    {
        matching::as_type(self)
    }

    /// Counts entries matching `target`, descending into nested aggregates.
    ///
    /// An entry that resolves to an aggregate through any number of wraps
    /// contributes that aggregate's count; any other entry counts once if it
    /// matches.
    pub fn count<T>(&self, target: &T) -> usize
    where
        T: StdError + PartialEq + 'static,
    {
        self.errors
            .iter()
            .map(|err| {
                let err = as_dyn(err);
                match as_multi(err) {
                    Some(nested) => nested.count(target),
                    None => usize::from(matching::is(err, target)),
                }
            })
            .sum()
    }

    /// Display adaptor for [`pretty_print`](Self::pretty_print).
    #[must_use]
    pub fn pretty(&self) -> Pretty<'_> {
        Pretty(self)
    }

    /// Writes a human-oriented rendering where nested aggregates, even behind
    /// wraps, appear as parenthesised groups instead of flattened text.
    ///
    /// # Errors
    /// Propagates errors from the writer.
    pub fn pretty_print<W>(&self, w: &mut W) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
    {
        write!(w, "{} errors: ", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                w.write_str("; ")?;
            }
            let err = as_dyn(err);
            match nested_with_prefix(err) {
                Some((prefix, nested)) => {
                    w.write_char('(')?;
                    w.write_str(&prefix)?;
                    nested.pretty_print(w)?;
                    w.write_char(')')?;
                }
                None => write!(w, "{err}")?,
            }
        }
        Ok(())
    }
}

/// Resolves `err` to the aggregate it wraps, along with the messages of the
/// chain nodes in between (`"a: b: "`). The prefix is dropped when a foreign
/// error sits between them, since its own message cannot be told apart from
/// the aggregate's.
fn nested_with_prefix<'a>(err: &'a (dyn StdError + 'static)) -> Option<(String, &'a MultiError)> {
    let mut prefix = String::new();
    let mut labelled = true;
    for link in chain_of(err) {
        if let Some(multi) = link.downcast_ref::<MultiError>() {
            if !labelled {
                prefix.clear();
            }
            return Some((prefix, multi));
        }
        match link.downcast_ref::<ChainError>() {
            Some(node) => {
                prefix.push_str(node.message());
                prefix.push_str(": ");
            }
            None => labelled = false,
        }
    }
    None
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors: ", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.errors.iter()).finish()
    }
}

impl StdError for MultiError {}

/// Ordered, entry-wise equality. A pair matches when the left entry reaches
/// the right one by identity, or when either entry was added with
/// [`Aggregator::add_comparable`] and the two compare equal by value.
impl PartialEq for MultiError {
    fn eq(&self, other: &Self) -> bool {
        let left = self.errors.iter().zip(&self.comparators);
        let right = other.errors.iter().zip(&other.comparators);
        self.errors.len() == other.errors.len()
            && left.zip(right).all(|((a, a_eq), (b, b_eq))| {
                let (a, b) = (as_dyn(a), as_dyn(b));
                matching::is_same(a, b)
                    || a_eq.is_some_and(|Comparator(eq)| eq(a, b))
                    || b_eq.is_some_and(|Comparator(eq)| eq(a, b))
            })
    }
}

/// Displays a [`MultiError`] via [`MultiError::pretty_print`].
pub struct Pretty<'a>(&'a MultiError);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.pretty_print(f)
    }
}

/// The outermost aggregate reachable from `err` through shallow unwraps.
#[must_use]
pub fn as_multi<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a MultiError> {
    chain_of(err).find_map(|link| link.downcast_ref::<MultiError>())
}
