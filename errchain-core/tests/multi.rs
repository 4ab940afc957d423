use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use errchain_core::{as_multi, as_type, is, is_same, wrap, Aggregator, MultiError, SharedError};

#[derive(Debug, Clone, PartialEq)]
struct Custom(&'static str);

impl fmt::Display for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "custom: {}", self.0)
    }
}

impl StdError for Custom {}

#[derive(Debug, Clone, PartialEq)]
struct Other;

impl fmt::Display for Other {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("other")
    }
}

impl StdError for Other {}

#[derive(Debug, Clone, PartialEq)]
struct Unused;

impl fmt::Display for Unused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unused")
    }
}

impl StdError for Unused {}

fn result(agg: &Aggregator) -> SharedError {
    match agg.err() {
        Some(err) => err,
        None => panic!("expected an error from {agg:?}"),
    }
}

fn multi_of(err: &SharedError) -> &MultiError {
    match as_multi(&**err) {
        Some(multi) => multi,
        None => panic!("expected an aggregate, got {err}"),
    }
}

#[test]
fn absent_errors_produce_no_error() {
    assert!(Aggregator::new().err().is_none());
    let agg: Aggregator = [None::<io::Error>, None, None].into_iter().collect();
    assert!(agg.err().is_none());

    let mut agg = Aggregator::new();
    agg.extend([None::<io::Error>, None, None]);
    agg.extend(std::iter::empty::<Option<io::Error>>());
    assert!(agg.err().is_none());
}

#[test]
fn any_present_error_produces_an_error() {
    let agg: Aggregator = [None, Some(Custom("a")), None].into_iter().collect();
    assert!(agg.err().is_some());

    let mut agg: Aggregator = [None::<Custom>, None].into_iter().collect();
    agg.extend([None, Some(Custom("a")), None]);
    assert!(agg.err().is_some());
}

#[test]
fn short_form() {
    let first: SharedError = Arc::new(io::Error::other("test1"));

    let mut single = Aggregator::new();
    single.add(Arc::clone(&first)).add_opt(None::<io::Error>);
    assert_eq!(result(&single).to_string(), "test1");

    let mut agg = Aggregator::new();
    agg.add(Arc::clone(&first))
        .add(Arc::clone(&first))
        .add(io::Error::other("test2"))
        .add_opt(None::<io::Error>)
        .add(io::Error::other("test3"));
    assert_eq!(result(&agg).to_string(), "4 errors: test1; test1; test2; test3");
}

#[test]
fn as_type_finds_first_matching_entry() {
    let mut agg = Aggregator::new();
    agg.add(Custom("a")).add(Other).add(Custom("b"));
    let err = result(&agg);
    assert_eq!(as_type::<Custom>(&*err), Some(&Custom("a")));
    assert_eq!(as_type::<Other>(&*err), Some(&Other));
    assert!(as_type::<Unused>(&*err).is_none());

    let Some(wrapped) = wrap(agg.err(), "wrap") else {
        panic!("expected a wrap");
    };
    assert_eq!(as_type::<Custom>(&wrapped), Some(&Custom("a")));
    assert_eq!(as_type::<Other>(&wrapped), Some(&Other));
    assert!(as_type::<Unused>(&wrapped).is_none());
}

#[test]
fn is_matches_entries_and_ordered_aggregates() {
    let mut agg = Aggregator::new();
    agg.add(Custom("a")).add(Other);
    let err = result(&agg);
    let multi = multi_of(&err);

    assert!(is(&*err, &Custom("a")));
    assert!(is(&*err, &Other));
    assert!(!is(&*err, &Custom("b")));
    assert!(!is(&*err, &Unused));
    assert!(is(&*err, multi), "an aggregate matches itself");

    let same_handles = {
        let mut again = Aggregator::new();
        for entry in multi.errors() {
            again.add(Arc::clone(entry));
        }
        result(&again)
    };
    assert!(is(&*err, multi_of(&same_handles)), "same entries in the same order");

    let reversed = {
        let mut again = Aggregator::new();
        for entry in multi.errors().iter().rev() {
            again.add(Arc::clone(entry));
        }
        result(&again)
    };
    assert!(!is(&*err, multi_of(&reversed)), "order is significant");

    let Some(wrapped) = wrap(agg.err(), "wrap") else {
        panic!("expected a wrap");
    };
    assert!(is(&wrapped, &Custom("a")));
    assert!(is(&wrapped, &Other));
    assert!(!is(&wrapped, &Unused));
}

#[test]
fn is_compares_comparable_entries_by_value() {
    let shared: SharedError = Arc::new(io::Error::other("shared"));
    let build = || {
        let mut agg = Aggregator::new();
        agg.add(Arc::clone(&shared)).add_comparable(Custom("a")).add_comparable(Other);
        result(&agg)
    };
    let (first, second) = (build(), build());
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(is(&*first, multi_of(&second)), "value-equal entries built separately");

    let mut one_sided = Aggregator::new();
    one_sided.add(Arc::clone(&shared)).add(Custom("a")).add(Other);
    let one_sided = result(&one_sided);
    assert!(is(&*first, multi_of(&one_sided)), "one comparable side is enough");

    let mut opaque = Aggregator::new();
    opaque.add(Custom("a")).add(Other);
    let mut opaque_again = Aggregator::new();
    opaque_again.add(Custom("a")).add(Other);
    assert!(
        !is(&*result(&opaque), multi_of(&result(&opaque_again))),
        "plain entries compare by identity"
    );

    let mut different = Aggregator::new();
    different.add(Arc::clone(&shared)).add_comparable(Custom("b")).add_comparable(Other);
    assert!(!is(&*first, multi_of(&result(&different))));

    let Some(wrapped) = wrap(Some(Arc::clone(&first)), "wrap") else {
        panic!("expected a wrap");
    };
    assert!(is(&wrapped, multi_of(&second)), "comparison reaches through wraps");
}

#[test]
fn is_same_matches_the_exact_handle() {
    let exact: SharedError = Arc::new(Other);
    let lookalike: SharedError = Arc::new(Other);
    let mut agg = Aggregator::new();
    agg.add(Custom("a")).add(Arc::clone(&exact));
    let err = result(&agg);
    assert!(is_same(&*err, &*exact));
    assert!(!is_same(&*err, &*lookalike));
    assert!(is(&*err, &Other), "value matching still sees the lookalike as equal");
}

#[test]
fn count_descends_into_wrapped_aggregates() {
    let mut agg = Aggregator::new();
    agg.add(Other);
    let err = result(&agg);
    assert!(as_multi(&*err).is_none(), "a single entry is returned as is");

    agg.add(Other).add(Other);
    let err = result(&agg);
    assert_eq!(multi_of(&err).count(&Custom("a")), 0);
    assert_eq!(multi_of(&err).count(&Other), 3);

    let mut middle = Aggregator::new();
    middle.add(Other).add(Other).add(Other);
    let mut inner = Aggregator::new();
    inner.add(Other).add(Other);
    middle.add_opt(wrap(inner.err(), "wrap"));
    agg.add_opt(wrap(middle.err(), "wrap"));

    let err = result(&agg);
    assert_eq!(multi_of(&err).len(), 4, "wrapped aggregates are not flattened");
    assert_eq!(multi_of(&err).count(&Custom("a")), 0);
    assert_eq!(multi_of(&err).count(&Other), 8);
}

#[test]
fn as_multi_resolves_plain_and_wrapped_aggregates() {
    let mut agg = Aggregator::new();
    agg.add(Custom("a")).add(Other);
    let err = result(&agg);

    assert!(as_multi(&Custom("a")).is_none());

    let direct = multi_of(&err);
    assert!(is(&*err, direct));

    let Some(wrapped) = wrap(Some(Arc::clone(&err)), "wrap") else {
        panic!("expected a wrap");
    };
    let Some(found) = as_multi(&wrapped) else {
        panic!("aggregate must be found behind the wrap");
    };
    assert!(is(&*err, found));
}

#[test]
fn pretty_print_shows_nesting() {
    let mut inner = Aggregator::new();
    inner.add(Custom("x")).add(Custom("y"));
    let mut agg = Aggregator::new();
    agg.add(Other).add_opt(wrap(wrap(inner.err(), "b"), "a"));
    let err = result(&agg);
    assert_eq!(
        multi_of(&err).pretty().to_string(),
        "2 errors: other; (a: b: 2 errors: custom: x; custom: y)"
    );
    assert_eq!(
        err.to_string(),
        "2 errors: other; a: b: 2 errors: custom: x; custom: y"
    );
}
