//! Property tests for composite key parsing.
//!
//! `split` and `join` must be inverses for every well-formed key, with
//! the split taken at the last hyphen so hyphenated project keys survive.

use jim_rust::model::CompositeKey;
use proptest::prelude::*;

proptest! {
    #[test]
    fn join_then_split_round_trips(
        project in "[A-Z][A-Z0-9]{0,9}(-[A-Z0-9]{1,4}){0,2}",
        ordinal in 1u64..1_000_000,
    ) {
        let text = format!("{project}-{ordinal}");
        let key = CompositeKey::parse(&text).unwrap();
        prop_assert_eq!(&key.project, &project);
        prop_assert_eq!(key.ordinal, ordinal);
        prop_assert_eq!(key.to_string(), text);
    }

    #[test]
    fn parse_never_panics(text in ".*") {
        let _ = CompositeKey::parse(&text);
    }
}

#[test]
fn split_takes_last_hyphen() {
    let key = CompositeKey::parse("GLASSFISH-SHOALS-21").unwrap();
    assert_eq!(key.project, "GLASSFISH-SHOALS");
    assert_eq!(key.ordinal, 21);
    assert_eq!(key.to_string(), "GLASSFISH-SHOALS-21");
}
