//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{join, quote, split, tokenize, unquote};
    use proptest::prelude::*;

    // ============================================================================
    // split / join property tests
    // ============================================================================

    proptest! {
        /// Property: split never yields empty or whitespace-bearing segments
        #[test]
        fn split_yields_clean_segments(input in ".*") {
            for segment in split(&input) {
                prop_assert!(!segment.is_empty());
                prop_assert!(!segment.chars().any(char::is_whitespace));
            }
        }

        /// Property: join then split is the identity on clean segments
        #[test]
        fn join_then_split_roundtrips(segments in prop::collection::vec("[a-z0-9./-]{1,8}", 0..6)) {
            let joined = join(&segments);
            prop_assert_eq!(split(&joined), segments);
        }
    }

    // ============================================================================
    // quoting property tests
    // ============================================================================

    proptest! {
        /// Property: unquote of a quoted value gives back the value
        #[test]
        fn unquote_inverts_quoting(value in "[^']*") {
            let quoted = format!("'{}'", value);
            prop_assert_eq!(unquote(&quoted), value.as_str());
        }

        /// Property: unquote never grows its input
        #[test]
        fn unquote_never_grows(value in ".*") {
            prop_assert!(unquote(&value).len() <= value.len());
        }

        /// Property: a quoted value survives tokenize as a single word
        #[test]
        fn quoted_value_is_one_token(value in "[a-z ]{0,12}") {
            let line = format!("description {}", quote(&value));
            let words = tokenize(&line);
            prop_assert_eq!(words.len(), 2);
            prop_assert_eq!(unquote(&words[1]), value.as_str());
        }

        /// Property: any storable value comes back unchanged through a saved line
        #[test]
        fn quote_survives_tokenize(
            value in "[ -~]{0,16}".prop_filter("both quote kinds", |v| {
                !(v.contains('\'') && v.contains('"'))
            })
        ) {
            let quoted = quote(&value);
            prop_assert_eq!(tokenize(&quoted), vec![quoted.clone()]);
            prop_assert_eq!(unquote(&quoted), value.as_str());
        }
    }
}
