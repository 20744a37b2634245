//! Property-based tests for version ordering and candidate selection.
//!
//! These tests verify that:
//! - Version comparison is a total order
//! - The candidate window is exactly `current < v <= ceiling`
//! - Candidates come newest first, led by the ceiling
//! - Changelog formatting is a fixed point on its own output

use proptest::prelude::*;
use samba_updater::domain::version::{compare, is_newer, is_older};
use samba_updater::domain::{CandidateSet, ChangelogFormatter, Version};
use std::cmp::Ordering;

fn arb_version() -> impl Strategy<Value = Version> {
    (0u32..6, 0u32..12, 0u32..12).prop_map(|(a, b, c)| Version::new(a, b, c))
}

/// Listing entries: mostly valid versions, some noise the resolver must skip.
fn arb_listing() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            4 => arb_version().prop_map(|v| v.to_string()),
            1 => prop::string::string_regex(r"[0-9]{1,2}\.[0-9]{1,2}(rc[0-9])?").unwrap(),
        ],
        0..20,
    )
}

/// Commit message lines at arbitrary indentation, with no headers or
/// trailers: lowercase words, optional bullet, optional bug reference.
fn arb_message() -> impl Strategy<Value = String> {
    let line = (
        0usize..12,
        any::<bool>(),
        prop::collection::vec("[a-z]{1,8}", 1..4),
        prop::option::of(1u32..20000),
    )
        .prop_map(|(indent, bullet, words, bug)| {
            let mut line = " ".repeat(indent);
            if bullet {
                line.push_str("* ");
            }
            line.push_str(&words.join(" "));
            if let Some(id) = bug {
                line.push_str(&format!(" (bug {})", id));
            }
            line
        });
    prop::collection::vec(prop_oneof![4 => line, 1 => Just(String::new())], 0..12)
        .prop_map(|lines| lines.join("\n"))
}

proptest! {
    /// Formatting already formatted text changes nothing.
    #[test]
    fn changelog_format_is_idempotent(message in arb_message()) {
        let formatter = ChangelogFormatter::new("bugzilla.samba.org", &[]).unwrap();
        let version = Version::new(2, 3, 1);

        let once = formatter.format(&message, "talloc", &version).join("\n");
        let twice = formatter.format(&once, "talloc", &version).join("\n");
        prop_assert_eq!(once, twice);
    }


    /// Swapping the arguments reverses the ordering.
    #[test]
    fn compare_is_antisymmetric(a in arb_version(), b in arb_version()) {
        prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
        prop_assert_eq!(is_older(&a, &b), is_newer(&b, &a));
        prop_assert!(!(is_older(&a, &b) && is_newer(&a, &b)));
    }

    /// Ordering chains.
    #[test]
    fn compare_is_transitive(a in arb_version(), b in arb_version(), c in arb_version()) {
        if compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater {
            prop_assert_ne!(compare(&a, &c), Ordering::Greater);
        }
    }

    /// Equal components compare equal, and only then.
    #[test]
    fn compare_equal_iff_same(a in arb_version(), b in arb_version()) {
        prop_assert_eq!(compare(&a, &b) == Ordering::Equal, a == b);
    }

    /// Every candidate lies in the window.
    #[test]
    fn candidates_stay_in_window(
        current in arb_version(),
        ceiling in arb_version(),
        listing in arb_listing(),
    ) {
        let set = CandidateSet::resolve(current, ceiling, &listing);
        for v in set.iter() {
            prop_assert!(is_newer(v, &current));
            prop_assert!(!is_newer(v, &ceiling));
        }
    }

    /// No update exactly when the package is already at or past the ceiling.
    #[test]
    fn empty_iff_not_behind(
        current in arb_version(),
        ceiling in arb_version(),
        listing in arb_listing(),
    ) {
        let set = CandidateSet::resolve(current, ceiling, &listing);
        prop_assert_eq!(set.is_empty(), !is_older(&current, &ceiling));
    }

    /// Newest first, no duplicates, the ceiling at the head.
    #[test]
    fn candidates_sorted_and_led_by_ceiling(
        current in arb_version(),
        ceiling in arb_version(),
        listing in arb_listing(),
    ) {
        let set = CandidateSet::resolve(current, ceiling, &listing);
        for pair in set.versions().windows(2) {
            prop_assert!(is_newer(&pair[0], &pair[1]));
        }
        if !set.is_empty() {
            prop_assert_eq!(set.selected(), Some(ceiling));
            let published = listing.iter().any(|s| s == &ceiling.to_string());
            prop_assert_eq!(set.ceiling_unpublished(), !published);
        }
    }

    /// Every listed version inside the window is kept.
    #[test]
    fn window_members_are_not_dropped(
        current in arb_version(),
        ceiling in arb_version(),
        listing in arb_listing(),
    ) {
        let set = CandidateSet::resolve(current, ceiling, &listing);
        for entry in &listing {
            if let Ok(v) = Version::parse(entry) {
                if is_newer(&v, &current) && !is_newer(&v, &ceiling) {
                    prop_assert!(set.versions().contains(&v));
                }
            }
        }
    }
}
