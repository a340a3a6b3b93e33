//! Property-based tests for ext-updater.
//!
//! # Properties Tested
//!
//! - Version comparison is reflexive, antisymmetric and transitive
//! - Pre-releases order before their release
//! - Re-install always reaches the install consent gate
//! - An up-to-date check without confirmation has no effects
//! - Descriptor to record round trip keeps version, tags and timestamp

#![cfg(test)]

use std::cmp::Ordering;
use std::collections::BTreeSet;

use proptest::prelude::*;
use url::Url;

use crate::config::UpdateOptions;
use crate::descriptor::VersionDescriptor;
use crate::state::{transition, CycleEvent, CycleState, Effect};
use crate::version::{compare, parse_version};

// =============================================================================
// Generators
// =============================================================================

/// Generate a version string, sometimes with a pre-release suffix.
fn arb_version() -> impl Strategy<Value = String> {
    (
        0u64..20,
        0u64..20,
        0u64..20,
        prop::option::of(prop_oneof![
            Just("alpha".to_string()),
            Just("beta".to_string()),
            Just("rc".to_string()),
            (0u64..10).prop_map(|n| format!("beta.{}", n)),
        ]),
    )
        .prop_map(|(major, minor, patch, pre)| match pre {
            Some(pre) => format!("{}.{}.{}-{}", major, minor, patch, pre),
            None => format!("{}.{}.{}", major, minor, patch),
        })
}

fn arb_ordering() -> impl Strategy<Value = Ordering> {
    prop_oneof![Just(Ordering::Less), Just(Ordering::Equal), Just(Ordering::Greater)]
}

fn arb_tags() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z][a-z0-9-]{0,11}", 0..4)
}

// =============================================================================
// Version ordering
// =============================================================================

proptest! {
    #[test]
    fn prop_compare_reflexive(a in arb_version()) {
        prop_assert_eq!(compare(&a, &a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn prop_compare_antisymmetric(a in arb_version(), b in arb_version()) {
        prop_assert_eq!(compare(&a, &b).unwrap(), compare(&b, &a).unwrap().reverse());
    }

    #[test]
    fn prop_compare_transitive(a in arb_version(), b in arb_version(), c in arb_version()) {
        let ab = compare(&a, &b).unwrap();
        let bc = compare(&b, &c).unwrap();
        if ab != Ordering::Greater && bc != Ordering::Greater {
            prop_assert_ne!(compare(&a, &c).unwrap(), Ordering::Greater);
        }
    }

    #[test]
    fn prop_prerelease_before_release(
        major in 0u64..50,
        minor in 0u64..50,
        patch in 0u64..50,
        pre in "[a-z]{1,8}(\\.[1-9][0-9]{0,2})?",
    ) {
        let release = format!("{}.{}.{}", major, minor, patch);
        let prerelease = format!("{}-{}", release, pre);
        prop_assert_eq!(compare(&prerelease, &release).unwrap(), Ordering::Less);
    }

    #[test]
    fn prop_numeric_triple_order(
        a in (0u64..100, 0u64..100, 0u64..100),
        b in (0u64..100, 0u64..100, 0u64..100),
    ) {
        let va = format!("{}.{}.{}", a.0, a.1, a.2);
        let vb = format!("{}.{}.{}", b.0, b.1, b.2);
        prop_assert_eq!(compare(&va, &vb).unwrap(), a.cmp(&b));
    }

    #[test]
    fn prop_leading_v_ignored(a in arb_version()) {
        prop_assert_eq!(parse_version(&format!("v{}", a)).unwrap(), parse_version(&a).unwrap());
    }
}

// =============================================================================
// State machine
// =============================================================================

proptest! {
    #[test]
    fn prop_reinstall_reaches_consent(ordering in arb_ordering(), confirm in any::<bool>()) {
        let options = UpdateOptions { re_install: true, show_up_to_date_confirmation: confirm };
        let (state, effect) = transition(
            CycleState::Checking,
            CycleEvent::LatestFetched { ordering },
            &options,
        ).unwrap();
        prop_assert_eq!(state, CycleState::AwaitingInstallConsent);
        prop_assert_eq!(effect, Effect::AskInstall { auto_accept: true });
    }

    #[test]
    fn prop_not_newer_is_silent(
        latest in arb_version(),
        installed in arb_version(),
    ) {
        let ordering = compare(&latest, &installed).unwrap();
        prop_assume!(ordering != Ordering::Greater);

        let (state, effect) = transition(
            CycleState::Checking,
            CycleEvent::LatestFetched { ordering },
            &UpdateOptions::default(),
        ).unwrap();
        prop_assert_eq!(state, CycleState::UpToDate);
        prop_assert_eq!(effect, Effect::None);
        prop_assert!(state.is_terminal());
    }

    #[test]
    fn prop_declined_ends_cycle(options in (any::<bool>(), any::<bool>())) {
        let options = UpdateOptions { re_install: options.0, show_up_to_date_confirmation: options.1 };
        let (state, effect) = transition(
            CycleState::AwaitingInstallConsent,
            CycleEvent::InstallConsent(false),
            &options,
        ).unwrap();
        prop_assert_eq!(state, CycleState::Done);
        prop_assert_eq!(effect, Effect::None);
    }
}

// =============================================================================
// Descriptor round trip
// =============================================================================

proptest! {
    #[test]
    fn prop_descriptor_record_round_trip(
        version in arb_version(),
        // Up to year 2100, millisecond precision
        published_at in 0i64..4_102_444_800_000,
        tags in arb_tags(),
    ) {
        let url = Url::parse("https://registry.example.com/my-ext/my-ext.vsix").unwrap();
        let original = VersionDescriptor::new(version.clone(), published_at, url.clone(), tags.clone());

        let record = original.to_record("my-ext");
        let restored = VersionDescriptor::from_record(&record, url).unwrap();

        prop_assert_eq!(restored.version(), version.as_str());
        prop_assert_eq!(restored.tags(), &tags);
        prop_assert_eq!(restored.published_at(), published_at);
        prop_assert_eq!(restored, original);
    }
}
