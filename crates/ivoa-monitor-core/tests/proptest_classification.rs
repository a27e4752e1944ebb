// crates/ivoa-monitor-core/tests/proptest_classification.rs
// ============================================================================
// Module: Classification and Partitioning Property Tests
// Description: Property tests for type matching, version derivation, and slicing.
// Purpose: Detect panics and invariant violations across wide input ranges.
// ============================================================================

//! Property-based tests for service-type matching, version derivation, and partitioning.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use ivoa_monitor_core::ServiceType;
use ivoa_monitor_core::SpecCatalog;
use ivoa_monitor_core::StandardId;
use ivoa_monitor_core::VersionSource;
use ivoa_monitor_core::partition;
use proptest::prelude::*;

proptest! {
    #[test]
    fn siav2_fragments_never_match_sia(aux in any::<bool>(), minor in 0_u32 .. 100, upper in any::<bool>()) {
        let base = if upper { "ivo://ivoa.net/std/SIA" } else { "ivo://ivoa.net/std/sia" };
        let aux = if aux { "aux-" } else { "" };
        let id = format!("{base}#query-{aux}2.{minor}");
        prop_assert!(ServiceType::SiaV2.matches(&id));
        prop_assert!(!ServiceType::Sia.matches(&id));
    }

    #[test]
    fn sia_v1_identifiers_never_match_siav2(fragment in prop::option::of("#query-(aux-)?1\\.[0-9]{1,2}")) {
        let id = format!("ivo://ivoa.net/std/sia{}", fragment.unwrap_or_default());
        prop_assert!(ServiceType::Sia.matches(&id));
        prop_assert!(!ServiceType::SiaV2.matches(&id));
    }

    #[test]
    fn version_derivation_is_total_and_deterministic(
        prefix in prop::sample::select(vec!["conesearch", "sia", "ssa", "sla", "tap"]),
        fragment in prop::option::of("#[a-z0-9.\\-]{0,12}"),
        reported in "[0-9.]{0,4}",
    ) {
        let catalog = SpecCatalog::builtin();
        let id = StandardId::parse(&format!("ivo://ivoa.net/std/{prefix}{}", fragment.unwrap_or_default()));
        let first = catalog.resolve(&id, &reported).unwrap();
        let second = catalog.resolve(&id, &reported).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(!first.version.is_empty());
        match first.version_source {
            VersionSource::Fragment => prop_assert_eq!(Some(first.version.as_str()), id.fragment_version()),
            VersionSource::Reported => {
                prop_assert!(id.fragment_version().is_none());
                prop_assert_eq!(first.version.as_str(), reported.trim());
            }
            VersionSource::Default => {
                prop_assert!(id.fragment_version().is_none());
                prop_assert!(reported.trim().is_empty());
            }
        }
    }

    #[test]
    fn partition_is_an_exact_near_even_cover(len in 1_usize .. 200, workers_seed in 1_usize .. 200) {
        let items: Vec<usize> = (0 .. len).collect();
        let workers = (workers_seed - 1) % len + 1;
        let slices = partition(&items, workers).unwrap();
        prop_assert_eq!(slices.len(), workers);
        let max = slices.iter().map(|slice| slice.len()).max().unwrap();
        let min = slices.iter().map(|slice| slice.len()).min().unwrap();
        prop_assert!(max - min <= 1);
        let joined: Vec<usize> = slices.concat();
        prop_assert_eq!(joined, items);
    }
}
