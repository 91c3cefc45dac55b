//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::unit::{Unit, UnitId};

    /// Generate a valid package name (lowercase alphanumeric with hyphens)
    pub fn package_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,30}[a-z0-9]?".prop_filter("Name must not be empty", |s| !s.is_empty())
    }

    /// Generate a pacman version string (`[epoch:]pkgver-pkgrel`)
    pub fn pkg_version() -> impl Strategy<Value = String> {
        (prop::option::of(1u32..5), 0u32..20, 0u32..50, 1u32..10).prop_map(
            |(epoch, major, minor, rel)| match epoch {
                Some(e) => format!("{e}:{major}.{minor}-{rel}"),
                None => format!("{major}.{minor}-{rel}"),
            },
        )
    }

    /// Generate an acyclic set of units `u0..uN`
    ///
    /// Unit `i` may only depend on units with a smaller index, and on
    /// external names that no unit provides.
    pub fn acyclic_units(max: usize) -> impl Strategy<Value = Vec<Unit>> {
        (1..=max)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), n),
                    prop::collection::vec(pkg_version(), n),
                )
            })
            .prop_map(|(deps, versions)| {
                deps.into_iter()
                    .zip(versions)
                    .enumerate()
                    .map(|(i, (picks, version))| {
                        let mut dependencies: std::collections::BTreeSet<String> = picks
                            .iter()
                            .filter(|_| i > 0)
                            .map(|pick| format!("u{}", pick.index(i)))
                            .collect();
                        dependencies.insert("glibc".to_string());
                        Unit {
                            id: UnitId::new(format!("u{i}")),
                            names: vec![format!("u{i}")],
                            version,
                            dependencies,
                        }
                    })
                    .collect()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    use crate::config::defaults::MIN_PROPTEST_ITERATIONS;
    use crate::core::graph;
    use crate::core::levels;
    use crate::core::reconcile::{self, DesiredState, PublishedState};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn test_package_name_generator(name in package_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }

        #[test]
        fn test_pkg_version_generator(version in pkg_version()) {
            prop_assert!(version.contains('-'));
        }

        /// Every unit lands on a strictly higher level than each of its providers
        #[test]
        fn test_schedule_respects_edges(units in acyclic_units(12)) {
            let build = graph::build(units);
            let levels = levels::schedule(&build.graph, &build.graph.ids())
                .into_result()
                .unwrap();

            prop_assert_eq!(levels.unit_count(), build.graph.len());
            for unit in build.graph.units() {
                let level = levels.level_of(&unit.id).unwrap();
                for provider in build.graph.predecessors(&unit.id) {
                    prop_assert!(levels.level_of(provider).unwrap() < level);
                }
            }
        }

        /// Depth-based levels agree with layered scheduling
        #[test]
        fn test_depth_levels_match_schedule(units in acyclic_units(12)) {
            let build = graph::build(units);
            let layered = levels::schedule(&build.graph, &build.graph.ids())
                .into_result()
                .unwrap();
            let by_depth = levels::depth_levels(&build.graph).into_result().unwrap();

            prop_assert_eq!(layered, by_depth);
        }

        /// Publishing exactly the desired state leaves nothing to do
        #[test]
        fn test_reconcile_idempotent(units in acyclic_units(12)) {
            let build = graph::build(units);
            let desired = DesiredState::from_graph(&build.graph, &build.index);
            let published: PublishedState = desired.as_map().clone().into();

            let result = reconcile::reconcile(&build.graph, &desired, &published, false);
            prop_assert!(result.is_noop());
        }
    }
}
