//! Dependency graph construction
//!
//! Resolves every declared dependency of every unit through a name index
//! and records an edge from the providing unit to the consuming unit.
//! Dependencies that resolve to nothing are external (base system) and
//! are ignored.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::unit::{Unit, UnitId};

/// Two units claiming the same output name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameConflict {
    /// The contested output name
    pub name: String,
    /// Unit that registered the name first and lost it
    pub previous: UnitId,
    /// Unit that registered the name last and owns it
    pub winner: UnitId,
}

/// Output name to owning unit
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    owners: BTreeMap<String, UnitId>,
}

impl NameIndex {
    /// Register a name, returning the conflict if another unit already owned it
    pub fn register(&mut self, name: &str, owner: &UnitId) -> Option<NameConflict> {
        let previous = self.owners.insert(name.to_string(), owner.clone())?;
        if &previous == owner {
            return None;
        }
        Some(NameConflict {
            name: name.to_string(),
            previous,
            winner: owner.clone(),
        })
    }

    /// Look up the unit producing `name`
    pub fn owner(&self, name: &str) -> Option<&UnitId> {
        self.owners.get(name)
    }

    /// Whether any unit produces `name`
    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no names are registered
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Iterate over `(name, owner)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UnitId)> {
        self.owners.iter().map(|(n, u)| (n.as_str(), u))
    }
}

/// Directed graph of units, edges pointing from provider to consumer
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Unit, ()>,
    nodes: HashMap<UnitId, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit as a node, returning false if its id is already present
    fn add_unit(&mut self, unit: Unit) -> bool {
        if self.nodes.contains_key(&unit.id) {
            return false;
        }
        let id = unit.id.clone();
        let idx = self.graph.add_node(unit);
        self.nodes.insert(id, idx);
        true
    }

    /// Add an edge; repeated edges collapse into one and self edges are dropped
    fn add_edge(&mut self, provider: &UnitId, consumer: &UnitId) -> bool {
        if provider == consumer {
            return false;
        }
        let (Some(&from), Some(&to)) = (self.nodes.get(provider), self.nodes.get(consumer)) else {
            return false;
        };
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if the graph has no units
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a unit is part of the graph
    pub fn contains(&self, id: &UnitId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get a unit by id
    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.nodes.get(id).map(|&idx| &self.graph[idx])
    }

    /// All units, sorted by id
    pub fn units(&self) -> Vec<&Unit> {
        let mut units: Vec<_> = self.graph.node_weights().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        units
    }

    /// All unit ids
    pub fn ids(&self) -> BTreeSet<UnitId> {
        self.nodes.keys().cloned().collect()
    }

    /// Whether `consumer` directly depends on `provider`
    pub fn has_edge(&self, provider: &UnitId, consumer: &UnitId) -> bool {
        match (self.nodes.get(provider), self.nodes.get(consumer)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Units `id` directly depends on
    pub fn predecessors(&self, id: &UnitId) -> BTreeSet<&UnitId> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &UnitId, direction: Direction) -> BTreeSet<&UnitId> {
        self.nodes
            .get(id)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, direction)
                    .map(|n| &self.graph[n].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every unit transitively depending on `id`, excluding `id` itself
    pub fn descendants(&self, id: &UnitId) -> BTreeSet<UnitId> {
        let Some(&start) = self.nodes.get(id) else {
            return BTreeSet::new();
        };

        let mut found = BTreeSet::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(idx) = bfs.next(&self.graph) {
            if idx != start {
                found.insert(self.graph[idx].id.clone());
            }
        }
        found
    }

    pub(crate) fn index_of(&self, id: &UnitId) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    pub(crate) fn inner(&self) -> &DiGraph<Unit, ()> {
        &self.graph
    }
}

/// Result of building the graph
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    /// Name to unit index
    pub index: NameIndex,
    /// The dependency graph
    pub graph: DependencyGraph,
    /// Name conflicts found while indexing
    pub conflicts: Vec<NameConflict>,
}

/// Build the name index and dependency graph for a set of units
///
/// Units are registered in the given order, so on a name conflict the
/// later unit owns the name. Both units stay in the graph.
pub fn build(units: impl IntoIterator<Item = Unit>) -> GraphBuild {
    let mut result = GraphBuild::default();

    for unit in units {
        if result.graph.contains(&unit.id) {
            tracing::warn!("Duplicate unit '{}' ignored", unit.id);
            continue;
        }
        for name in &unit.names {
            if let Some(conflict) = result.index.register(name, &unit.id) {
                tracing::warn!(
                    "Output '{}' is produced by both '{}' and '{}'; using '{}'",
                    conflict.name,
                    conflict.previous,
                    conflict.winner,
                    conflict.winner
                );
                result.conflicts.push(conflict);
            }
        }
        result.graph.add_unit(unit);
    }

    let mut edges = Vec::new();
    for unit in result.graph.units() {
        for dep in unit.bare_dependencies() {
            match result.index.owner(dep) {
                Some(provider) => edges.push((provider.clone(), unit.id.clone())),
                None => tracing::debug!("'{}' depends on external '{}'", unit.id, dep),
            }
        }
    }

    for (provider, consumer) in edges {
        if result.graph.add_edge(&provider, &consumer) {
            tracing::debug!("Edge {provider} -> {consumer}");
        }
    }

    tracing::info!(
        "Dependency graph: {} units, {} edges",
        result.graph.len(),
        result.graph.edge_count()
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, names: &[&str], deps: &[&str]) -> Unit {
        Unit {
            id: UnitId::new(id),
            names: names.iter().map(|s| (*s).to_string()).collect(),
            version: "1.0-1".to_string(),
            dependencies: deps.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_edge_from_provider_to_consumer() {
        let built = build(vec![
            unit("lib", &["libfoo"], &[]),
            unit("app", &["app"], &["libfoo>=1.0", "glibc"]),
        ]);

        assert!(built.graph.has_edge(&"lib".into(), &"app".into()));
        assert!(!built.graph.has_edge(&"app".into(), &"lib".into()));
        assert_eq!(built.graph.edge_count(), 1);
        assert!(built.conflicts.is_empty());
    }

    #[test]
    fn test_split_unit_self_dependency_creates_no_edge() {
        let built = build(vec![unit("qt", &["qt-core", "qt-gui"], &["qt-core"])]);

        assert_eq!(built.graph.edge_count(), 0);
        assert_eq!(built.index.len(), 2);
    }

    #[test]
    fn test_duplicate_declarations_collapse() {
        let built = build(vec![
            unit("lib", &["liba", "libb"], &[]),
            unit("app", &["app"], &["liba", "libb", "liba<2"]),
        ]);

        assert_eq!(built.graph.edge_count(), 1);
    }

    #[test]
    fn test_name_conflict_later_wins() {
        let built = build(vec![
            unit("first", &["shared"], &[]),
            unit("second", &["shared"], &[]),
        ]);

        assert_eq!(built.index.owner("shared"), Some(&UnitId::new("second")));
        assert_eq!(built.conflicts.len(), 1);
        assert_eq!(built.conflicts[0].previous, UnitId::new("first"));
        assert_eq!(built.graph.len(), 2, "losing unit must stay in the graph");
    }

    #[test]
    fn test_descendants() {
        let built = build(vec![
            unit("a", &["a"], &[]),
            unit("b", &["b"], &["a"]),
            unit("c", &["c"], &["b"]),
            unit("d", &["d"], &[]),
        ]);

        let desc = built.graph.descendants(&"a".into());
        assert_eq!(desc, BTreeSet::from([UnitId::new("b"), UnitId::new("c")]));
        assert!(built.graph.descendants(&"d".into()).is_empty());
    }
}
