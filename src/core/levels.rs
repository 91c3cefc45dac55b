//! Build level scheduling
//!
//! Partitions units into batches that can be built in parallel: every unit
//! of level N only depends on units of levels below N. Two entry points
//! exist:
//!
//! - [`schedule`] layers an arbitrary subset of the graph (Kahn layering)
//! - [`depth`] / [`depth_levels`] compute the length of the dependency
//!   chain behind a unit, memoized per call
//!
//! Neither ever assigns a level to a unit that sits on a dependency cycle.
//! Cycles are reported through [`CycleError`] and the caller decides what
//! to do with the units that were left out.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::core::graph::DependencyGraph;
use crate::core::unit::UnitId;
use crate::error::CycleError;

/// Ordered build batches; level numbers start at 1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BuildLevels {
    levels: Vec<Vec<UnitId>>,
}

impl BuildLevels {
    /// Create an empty level list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a level; members are sorted, empty levels are skipped
    pub fn push(&mut self, mut members: Vec<UnitId>) {
        if members.is_empty() {
            return;
        }
        members.sort();
        self.levels.push(members);
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if there are no levels
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Members of level `number` (1-based)
    pub fn level(&self, number: usize) -> Option<&[UnitId]> {
        number
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .map(Vec::as_slice)
    }

    /// Level number of a unit, if scheduled
    pub fn level_of(&self, id: &UnitId) -> Option<usize> {
        self.levels
            .iter()
            .position(|members| members.contains(id))
            .map(|i| i + 1)
    }

    /// Level numbers `[1, 2, ..]`
    pub fn numbers(&self) -> Vec<usize> {
        (1..=self.levels.len()).collect()
    }

    /// Level number to members
    pub fn level_map(&self) -> BTreeMap<usize, Vec<UnitId>> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, members)| (i + 1, members.clone()))
            .collect()
    }

    /// Iterate over `(level number, members)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[UnitId])> {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, members)| (i + 1, members.as_slice()))
    }

    /// Total number of scheduled units
    pub fn unit_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }
}

/// Outcome of leveling: the levels that could be computed and, if the
/// subgraph is cyclic, the units that were left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Levels of every unit not involved in or blocked by a cycle
    pub levels: BuildLevels,
    /// Cycle report, if any
    pub cycle: Option<CycleError>,
}

impl Schedule {
    /// Fail on a cycle
    pub fn into_result(self) -> Result<BuildLevels, CycleError> {
        match self.cycle {
            Some(cycle) => Err(cycle),
            None => Ok(self.levels),
        }
    }

    /// Append every unscheduled unit as one final, unordered level
    ///
    /// The level holds the cycle members together with the units blocked
    /// by them, so a blocked consumer shares the level with the providers
    /// it waits on. Build order inside it is not guaranteed.
    pub fn best_effort(self) -> BuildLevels {
        let mut levels = self.levels;
        if let Some(cycle) = self.cycle {
            tracing::warn!(
                "Scheduling {} units of a dependency cycle in a final unordered level",
                cycle.members.len() + cycle.blocked.len()
            );
            levels.push(cycle.unscheduled().cloned().collect());
        }
        levels
    }
}

/// Level the subgraph induced by `nodes`
///
/// Ids that are not part of `graph` are ignored. Within a level, members
/// are sorted by id.
pub fn schedule(graph: &DependencyGraph, nodes: &BTreeSet<UnitId>) -> Schedule {
    let inner = graph.inner();
    let members: HashSet<NodeIndex> = nodes.iter().filter_map(|id| graph.index_of(id)).collect();

    let mut pending: HashMap<NodeIndex, usize> = members
        .iter()
        .map(|&n| {
            let count = inner
                .neighbors_directed(n, Direction::Incoming)
                .filter(|p| members.contains(p))
                .count();
            (n, count)
        })
        .collect();

    let mut ready: Vec<NodeIndex> = pending
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&n, _)| n)
        .collect();

    let mut levels = BuildLevels::new();
    while !ready.is_empty() {
        let mut next = Vec::new();
        for &n in &ready {
            pending.remove(&n);
            for succ in inner.neighbors_directed(n, Direction::Outgoing) {
                if let Some(count) = pending.get_mut(&succ) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(succ);
                    }
                }
            }
        }
        levels.push(ready.iter().map(|&n| inner[n].id.clone()).collect());
        ready = next;
    }

    let cycle = if pending.is_empty() {
        None
    } else {
        let report = classify_cycle(graph, &pending.keys().copied().collect());
        tracing::warn!("{report}");
        Some(report)
    };

    Schedule { levels, cycle }
}

/// Split the unschedulable remainder into cycle members and blocked units
fn classify_cycle(graph: &DependencyGraph, remaining: &HashSet<NodeIndex>) -> CycleError {
    let inner = graph.inner();
    let mut sub: DiGraph<NodeIndex, ()> = DiGraph::new();
    let mut local = HashMap::new();
    for &n in remaining {
        local.insert(n, sub.add_node(n));
    }
    for &n in remaining {
        for succ in inner.neighbors_directed(n, Direction::Outgoing) {
            if let Some(&to) = local.get(&succ) {
                sub.add_edge(local[&n], to, ());
            }
        }
    }

    let mut members = BTreeSet::new();
    for component in tarjan_scc(&sub) {
        if component.len() > 1 {
            members.extend(component.into_iter().map(|i| inner[sub[i]].id.clone()));
        }
    }
    let blocked = remaining
        .iter()
        .map(|&n| inner[n].id.clone())
        .filter(|id| !members.contains(id))
        .collect();

    CycleError { members, blocked }
}

/// Depths computed so far; owned by the caller and scoped to one run
#[derive(Debug, Clone, Default)]
pub struct DepthMemo {
    depths: HashMap<NodeIndex, usize>,
}

impl DepthMemo {
    /// Create an empty memo
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized units
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    /// Check if nothing has been memoized yet
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

struct Frame {
    node: NodeIndex,
    expanded: bool,
}

/// Length of the longest dependency chain ending at `id`
///
/// A unit without dependencies has depth 1; otherwise the depth is one more
/// than the deepest dependency. Returns `Ok(None)` for ids not in the
/// graph. Traversal uses an explicit stack so deep graphs cannot overflow
/// the native stack.
pub fn depth(
    graph: &DependencyGraph,
    id: &UnitId,
    memo: &mut DepthMemo,
) -> Result<Option<usize>, CycleError> {
    let Some(start) = graph.index_of(id) else {
        return Ok(None);
    };
    let inner = graph.inner();

    let mut visiting: HashSet<NodeIndex> = HashSet::new();
    let mut stack = vec![Frame {
        node: start,
        expanded: false,
    }];

    while let Some(frame) = stack.last_mut() {
        let node = frame.node;

        if frame.expanded {
            stack.pop();
            visiting.remove(&node);
            let deepest = inner
                .neighbors_directed(node, Direction::Incoming)
                .filter_map(|p| memo.depths.get(&p).copied())
                .max()
                .unwrap_or(0);
            memo.depths.insert(node, deepest + 1);
            continue;
        }

        if memo.depths.contains_key(&node) {
            stack.pop();
            continue;
        }

        frame.expanded = true;
        visiting.insert(node);

        let preds: Vec<NodeIndex> = inner
            .neighbors_directed(node, Direction::Incoming)
            .filter(|p| !memo.depths.contains_key(p))
            .collect();
        for pred in preds {
            if visiting.contains(&pred) {
                return Err(cycle_on_path(graph, &stack, pred));
            }
            stack.push(Frame {
                node: pred,
                expanded: false,
            });
        }
    }

    Ok(memo.depths.get(&start).copied())
}

/// Build a cycle report from the active traversal path
///
/// The expanded frames form the path from the start unit towards its
/// dependencies; everything from `revisited` upward is the cycle and
/// everything before it depends on the cycle.
fn cycle_on_path(graph: &DependencyGraph, stack: &[Frame], revisited: NodeIndex) -> CycleError {
    let inner = graph.inner();
    let path: Vec<NodeIndex> = stack.iter().filter(|f| f.expanded).map(|f| f.node).collect();
    let split = path.iter().position(|&n| n == revisited).unwrap_or(0);

    let report = CycleError {
        members: path[split..].iter().map(|&n| inner[n].id.clone()).collect(),
        blocked: path[..split].iter().map(|&n| inner[n].id.clone()).collect(),
    };
    tracing::warn!("{report}");
    report
}

/// Group every unit of the graph by its depth
///
/// Units whose depth cannot be computed because of a cycle are left out
/// and reported together in the schedule's cycle error.
pub fn depth_levels(graph: &DependencyGraph) -> Schedule {
    let mut memo = DepthMemo::new();
    let mut by_depth: BTreeMap<usize, Vec<UnitId>> = BTreeMap::new();
    let mut cycle: Option<CycleError> = None;

    for id in graph.ids() {
        match depth(graph, &id, &mut memo) {
            Ok(Some(d)) => by_depth.entry(d).or_default().push(id),
            Ok(None) => {}
            Err(found) => {
                let merged = cycle.get_or_insert_with(|| CycleError {
                    members: BTreeSet::new(),
                    blocked: BTreeSet::new(),
                });
                merged.members.extend(found.members);
                merged.blocked.extend(found.blocked);
            }
        }
    }

    if let Some(report) = cycle.as_mut() {
        let members = report.members.clone();
        report.blocked.retain(|id| !members.contains(id));
    }

    let mut levels = BuildLevels::new();
    for (_, members) in by_depth {
        levels.push(members);
    }

    Schedule { levels, cycle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph;
    use crate::core::unit::Unit;

    fn unit(id: &str, deps: &[&str]) -> Unit {
        Unit {
            id: UnitId::new(id),
            names: vec![id.to_string()],
            version: "1-1".to_string(),
            dependencies: deps.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn ids(names: &[&str]) -> Vec<UnitId> {
        names.iter().map(|n| UnitId::new(*n)).collect()
    }

    #[test]
    fn test_simple_dependency_order() {
        let built = graph::build(vec![unit("app", &["lib"]), unit("lib", &[])]);
        let levels = schedule(&built.graph, &built.graph.ids()).into_result().unwrap();

        assert_eq!(levels.level_of(&"lib".into()), Some(1));
        assert_eq!(levels.level_of(&"app".into()), Some(2));
    }

    #[test]
    fn test_schedule_subgraph_ignores_outside_predecessors() {
        let built = graph::build(vec![
            unit("base", &[]),
            unit("mid", &["base"]),
            unit("top", &["mid"]),
        ]);
        let subset = BTreeSet::from([UnitId::new("mid"), UnitId::new("top")]);
        let levels = schedule(&built.graph, &subset).into_result().unwrap();

        assert_eq!(levels.level(1), Some(ids(&["mid"]).as_slice()));
        assert_eq!(levels.level(2), Some(ids(&["top"]).as_slice()));
        assert_eq!(levels.level_of(&"base".into()), None);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let built = graph::build(vec![
            unit("a", &["b"]),
            unit("b", &["c"]),
            unit("c", &["a"]),
            unit("user", &["c"]),
        ]);
        let result = schedule(&built.graph, &built.graph.ids());
        let cycle = result.cycle.expect("cycle must be reported");

        assert_eq!(cycle.members.len(), 3);
        assert!(cycle.blocked.contains(&UnitId::new("user")));
        assert!(result.levels.is_empty());
    }

    #[test]
    fn test_best_effort_appends_unscheduled() {
        let built = graph::build(vec![unit("a", &["b"]), unit("b", &["a"]), unit("c", &[])]);
        let levels = schedule(&built.graph, &built.graph.ids()).best_effort();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.level(1), Some(ids(&["c"]).as_slice()));
        assert_eq!(levels.level(2), Some(ids(&["a", "b"]).as_slice()));
    }

    #[test]
    fn test_depth_memoized() {
        let built = graph::build(vec![unit("a", &[]), unit("b", &["a"]), unit("c", &["b", "a"])]);
        let mut memo = DepthMemo::new();

        assert_eq!(depth(&built.graph, &"c".into(), &mut memo), Ok(Some(3)));
        assert_eq!(memo.len(), 3);
        assert_eq!(depth(&built.graph, &"a".into(), &mut memo), Ok(Some(1)));
        assert_eq!(depth(&built.graph, &"missing".into(), &mut memo), Ok(None));
    }

    #[test]
    fn test_depth_cycle_is_error() {
        let built = graph::build(vec![unit("a", &["b"]), unit("b", &["a"]), unit("c", &["a"])]);
        let mut memo = DepthMemo::new();

        let err = depth(&built.graph, &"c".into(), &mut memo).unwrap_err();
        assert_eq!(err.members, BTreeSet::from([UnitId::new("a"), UnitId::new("b")]));
        assert_eq!(err.blocked, BTreeSet::from([UnitId::new("c")]));
    }

    #[test]
    fn test_depth_of_long_chain_does_not_overflow() {
        let mut units = vec![unit("n0", &[])];
        for i in 1..20_000 {
            let prev = format!("n{}", i - 1);
            units.push(unit(&format!("n{i}"), &[prev.as_str()]));
        }
        let built = graph::build(units);
        let mut memo = DepthMemo::new();

        assert_eq!(
            depth(&built.graph, &"n19999".into(), &mut memo),
            Ok(Some(20_000))
        );
    }
}
