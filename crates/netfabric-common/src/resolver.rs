//! Topology resolver.
//!
//! Derives concrete roles from a fabric snapshot. Both the plan builder and
//! the verification battery go through these functions, so "what should be
//! true" is computed the same way in both paths. Nothing here performs I/O.

use netfabric_types::{FabricTopology, SpanningTreeRoot, Switch, SwitchPair};

use crate::error::{FabricError, FabricResult};

/// Kind of the resolved spanning-tree root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Pair,
    Switch,
}

/// Resolved spanning-tree root bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSelection<'a> {
    Pair(&'a SwitchPair),
    Switch(&'a Switch),
    /// No root configured; kind, bridge and name are all absent.
    None,
}

impl<'a> RootSelection<'a> {
    pub fn kind(&self) -> Option<RootKind> {
        match self {
            RootSelection::Pair(_) => Some(RootKind::Pair),
            RootSelection::Switch(_) => Some(RootKind::Switch),
            RootSelection::None => None,
        }
    }

    /// Pair name or switch device name of the root bridge.
    pub fn bridge_name(&self) -> Option<&'a str> {
        match self {
            RootSelection::Pair(pair) => Some(pair.name.as_str()),
            RootSelection::Switch(switch) => Some(switch.device.as_str()),
            RootSelection::None => None,
        }
    }

    /// Member switches of the root bridge: both pair members, the singleton,
    /// or nothing.
    pub fn members(&self) -> Vec<&'a Switch> {
        match self {
            RootSelection::Pair(pair) => pair.switches.iter().collect(),
            RootSelection::Switch(switch) => vec![*switch],
            RootSelection::None => Vec::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RootSelection::None)
    }
}

/// Resolves the configured spanning-tree root of a fabric.
///
/// A root naming an element that does not exist resolves to `None`;
/// [`FabricTopology::validate`] reports that case as a model error.
pub fn resolve_spanning_tree_root(topology: &FabricTopology) -> RootSelection<'_> {
    match &topology.spanning_tree_root {
        SpanningTreeRoot::SwitchPair(name) => topology
            .switch_pair(name)
            .map_or(RootSelection::None, RootSelection::Pair),
        SpanningTreeRoot::Switch(device) => topology
            .switch(device)
            .map_or(RootSelection::None, RootSelection::Switch),
        SpanningTreeRoot::Unset => RootSelection::None,
    }
}

/// Returns true if `device` is a member of the resolved root bridge.
pub fn is_root_bridge(device: &str, root: &RootSelection<'_>) -> bool {
    match root {
        RootSelection::Pair(pair) => pair.contains_device(device),
        RootSelection::Switch(switch) => switch.device == device,
        RootSelection::None => false,
    }
}

/// Returns the layer-3 switch-pair of a fabric, if one is configured.
pub fn resolve_layer3_pair(topology: &FabricTopology) -> Option<&SwitchPair> {
    topology.switch_pairs.iter().find(|pair| pair.layer3)
}

/// Returns the layer-3 switch-pair, failing when a dependent feature needs
/// one and the fabric has none.
pub fn require_layer3_pair(topology: &FabricTopology) -> FabricResult<&SwitchPair> {
    resolve_layer3_pair(topology).ok_or_else(|| {
        FabricError::configuration(format!(
            "fabric {} has no layer3 switch-pair configured",
            topology.name
        ))
    })
}

/// Suggests a root bridge when none is configured.
///
/// Heuristic: among the switch-pairs (or, when there are none, the standalone
/// switches) the one with the most fabric trunks wins; ties go to the first
/// in model order. This is a greedy pick, not an optimal placement.
pub fn select_best_root_candidate(topology: &FabricTopology) -> RootSelection<'_> {
    if !topology.switch_pairs.is_empty() {
        return first_max_by_trunks(&topology.switch_pairs, |pair| pair.fabric_trunks.len())
            .map_or(RootSelection::None, RootSelection::Pair);
    }
    first_max_by_trunks(&topology.switches, |switch| switch.fabric_trunks.len())
        .map_or(RootSelection::None, RootSelection::Switch)
}

// Iterator::max_by_key keeps the last maximum; ties here go to the first.
fn first_max_by_trunks<T>(items: &[T], trunks: impl Fn(&T) -> usize) -> Option<&T> {
    let mut best: Option<(&T, usize)> = None;
    for item in items {
        let count = trunks(item);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}
