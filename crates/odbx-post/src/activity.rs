//! Which elements and nodes of an instance are active in a frame.

use std::collections::{BTreeMap, BTreeSet};

use odbx_model::{FieldOutput, Instance, Position};

/// Status above which an element counts as present
pub const STATUS_THRESHOLD: f64 = 0.5;

/// Preferred sample positions for stress, best first
pub const STRESS_POSITIONS: [Position; 2] = [Position::IntegrationPoint, Position::ElementNodal];

/// First supported position that has any value in `field`
pub fn select_stress_position(field: &FieldOutput) -> Option<Position> {
    STRESS_POSITIONS
        .into_iter()
        .find(|&position| field.has_position(position))
}

/// Mean status per element of one instance.
///
/// Values without an element label or without data are ignored. An empty map
/// means the instance has no usable status output.
pub fn element_status(status: &FieldOutput, instance: &str) -> BTreeMap<i32, f64> {
    let mut sums = BTreeMap::<i32, (f64, usize)>::new();
    for value in status.values_for(instance) {
        let (Some(label), Some(&flag)) = (value.element_label, value.data.first()) else {
            continue;
        };
        let entry = sums.entry(label).or_insert((0.0, 0));
        entry.0 += flag;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(label, (sum, n))| (label, sum / n.max(1) as f64))
        .collect()
}

/// Active elements among those that reported stress.
///
/// Without status data every stress element is active. With status data an
/// element must also have a mean status above [`STATUS_THRESHOLD`]; a stress
/// element with no status value at all is treated as removed.
pub fn active_elements<I>(stress_elements: I, status: Option<&BTreeMap<i32, f64>>) -> BTreeSet<i32>
where
    I: IntoIterator<Item = i32>,
{
    let stress_elements = stress_elements.into_iter();
    match status {
        Some(status) if !status.is_empty() => stress_elements
            .filter(|label| status.get(label).is_some_and(|&s| s > STATUS_THRESHOLD))
            .collect(),
        _ => stress_elements.collect(),
    }
}

/// Nodes of the active elements that the instance actually defines
pub fn active_nodes(instance: &Instance, active: &BTreeSet<i32>) -> BTreeSet<i32> {
    active
        .iter()
        .filter_map(|label| instance.elements.get(label))
        .flat_map(|element| element.connectivity.iter().copied())
        .filter(|node| instance.nodes.contains_key(node))
        .collect()
}
