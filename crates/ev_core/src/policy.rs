//! Charging policies: which waiting vehicle is served next.
//!
//! A policy is stateless and works on a slice of candidates given in arrival
//! order (earliest first). [`crate::storage::StationStorage`] delegates its
//! pop/peek ordering to the policy it was built with, so the policy is the
//! single authority on service order at a station.

use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

/// Ranks charging candidates.
///
/// # Examples
///
/// ```
/// use bevy_ecs::prelude::Entity;
/// use ev_core::policy::{ChargingPolicy, Lifo};
///
/// let waiting = [Entity::from_raw(1), Entity::from_raw(2), Entity::from_raw(3)];
/// assert_eq!(Lifo.next_vehicle_to_charge(&waiting), Some(Entity::from_raw(3)));
/// ```
pub trait ChargingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Index into `vehicles` of the candidate to serve first, `None` when empty.
    fn next_index(&self, vehicles: &[Entity]) -> Option<usize>;

    /// Candidates in service order, head first.
    fn vehicles_to_charge(&self, vehicles: &[Entity]) -> Vec<Entity>;

    fn next_vehicle_to_charge(&self, vehicles: &[Entity]) -> Option<Entity> {
        self.next_index(vehicles).map(|i| vehicles[i])
    }

    /// At most `number` candidates in service order.
    fn take_vehicles(&self, vehicles: &[Entity], number: usize) -> Vec<Entity> {
        let mut ordered = self.vehicles_to_charge(vehicles);
        ordered.truncate(number);
        ordered
    }
}

/// Earliest arrival first; arrival order is never reshuffled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fifo;

/// Most recent arrival first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifo;

impl ChargingPolicy for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn next_index(&self, vehicles: &[Entity]) -> Option<usize> {
        (!vehicles.is_empty()).then_some(0)
    }

    fn vehicles_to_charge(&self, vehicles: &[Entity]) -> Vec<Entity> {
        vehicles.to_vec()
    }
}

impl ChargingPolicy for Lifo {
    fn name(&self) -> &'static str {
        "LIFO"
    }

    fn next_index(&self, vehicles: &[Entity]) -> Option<usize> {
        vehicles.len().checked_sub(1)
    }

    fn vehicles_to_charge(&self, vehicles: &[Entity]) -> Vec<Entity> {
        vehicles.iter().rev().copied().collect()
    }
}

/// Policy selector, chosen when a station is built.
///
/// `DualStack` is a storage arrangement rather than a pure ordering: see
/// [`crate::storage::DualStack`]. Inside each of its stacks the newest
/// vehicle is served first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChargingPolicyKind {
    #[default]
    Fifo,
    Lifo,
    #[serde(rename = "DUAL_STACK", alias = "DUALSTACK")]
    DualStack,
}

impl ChargingPolicyKind {
    pub const ALL: [ChargingPolicyKind; 3] = [
        ChargingPolicyKind::Fifo,
        ChargingPolicyKind::Lifo,
        ChargingPolicyKind::DualStack,
    ];

    /// Ordering applied to a single list of candidates.
    pub fn policy(self) -> &'static dyn ChargingPolicy {
        match self {
            ChargingPolicyKind::Fifo => &Fifo,
            ChargingPolicyKind::Lifo | ChargingPolicyKind::DualStack => &Lifo,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChargingPolicyKind::DualStack => "DUAL_STACK",
            kind => kind.policy().name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicles(n: u32) -> Vec<Entity> {
        (1..=n).map(Entity::from_raw).collect()
    }

    #[test]
    fn fifo_keeps_arrival_order() {
        let v = vehicles(3);
        assert_eq!(Fifo.vehicles_to_charge(&v), v);
        assert_eq!(Fifo.next_vehicle_to_charge(&v), Some(v[0]));
    }

    #[test]
    fn lifo_reverses_arrival_order() {
        let v = vehicles(3);
        assert_eq!(Lifo.vehicles_to_charge(&v), vec![v[2], v[1], v[0]]);
        assert_eq!(Lifo.next_vehicle_to_charge(&v), Some(v[2]));
    }

    #[test]
    fn empty_candidates_have_no_next_vehicle() {
        for kind in ChargingPolicyKind::ALL {
            let policy = kind.policy();
            assert_eq!(policy.next_vehicle_to_charge(&[]), None);
            assert!(policy.vehicles_to_charge(&[]).is_empty());
        }
    }

    #[test]
    fn take_vehicles_caps_the_selection() {
        let v = vehicles(5);
        assert_eq!(Lifo.take_vehicles(&v, 2), vec![v[4], v[3]]);
        assert_eq!(Fifo.take_vehicles(&v, 2), vec![v[0], v[1]]);
        assert_eq!(Fifo.take_vehicles(&v, 10).len(), 5);
    }

    #[test]
    fn kind_deserializes_from_uppercase_names() {
        let kind: ChargingPolicyKind = serde_json::from_str("\"LIFO\"").expect("parse");
        assert_eq!(kind, ChargingPolicyKind::Lifo);
        assert_eq!(kind.name(), "LIFO");
        assert_eq!(ChargingPolicyKind::default().name(), "FIFO");

        let dual: ChargingPolicyKind = serde_json::from_str("\"DUAL_STACK\"").expect("parse");
        assert_eq!(dual, ChargingPolicyKind::DualStack);
        assert_eq!(dual.name(), "DUAL_STACK");
        assert_eq!(serde_json::to_string(&dual).expect("write"), "\"DUAL_STACK\"");
    }
}
