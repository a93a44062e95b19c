//! What an actor can see of its neighbors.
//!
//! Actors never hold references to each other. During a phase they read
//! other actors through a [`NeighborView`], which exposes only the public,
//! committed facts: the actor kind, the condition, and (for Oppose arrest
//! eligibility) the citizen's last activation.

use std::collections::BTreeMap;

use cascade_types::{AgentId, Condition};

/// The public face of one neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sighting {
    /// A citizen with its committed condition.
    Citizen {
        /// Committed condition at the time of the read.
        condition: Condition,
        /// `sigmoid(opinion)` from the citizen's latest decide phase.
        activation: Option<f64>,
    },
    /// A security officer.
    Security,
}

/// Read-only lookup from actor id to its public face.
pub trait NeighborView {
    /// The sighting for `id`, or `None` if no such actor is registered.
    fn sighting(&self, id: AgentId) -> Option<Sighting>;
}

impl NeighborView for BTreeMap<AgentId, Sighting> {
    fn sighting(&self, id: AgentId) -> Option<Sighting> {
        self.get(&id).copied()
    }
}

/// Counts of visible neighbor types, with the observer itself counted
/// once as Active and once as Support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NeighborCensus {
    /// Active citizens, self included.
    pub actives: u32,
    /// Opposing citizens.
    pub opposed: u32,
    /// Supporting citizens, self included.
    pub support: u32,
    /// Security officers.
    pub security: u32,
}

impl NeighborCensus {
    /// The census of an observer that sees nobody.
    pub const fn baseline() -> Self {
        Self {
            actives: 1,
            opposed: 0,
            support: 1,
            security: 0,
        }
    }

    /// Tally the given neighbors on top of the baseline.
    ///
    /// Unknown ids and jailed citizens contribute nothing.
    pub fn tally<V: NeighborView + ?Sized>(neighbors: &[AgentId], view: &V) -> Self {
        let mut census = Self::baseline();
        for &id in neighbors {
            match view.sighting(id) {
                Some(Sighting::Citizen { condition, .. }) => match condition {
                    Condition::Active => census.actives = census.actives.saturating_add(1),
                    Condition::Oppose => census.opposed = census.opposed.saturating_add(1),
                    Condition::Support => census.support = census.support.saturating_add(1),
                    Condition::Jailed | Condition::Security => {}
                },
                Some(Sighting::Security) => census.security = census.security.saturating_add(1),
                None => {}
            }
        }
        census
    }
}

impl Default for NeighborCensus {
    fn default() -> Self {
        Self::baseline()
    }
}
