//! The closed set of actor kinds the scheduler holds.

use cascade_types::{AgentId, AgentKind, AgentRecord, Condition, Position};

use crate::citizen::Citizen;
use crate::mover::Mover;
use crate::security::Security;
use crate::sensing::Sighting;

/// Any actor on (or temporarily off) the field.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Actor {
    /// A citizen.
    Citizen(Citizen),
    /// A security officer.
    Security(Security),
}

impl Actor {
    /// The actor's identifier.
    pub fn id(&self) -> AgentId {
        match self {
            Self::Citizen(c) => c.id(),
            Self::Security(s) => s.id(),
        }
    }

    /// Which population the actor belongs to.
    pub const fn kind(&self) -> AgentKind {
        match self {
            Self::Citizen(_) => AgentKind::Citizen,
            Self::Security(_) => AgentKind::Security,
        }
    }

    /// Committed condition. Security is always [`Condition::Security`].
    pub const fn condition(&self) -> Condition {
        match self {
            Self::Citizen(c) => c.condition(),
            Self::Security(_) => Condition::Security,
        }
    }

    /// Current cell, `None` while jailed.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Citizen(c) => c.position(),
            Self::Security(s) => s.position(),
        }
    }

    /// What a neighbor sees when looking at this actor.
    pub fn sighting(&self) -> Sighting {
        match self {
            Self::Citizen(c) => Sighting::Citizen {
                condition: c.condition(),
                activation: c.activation(),
            },
            Self::Security(_) => Sighting::Security,
        }
    }

    /// Reporting snapshot.
    pub fn to_record(&self) -> AgentRecord {
        match self {
            Self::Citizen(c) => c.to_record(),
            Self::Security(s) => s.to_record(),
        }
    }

    /// The citizen inside, if any.
    pub const fn as_citizen(&self) -> Option<&Citizen> {
        match self {
            Self::Citizen(c) => Some(c),
            Self::Security(_) => None,
        }
    }

    /// The officer inside, if any.
    pub const fn as_security(&self) -> Option<&Security> {
        match self {
            Self::Security(s) => Some(s),
            Self::Citizen(_) => None,
        }
    }
}

impl From<Citizen> for Actor {
    fn from(c: Citizen) -> Self {
        Self::Citizen(c)
    }
}

impl From<Security> for Actor {
    fn from(s: Security) -> Self {
        Self::Security(s)
    }
}

#[cfg(test)]
mod tests {
    use cascade_types::MoveMode;

    use super::*;
    use crate::citizen::CitizenTraits;

    #[test]
    fn sighting_reflects_committed_condition() {
        let c = Citizen::new(
            AgentId::new(1),
            None,
            1,
            MoveMode::Moore,
            CitizenTraits::new(0.0, 0.0, 1.0, 2.0),
        )
        .with_condition(Condition::Oppose);
        let actor = Actor::from(c);
        assert_eq!(actor.kind(), AgentKind::Citizen);
        assert_eq!(
            actor.sighting(),
            Sighting::Citizen {
                condition: Condition::Oppose,
                activation: None
            }
        );
    }

    #[test]
    fn security_is_always_security() {
        let actor = Actor::from(Security::new(AgentId::new(2), None, 3, MoveMode::Moore, 0.1));
        assert_eq!(actor.condition(), Condition::Security);
        assert_eq!(actor.sighting(), Sighting::Security);
        assert!(actor.as_citizen().is_none());
        assert!(actor.as_security().is_some());
    }
}
