//! Actors of the Resistance Cascade simulation.
//!
//! Citizens decide between Support, Oppose and Active from what they see
//! around them; Security officers arrest the most visible dissenters. Both
//! sense and move through the shared [`Mover`] capability and read their
//! neighbors only through a [`NeighborView`], so no actor ever holds a
//! reference to another.

pub mod actor;
pub mod citizen;
pub mod context;
pub mod error;
pub mod mover;
pub mod sampling;
pub mod security;
pub mod sensing;

pub use actor::Actor;
pub use citizen::{Citizen, CitizenOutcome, CitizenTraits, Decision, TraitDistribution, evaluate};
pub use context::StepContext;
pub use error::AgentError;
pub use mover::Mover;
pub use security::{Arrest, Security};
pub use sensing::{NeighborCensus, NeighborView, Sighting};
