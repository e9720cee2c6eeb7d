//! Live-match services: registry, matchmaker, routing and the collaborator
//! contracts they call into.
//!
//! ## Control flow
//!
//! ```text
//! client command -> CommandRouter -> Matchmaker (join) / SessionRegistry (roll, move)
//!                -> MatchEngine (validate + mutate) -> effects
//!                -> Broadcaster (snapshots) / PersistenceGateway (link, finalize)
//! ```

pub mod broadcast;
pub mod gateway;
pub mod registry;
pub mod matchmaker;
pub mod router;

pub use broadcast::{Broadcaster, ChannelBroadcaster, Outbound, OutboundEvent};
pub use gateway::{InMemoryGateway, MatchRecord, PersistenceGateway};
pub use registry::{DiceFactory, MatchHandle, MatchSlot, RegistryBuilder, SessionRegistry};
pub use matchmaker::{JoinOutcome, Matchmaker};
pub use router::{CommandRouter, InboundCommand, Reply};
