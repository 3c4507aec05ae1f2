//! Transition engine: scripted mix profiles, the adaptive smart
//! strategy, and the runner that drives a session against the decks.

pub mod curve;
pub mod runner;
pub mod scripted;
pub mod session;
pub mod smart;
pub mod types;

pub use runner::{energy_channel, DeckActuator, TransitionError, TransitionRunner, TICK_INTERVAL};
pub use scripted::ScriptedProfile;
pub use session::TransitionSession;
pub use smart::{SmartConfig, SmartPhase, SmartStrategy};
pub use types::{ControlSnapshot, DeckId, EqSettings, Strategy};
