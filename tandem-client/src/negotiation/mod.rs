pub mod action;
pub mod negotiator;
pub mod state;

pub use action::Action;
pub use negotiator::Negotiator;
pub use state::NegotiationState;
