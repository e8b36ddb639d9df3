//! Form flow — the multi-step conversation that collects a form one
//! field at a time.
//!
//! A flow is a cursor over the field catalog plus the answers gathered
//! so far. The state machine in [`machine`] advances it one inbound
//! message at a time; the store in [`store`] keeps live flows keyed by
//! conversation and serializes concurrent mutations per conversation.

pub mod machine;
pub mod routes;
pub mod state;
pub mod store;

pub use machine::{Decision, InvalidReason, advance};
pub use routes::{FlowRouteState, flow_routes};
pub use state::{AnswerEvent, ConversationFlow, FlowState};
pub use store::FlowStore;
