//! Core logic of the audit desk.
//!
//! Holds the quote cart, the record status lifecycle and the workflows that
//! drive the REST backend on the operator's behalf. Everything stateful is an
//! explicit context object assembled by [`builder::DeskBuilder`].

pub mod builder;
pub mod cart;
pub mod fetch;
pub mod lifecycle;
pub mod search;
pub mod session;
pub mod workflow;

pub use builder::{BuilderError, Desk, DeskBuilder, DeskFactories};
pub use cart::{CartStore, CartSubmission, QuoteCart};
pub use fetch::FetchScope;
pub use lifecycle::LifecycleError;
pub use search::Debouncer;
pub use session::{Session, SessionError, SessionStore};
pub use workflow::{RecordWorkflow, WorkflowError, WorkflowOutcome};
