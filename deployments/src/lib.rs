//! Task-based deployment engine for the protocol's contracts.
//!
//! A [`task::Task`] is a named deployment unit bound to a network and a
//! [`mode::TaskMode`]. Its input may reference the outputs of previously
//! deployed tasks, and its own outputs are persisted per network by the
//! [`store::OutputStore`] so that re-running a task is idempotent.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifact;
pub mod catalog;
pub mod client;
pub mod constants;
pub mod dispatcher;
pub mod errors;
pub mod input;
pub mod mode;
pub mod network;
pub mod reference;
pub mod settings;
pub mod store;
pub mod task;
pub mod verifier;

pub use catalog::{RunOptions, TaskCatalog, TaskDefinition};
pub use errors::DeployError;
pub use input::{Input, Param, RawInput};
pub use mode::TaskMode;
pub use network::Network;
pub use reference::TaskRef;
pub use task::{DeployOptions, OutputQuery, Task, TaskEnv};
