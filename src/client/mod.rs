//! Client side of the search page: calls the proxy endpoints in order and
//! renders what comes back.

pub mod orchestrator;
pub mod page;
pub mod proxy;

pub use orchestrator::{FailureKind, Orchestrator, SearchState};
pub use page::Page;
pub use proxy::{ClientError, HttpProxy, ProxyApi};
