use wfcore::ac::agent::Agent;

pub mod builder;
pub mod error;
pub mod simple;
#[cfg(feature = "casbin")]
pub mod casbin;

pub use builder::Builder;
use error::Error;

/// Answers whether an agent may carry out an action on a resource.
///
/// Resources are the string form of an `EntityRef` and actions are
/// permission codenames.
pub trait Enforcer: Send + Sync {
    fn enforce(&self, agent: &Agent, res: &str, action: &str) -> Result<bool, Error>;
}
