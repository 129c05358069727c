//! Issuance core: cost model, transaction assembly and the handler that
//! carries a payload from balance check to broadcast.

pub mod builder;
pub mod cost;
pub mod error;
pub mod factory;
pub mod handler;
pub mod stage;

#[cfg(test)]
mod test_utils;

pub use builder::TransactionBuilder;
pub use cost::CostConstants;
pub use error::{CoreError, IssueError};
pub use factory::instantiate_handler;
pub use handler::TransactionHandler;
pub use stage::IssuanceStage;
