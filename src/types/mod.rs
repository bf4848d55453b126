//! Shared data types for the derivation + validation pipeline (component H).

pub mod deposit;
pub mod l1;
pub mod l2;
pub mod operation;
pub mod validation;

pub use deposit::DepositTransaction;
pub use l1::{L1Block, L1Log, L1Transaction};
pub use l2::EthscriptionsBlock;
pub use operation::{Operation, OperationSource};
pub use validation::ValidationResult;
