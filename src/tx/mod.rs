//! Transfer module: fee model, request validation and submission

mod fee;
mod request;
mod submitter;

pub use fee::{FeeModel, FeeQuote, PriorityTier, RoundingMode, BASE_FEE};
pub use request::{parse_amount, TransferForm, TransferRequest};
pub use submitter::{
    build_transfer, SuccessCallback, TransactionSubmitter, TransferPhase, TransferStatus,
    TransferSummary,
};
