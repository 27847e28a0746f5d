use thiserror::Error;

use crate::types::OrderId;

/// Client-input rejections the engine recognizes. Never returned to the
/// caller as an `Err` — the public API reports rejection by returning an
/// empty trade vector or doing nothing, per spec.md §7 kind 2. Logged at
/// `tracing::debug!` for operability.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("order {0} already exists")]
    DuplicateOrderId(OrderId),
    #[error("market order {0} has no opposite-side liquidity to rest against")]
    MarketNoLiquidity(OrderId),
    #[error("fill-and-kill order {0} could not match immediately")]
    FillAndKillNoMatch(OrderId),
    #[error("fill-or-kill order {0} cannot be fully filled at its limit")]
    FillOrKillInfeasible(OrderId),
}

/// Parse error for the text-format test harness (§6). Not used by the core
/// engine; only `bin/cli.rs` propagates these.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: invalid action `{text}`")]
    InvalidAction { line: usize, text: String },
    #[error("line {line}: {reason}")]
    InvalidField { line: usize, reason: String },
    #[error("result line (`R ...`) must be the last line of the file")]
    ResultNotLast,
    #[error("file has no trailing result line")]
    MissingResult,
}
