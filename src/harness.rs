//! Parser for the regression-test text action format described in spec.md
//! §6 (`A`/`M`/`C`/`R` lines). This is deliberately kept outside the
//! matching engine's own module boundary — the engine never parses text,
//! only the ambient tooling (`bin/cli.rs`, `tests/harness_scenarios.rs`)
//! does. Grounded in `examples/original_source/Testing/test.cpp`'s
//! `InputHandler`.

use std::str::FromStr;

use crate::engine::OrderModify;
use crate::errors::ParseError;
use crate::order::Order;
use crate::types::{OrderId, OrderType, Price, Quantity, Side};

#[derive(Debug, Clone)]
pub enum Action {
    Add(Order),
    Modify(OrderModify),
    Cancel(OrderId),
}

/// The trailing expectation line: final order count and per-side level
/// counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedResult {
    pub total_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
}

/// A fully parsed scenario: the actions to apply in order, and the
/// expectation to check afterward.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub actions: Vec<Action>,
    pub expected: ExpectedResult,
}

/// Parses the full text of a scenario file. Blank line or EOF terminates;
/// the trailing `R` line is required and must be the last non-blank line.
pub fn parse(text: &str) -> Result<Scenario, ParseError> {
    let mut actions = Vec::new();
    let mut expected = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();
        if line.is_empty() {
            break;
        }
        if expected.is_some() {
            return Err(ParseError::ResultNotLast);
        }
        if line.starts_with('R') {
            expected = Some(parse_result(line, line_no)?);
        } else {
            actions.push(parse_action(line, line_no)?);
        }
    }

    let expected = expected.ok_or(ParseError::MissingResult)?;
    Ok(Scenario { actions, expected })
}

fn parse_action(line: &str, line_no: usize) -> Result<Action, ParseError> {
    let fields: Vec<&str> = line.split(' ').collect();
    match fields.first().copied() {
        Some("A") => {
            if fields.len() != 6 {
                return Err(invalid(line, line_no));
            }
            let side = parse_side(fields[1], line_no)?;
            let order_type = parse_order_type(fields[2], line_no)?;
            let price = parse_price(fields[3], line_no)?;
            let quantity = parse_number::<Quantity>(fields[4], line_no, "quantity")?;
            let order_id = parse_number::<OrderId>(fields[5], line_no, "order id")?;
            let order = if order_type == OrderType::Market {
                Order::market(order_id, side, quantity)
            } else {
                Order::new(order_type, order_id, side, price, quantity)
            };
            Ok(Action::Add(order))
        }
        Some("M") => {
            if fields.len() != 5 {
                return Err(invalid(line, line_no));
            }
            let order_id = parse_number::<OrderId>(fields[1], line_no, "order id")?;
            let side = parse_side(fields[2], line_no)?;
            let price = parse_price(fields[3], line_no)?;
            let quantity = parse_number::<Quantity>(fields[4], line_no, "quantity")?;
            Ok(Action::Modify(OrderModify { order_id, side, price, quantity }))
        }
        Some("C") => {
            if fields.len() != 2 {
                return Err(invalid(line, line_no));
            }
            let order_id = parse_number::<OrderId>(fields[1], line_no, "order id")?;
            Ok(Action::Cancel(order_id))
        }
        _ => Err(invalid(line, line_no)),
    }
}

fn parse_result(line: &str, line_no: usize) -> Result<ExpectedResult, ParseError> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() != 4 {
        return Err(invalid(line, line_no));
    }
    Ok(ExpectedResult {
        total_orders: parse_number::<u64>(fields[1], line_no, "total orders")? as usize,
        bid_levels: parse_number::<u64>(fields[2], line_no, "bid level count")? as usize,
        ask_levels: parse_number::<u64>(fields[3], line_no, "ask level count")? as usize,
    })
}

fn parse_side(field: &str, line_no: usize) -> Result<Side, ParseError> {
    match field {
        "B" => Ok(Side::Buy),
        "S" => Ok(Side::Sell),
        other => Err(ParseError::InvalidField {
            line: line_no,
            reason: format!("invalid side `{other}`"),
        }),
    }
}

fn parse_order_type(field: &str, line_no: usize) -> Result<OrderType, ParseError> {
    match field {
        "GoodTillCancel" => Ok(OrderType::GoodTillCancel),
        "GoodForDay" => Ok(OrderType::GoodForDay),
        "FillAndKill" => Ok(OrderType::FillAndKill),
        "FillOrKill" => Ok(OrderType::FillOrKill),
        "Market" => Ok(OrderType::Market),
        other => Err(ParseError::InvalidField {
            line: line_no,
            reason: format!("invalid order type `{other}`"),
        }),
    }
}

/// Prices must be non-negative (spec.md §6; mirrors
/// `examples/original_source/Testing/test.cpp:38`'s blanket `value < 0`
/// rejection). `Quantity`/`OrderId` reject negatives naturally via their
/// unsigned types, so only the signed `Price` needs an explicit check.
fn parse_price(field: &str, line_no: usize) -> Result<Price, ParseError> {
    let price = parse_number::<Price>(field, line_no, "price")?;
    if price < 0 {
        return Err(ParseError::InvalidField {
            line: line_no,
            reason: format!("invalid price: `{field}` must be non-negative"),
        });
    }
    Ok(price)
}

fn parse_number<T: FromStr>(field: &str, line_no: usize, what: &str) -> Result<T, ParseError> {
    if field.is_empty() {
        return Err(ParseError::InvalidField {
            line: line_no,
            reason: format!("invalid {what}: empty field"),
        });
    }
    field.parse::<T>().map_err(|_| ParseError::InvalidField {
        line: line_no,
        reason: format!("invalid {what}: `{field}`"),
    })
}

fn invalid(line: &str, line_no: usize) -> ParseError {
    ParseError::InvalidAction { line: line_no, text: line.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_modify_cancel_and_result() {
        let text = "A B GoodTillCancel 100 10 1\nM 1 B 101 10\nC 1\nR 0 0 0\n";
        let scenario = parse(text).unwrap();
        assert_eq!(scenario.actions.len(), 3);
        assert_eq!(
            scenario.expected,
            ExpectedResult { total_orders: 0, bid_levels: 0, ask_levels: 0 }
        );
    }

    #[test]
    fn missing_result_line_errors() {
        let text = "A B GoodTillCancel 100 10 1\n";
        assert!(matches!(parse(text), Err(ParseError::MissingResult)));
    }

    #[test]
    fn result_not_last_errors() {
        let text = "R 0 0 0\nA B GoodTillCancel 100 10 1\n";
        assert!(matches!(parse(text), Err(ParseError::ResultNotLast)));
    }

    #[test]
    fn unknown_action_token_errors() {
        let text = "X 1 2 3\nR 0 0 0\n";
        assert!(matches!(parse(text), Err(ParseError::InvalidAction { .. })));
    }

    #[test]
    fn negative_price_is_rejected() {
        let text = "A B GoodTillCancel -5 10 1\nR 1 1 0\n";
        assert!(matches!(parse(text), Err(ParseError::InvalidField { .. })));

        let text = "M 1 B -5 10\nR 1 1 0\n";
        assert!(matches!(parse(text), Err(ParseError::InvalidField { .. })));
    }
}
