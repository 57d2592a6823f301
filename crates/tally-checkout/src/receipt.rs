//! # Checkout Receipt
//!
//! Flat, serializable view of a committed checkout for transports and the
//! CLI.
//!
//! ```json
//! {
//!   "lines": [
//!     { "serial": "43N23P", "name": "MacBook Pro", "quantity": 1,
//!       "unit_price_cents": 539999, "subtotal_cents": 539999 },
//!     { "serial": "234234", "name": "Raspberry Pi B", "quantity": 1,
//!       "unit_price_cents": 3000, "subtotal_cents": 0 }
//!   ],
//!   "total_items": 2,
//!   "total_price_cents": 539999,
//!   "total_price": "$5399.99"
//! }
//! ```

use serde::Serialize;
use tally_core::{Checkout, CheckoutLine, Money};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub serial: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: Money,
    pub subtotal_cents: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub lines: Vec<ReceiptLine>,
    pub total_items: i64,
    pub total_price_cents: Money,
    /// Display form of the total, e.g. `$5399.99`.
    pub total_price: String,
}

impl From<&CheckoutLine> for ReceiptLine {
    fn from(line: &CheckoutLine) -> Self {
        ReceiptLine {
            serial: line.product.serial.clone(),
            name: line.product.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.product.price(),
            subtotal_cents: line.subtotal,
        }
    }
}

impl From<&Checkout> for CheckoutReceipt {
    fn from(checkout: &Checkout) -> Self {
        CheckoutReceipt {
            lines: checkout.lines.iter().map(ReceiptLine::from).collect(),
            total_items: checkout.total_items,
            total_price_cents: checkout.total_price,
            total_price: checkout.total_price.to_string(),
        }
    }
}
