//! Post-submission fill verification.

use rust_decimal::Decimal;
use tokio::time::Duration;

use crate::polymarket::ClobClient;

/// Time the exchange gets to settle a fill-and-kill order before lookup.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What the exchange reports for a submitted close order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Some or all of the order filled.
    Filled {
        size: Decimal,
        price: Option<Decimal>,
    },
    /// The order matched nothing.
    NoFill,
    /// The lookup failed; the fill state is unknown and must be re-checked
    /// on the next pass.
    Unknown,
}

/// Look the order up by id and classify the result. Does not sleep; callers
/// wait [`SETTLE_DELAY`] after submission first.
pub async fn verify_fill(clob: &ClobClient, exchange_order_id: &str) -> FillOutcome {
    let lookup = match clob.lookup_order(exchange_order_id).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(
                exchange_order_id,
                error = %e,
                "Order lookup failed — fill state unknown"
            );
            return FillOutcome::Unknown;
        }
    };

    let filled = lookup.size_matched.unwrap_or(Decimal::ZERO);
    if filled <= Decimal::ZERO {
        return FillOutcome::NoFill;
    }

    FillOutcome::Filled {
        size: filled,
        price: lookup.price,
    }
}
