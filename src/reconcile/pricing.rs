//! Close-size and limit-price arithmetic for reduce-only orders.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::Side;

/// Order sizes are placed in 0.01-share steps.
fn size_step() -> Decimal {
    Decimal::new(1, 2)
}

/// How much of the follower's position to close for a given fraction,
/// floored to the size step. Never exceeds the position itself.
pub fn close_size(follower_size: Decimal, fraction: Decimal) -> Decimal {
    let raw = (follower_size * fraction).min(follower_size);
    let step = size_step();
    (raw / step).floor() * step
}

/// Limit price for a close order: the market price shifted against the
/// follower by `slippage_pct` percent (selling below market, buying above),
/// snapped to the market's tick size, and clamped into the valid price band.
///
/// Tick snapping rounds half away from zero.
pub fn limit_price(
    market_price: Decimal,
    close_side: Side,
    slippage_pct: Decimal,
    tick_size: Decimal,
) -> Decimal {
    let shift = market_price * slippage_pct / Decimal::ONE_HUNDRED;
    let shifted = match close_side {
        Side::Sell => market_price - shift,
        Side::Buy => market_price + shift,
    };

    let snapped = (shifted / tick_size)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        * tick_size;

    snapped.clamp(tick_size, Decimal::ONE - tick_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn proportional_close_size() {
        // A 40% trader reduction applied to a 50-share holding.
        assert_eq!(close_size(Decimal::from(50), dec("0.4")), Decimal::from(20));
    }

    #[test]
    fn close_size_never_exceeds_position() {
        assert_eq!(close_size(Decimal::from(40), Decimal::ONE), Decimal::from(40));
    }

    #[test]
    fn close_size_floors_to_step() {
        assert_eq!(close_size(dec("10.555"), Decimal::ONE), dec("10.55"));
        assert_eq!(close_size(dec("0.009"), Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn sell_limit_price_shifts_down_and_snaps() {
        // Price 0.70, 2% slippage, tick 0.01.
        // 0.70 * 0.98 = 0.686 -> 0.69 after half-away-from-zero snapping.
        assert_eq!(
            limit_price(dec("0.70"), Side::Sell, Decimal::TWO, dec("0.01")),
            dec("0.69")
        );
    }

    #[test]
    fn buy_limit_price_shifts_up() {
        // Closing a SELL: buy above market. 0.30 * 1.02 = 0.306 -> 0.31.
        assert_eq!(
            limit_price(dec("0.30"), Side::Buy, Decimal::TWO, dec("0.01")),
            dec("0.31")
        );
    }

    #[test]
    fn limit_price_clamps_into_valid_band() {
        assert_eq!(
            limit_price(dec("0.005"), Side::Sell, Decimal::TWO, dec("0.01")),
            dec("0.01")
        );
        assert_eq!(
            limit_price(dec("0.999"), Side::Buy, Decimal::TWO, dec("0.01")),
            dec("0.99")
        );
    }

    #[test]
    fn finer_tick_sizes_snap_correctly() {
        // 0.515 * 0.98 = 0.5047 -> 0.505 at tick 0.005.
        assert_eq!(
            limit_price(dec("0.515"), Side::Sell, Decimal::TWO, dec("0.005")),
            dec("0.505")
        );
    }
}
