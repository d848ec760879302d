//! Decides, from two trader position-size readings, what fraction of the
//! follower's matching position should be closed.

use rust_decimal::Decimal;

/// Outcome of comparing the stored baseline against a fresh reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionDecision {
    /// No closing action; persist this size as the new baseline.
    UpdateBaseline(Decimal),
    /// Close `fraction` (in (0, 1]) of the follower's own position.
    Close { fraction: Decimal },
}

/// Compare the previously recorded trader position size against the current
/// one. `current` must already be clamped to >= 0 by the fetch layer.
///
/// The follower's holdings differ from the trader's (different entry timing
/// and sizing), so a reduction is expressed as a proportion of the trader's
/// change, never as an absolute size.
pub fn decide(prior: Option<Decimal>, current: Decimal) -> ReductionDecision {
    let Some(prior) = prior else {
        // First observation. A trader already at zero has nothing to baseline
        // against: treat as a full close.
        if current.is_zero() {
            return ReductionDecision::Close {
                fraction: Decimal::ONE,
            };
        }
        return ReductionDecision::UpdateBaseline(current);
    };

    // A non-positive baseline cannot anchor a proportional reduction.
    if prior <= Decimal::ZERO {
        return ReductionDecision::UpdateBaseline(current);
    }

    // Position unchanged or grew: nothing to mirror.
    if current >= prior {
        return ReductionDecision::UpdateBaseline(current);
    }

    let fraction = ((prior - current) / prior).min(Decimal::ONE);
    if fraction <= Decimal::ZERO {
        return ReductionDecision::UpdateBaseline(current);
    }

    ReductionDecision::Close { fraction }
}
