//! Lifecycle email pass: market-resolved and trader-exited notifications.
//!
//! Candidates run in bounded-concurrency batches; one item's failure is
//! isolated from the rest of its batch.

use futures_util::future::join_all;
use metrics::counter;

use crate::db::{followed_order_repo, user_repo};
use crate::models::FollowedOrder;

use super::JobContext;

/// Items processed concurrently per batch.
const NOTIFY_BATCH_SIZE: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct NotificationSummary {
    pub checked: u64,
    pub sent: u64,
}

/// Which notification, if any, a candidate order needs. Pure so the
/// mutual-exclusion rule is testable without I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStep {
    /// Market resolved: send the resolution email. When the trader-close
    /// email was never sent, mark it sent too — resolution takes priority
    /// and suppresses it.
    MarketResolved { suppress_trader_close: bool },
    /// Market resolved and the resolution email already went out, but the
    /// trader-close flag is still open: close it without emailing.
    SuppressTraderClose,
    /// Market still live: check whether the copied trader exited.
    CheckTraderPosition,
    Nothing,
}

pub fn decide_step(
    market_resolved: bool,
    resolution_sent: bool,
    trader_close_sent: bool,
) -> NotificationStep {
    if market_resolved {
        if !resolution_sent {
            return NotificationStep::MarketResolved {
                suppress_trader_close: !trader_close_sent,
            };
        }
        if !trader_close_sent {
            return NotificationStep::SuppressTraderClose;
        }
        return NotificationStep::Nothing;
    }

    if !trader_close_sent {
        return NotificationStep::CheckTraderPosition;
    }

    NotificationStep::Nothing
}

/// Process all notification candidates in batches of [`NOTIFY_BATCH_SIZE`].
pub async fn run_notification_pass(ctx: &JobContext) -> anyhow::Result<NotificationSummary> {
    let candidates =
        followed_order_repo::get_notification_candidates(&ctx.db, ctx.candidate_limit).await?;

    let mut summary = NotificationSummary::default();

    for batch in candidates.chunks(NOTIFY_BATCH_SIZE) {
        let results = join_all(batch.iter().map(|order| process_order(ctx, order))).await;

        for (order, result) in batch.iter().zip(results) {
            summary.checked += 1;
            match result {
                Ok(sent) => summary.sent += sent,
                Err(e) => {
                    tracing::error!(
                        order_id = %order.id,
                        error = %e,
                        "Notification processing failed for order"
                    );
                }
            }
        }
    }

    if summary.sent > 0 {
        counter!("notifications_sent").increment(summary.sent);
    }

    Ok(summary)
}

/// Handle one order; returns the number of emails sent.
async fn process_order(ctx: &JobContext, order: &FollowedOrder) -> anyhow::Result<u64> {
    let market = ctx.clob.get_market(&order.condition_id).await?;

    let step = decide_step(
        market.is_resolved(),
        order.resolution_email_sent,
        order.trader_close_email_sent,
    );

    match step {
        NotificationStep::MarketResolved {
            suppress_trader_close,
        } => {
            let winning = market.winning_outcome().unwrap_or_default().to_string();
            let won = winning.eq_ignore_ascii_case(&order.outcome);
            let mut sent = 0u64;

            if let Some(user) = user_repo::get_user(&ctx.db, order.user_id).await? {
                if user.notify_enabled {
                    if let Some(mailer) = &ctx.mailer {
                        if mailer
                            .send_market_resolved(
                                &user.email,
                                &market.question,
                                &order.outcome,
                                &winning,
                                won,
                            )
                            .await
                        {
                            sent += 1;
                        }
                    }
                }
            }

            followed_order_repo::mark_resolution_email_sent(&ctx.db, order.id).await?;
            if suppress_trader_close {
                followed_order_repo::mark_trader_close_email_sent(&ctx.db, order.id).await?;
            }

            tracing::info!(
                order_id = %order.id,
                winning_outcome = %winning,
                won,
                "Market resolved notification processed"
            );
            Ok(sent)
        }

        NotificationStep::SuppressTraderClose => {
            followed_order_repo::mark_trader_close_email_sent(&ctx.db, order.id).await?;
            Ok(0)
        }

        NotificationStep::CheckTraderPosition => {
            let trader_size = ctx
                .data
                .get_position_size(&order.trader_wallet, &order.condition_id, &order.outcome)
                .await?;

            if trader_size > rust_decimal::Decimal::ZERO {
                return Ok(0);
            }

            let mut sent = 0u64;
            if let Some(user) = user_repo::get_user(&ctx.db, order.user_id).await? {
                if user.notify_enabled {
                    if let Some(mailer) = &ctx.mailer {
                        if mailer
                            .send_trader_closed(&user.email, &market.question, &order.trader_wallet)
                            .await
                        {
                            sent += 1;
                        }
                    }
                }
            }

            followed_order_repo::mark_trader_close_email_sent(&ctx.db, order.id).await?;

            tracing::info!(
                order_id = %order.id,
                trader_wallet = %order.trader_wallet,
                "Trader exit notification processed"
            );
            Ok(sent)
        }

        NotificationStep::Nothing => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_takes_priority_over_trader_close() {
        // The market resolves in the same pass the trader's position
        // disappears — only the resolution email fires, and the trader-close
        // flag is closed without emailing.
        assert_eq!(
            decide_step(true, false, false),
            NotificationStep::MarketResolved {
                suppress_trader_close: true
            }
        );
    }

    #[test]
    fn resolved_market_with_resolution_sent_suppresses_trader_close() {
        assert_eq!(
            decide_step(true, true, false),
            NotificationStep::SuppressTraderClose
        );
    }

    #[test]
    fn live_market_checks_trader_position() {
        assert_eq!(
            decide_step(false, false, false),
            NotificationStep::CheckTraderPosition
        );
    }

    #[test]
    fn fully_notified_order_needs_nothing() {
        assert_eq!(decide_step(true, true, true), NotificationStep::Nothing);
        assert_eq!(decide_step(false, false, true), NotificationStep::Nothing);
    }
}
