//! Top-level scheduled reconciliation pass.

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::time::sleep;
use uuid::Uuid;

use crate::db::{followed_order_repo, order_event_repo, user_repo};
use crate::models::{FollowedOrder, Side, UserAccount};

use super::reduction::{self, ReductionDecision};
use super::submitter::{self, Submission};
use super::verifier::{self, FillOutcome};
use super::{notifications, pricing, retry, JobContext};

/// Result of one scheduled invocation.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub trades_checked: u64,
    pub notifications_sent: u64,
    pub phase_errors: Vec<String>,
}

/// Run one scheduled invocation: the notification phase, then the auto-close
/// phase. The phases are independent failure domains; either one failing to
/// load its candidates does not stop the other.
pub async fn run(ctx: &JobContext) -> RunOutcome {
    let mut outcome = RunOutcome::default();

    match notifications::run_notification_pass(ctx).await {
        Ok(summary) => {
            outcome.trades_checked += summary.checked;
            outcome.notifications_sent += summary.sent;
        }
        Err(e) => {
            tracing::error!(error = %e, "Notification phase failed");
            outcome.phase_errors.push(format!("notification phase: {e}"));
        }
    }

    match run_auto_close_pass(ctx).await {
        Ok((checked, sent)) => {
            outcome.trades_checked += checked;
            outcome.notifications_sent += sent;
        }
        Err(e) => {
            tracing::error!(error = %e, "Auto-close phase failed");
            outcome.phase_errors.push(format!("auto-close phase: {e}"));
        }
    }

    outcome
}

/// Process auto-close candidates strictly sequentially. Every iteration can
/// perform signed writes against the exchange and must not race itself
/// across orders sharing the same wallet credentials.
async fn run_auto_close_pass(ctx: &JobContext) -> anyhow::Result<(u64, u64)> {
    let candidates =
        followed_order_repo::get_auto_close_candidates(&ctx.db, ctx.candidate_limit).await?;

    let mut checked = 0u64;
    let mut sent = 0u64;

    for order in &candidates {
        checked += 1;
        counter!("reconcile_orders_checked").increment(1);

        match reconcile_order(ctx, order).await {
            Ok(n) => sent += n,
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %e,
                    "Reconciliation failed for order"
                );
            }
        }
    }

    Ok((checked, sent))
}

/// Reconcile one followed order. Returns the number of emails sent.
async fn reconcile_order(ctx: &JobContext, order: &FollowedOrder) -> anyhow::Result<u64> {
    // Identifying fields may be backfilled upstream; skip quietly rather
    // than burning a retry.
    if order.trader_wallet.is_empty() || order.condition_id.is_empty() || order.outcome.is_empty()
    {
        tracing::warn!(order_id = %order.id, "Order missing identifying fields — skipped");
        return Ok(0);
    }
    let Some(original_side) = Side::from_api_str(&order.side) else {
        tracing::warn!(order_id = %order.id, side = %order.side, "Order has unknown side — skipped");
        return Ok(0);
    };

    let Some(user) = user_repo::get_user(&ctx.db, order.user_id).await? else {
        tracing::warn!(order_id = %order.id, user_id = %order.user_id, "Owning user not found — skipped");
        return Ok(0);
    };

    // A submission from a prior pass whose fill state is still unknown is
    // settled before anything else.
    if let Some(pending_id) = order.pending_close_order_id.clone() {
        return settle_pending_fill(ctx, order, &user, &pending_id).await;
    }

    // The ceiling is derived from the persisted count every pass; beyond it
    // the order belongs to a human.
    if order.retry_count >= retry::RETRY_CEILING {
        tracing::debug!(
            order_id = %order.id,
            retry_count = order.retry_count,
            "Retry ceiling reached — manual intervention required"
        );
        return Ok(0);
    }

    if !retry::cooldown_elapsed(order.auto_close_attempted_at, order.retry_count, Utc::now()) {
        tracing::debug!(order_id = %order.id, "Cooldown not elapsed — deferred");
        return Ok(0);
    }

    let trader_size = ctx
        .data
        .get_position_size(&order.trader_wallet, &order.condition_id, &order.outcome)
        .await?;

    let fraction = match reduction::decide(order.trader_position_size, trader_size) {
        ReductionDecision::UpdateBaseline(size) => {
            followed_order_repo::update_trader_baseline(&ctx.db, order.id, size).await?;
            return Ok(0);
        }
        ReductionDecision::Close { fraction } => fraction,
    };

    let follower_size = ctx
        .data
        .get_position_size(&user.wallet, &order.condition_id, &order.outcome)
        .await?;

    if follower_size <= Decimal::ZERO {
        // Nothing left on the follower side to reduce.
        if trader_size <= Decimal::ZERO {
            followed_order_repo::finalize_close(&ctx.db, order.id, Decimal::ZERO).await?;
            tracing::info!(order_id = %order.id, "Follower position already empty — order closed");
        } else {
            followed_order_repo::update_trader_baseline(&ctx.db, order.id, trader_size).await?;
        }
        return Ok(0);
    }

    let close_size = pricing::close_size(follower_size, fraction);
    if close_size <= Decimal::ZERO {
        // Rounds below the size step: a successful no-op that still moves
        // the baseline forward.
        followed_order_repo::update_trader_baseline(&ctx.db, order.id, trader_size).await?;
        return Ok(0);
    }

    let market = ctx.clob.get_market(&order.condition_id).await?;
    let Some(token) = market.token_for_outcome(&order.outcome) else {
        tracing::warn!(
            order_id = %order.id,
            outcome = %order.outcome,
            "Market has no token for outcome — skipped"
        );
        return Ok(0);
    };
    let Some(market_price) = token.price.filter(|p| *p > Decimal::ZERO) else {
        tracing::warn!(
            order_id = %order.id,
            token_id = %token.token_id,
            "No price for outcome token — skipped"
        );
        return Ok(0);
    };
    let tick_size = market.tick_size.unwrap_or_else(|| Decimal::new(1, 2));

    let close_side = original_side.opposite();
    let slippage_pct = if order.slippage_pct > Decimal::ZERO {
        order.slippage_pct
    } else {
        ctx.default_slippage_pct
    };
    let limit_price = pricing::limit_price(market_price, close_side, slippage_pct, tick_size);

    // Claim the attempt last, once the order is actually going out; an
    // overlapping invocation that claimed first wins.
    let Some(claimed) =
        followed_order_repo::claim_attempt(&ctx.db, order.id, order.auto_close_attempted_at)
            .await?
    else {
        tracing::debug!(order_id = %order.id, "Order already claimed by an overlapping run");
        return Ok(0);
    };
    let order = &claimed;

    let submission = submitter::submit_close_order(
        ctx,
        order,
        &user,
        &token.token_id,
        close_side,
        limit_price,
        close_size,
    )
    .await?;

    match submission {
        Submission::Submitted {
            event_id,
            exchange_order_id,
        } => {
            counter!("close_orders_submitted").increment(1);
            followed_order_repo::record_submission(&ctx.db, order.id, &exchange_order_id).await?;

            sleep(verifier::SETTLE_DELAY).await;

            let fill = verifier::verify_fill(&ctx.clob, &exchange_order_id).await;
            handle_fill(
                ctx,
                order,
                &user,
                &market.question,
                trader_size,
                Some(close_size),
                Some(event_id),
                limit_price,
                fill,
            )
            .await
        }
        Submission::Rejected { message } => {
            counter!("close_orders_rejected").increment(1);
            record_failure(ctx, order, &user, &market.question, &message).await
        }
    }
}

/// Re-verify a close order submitted on a previous pass whose fill state was
/// unknown. Runs before any new attempt for the order.
async fn settle_pending_fill(
    ctx: &JobContext,
    order: &FollowedOrder,
    user: &UserAccount,
    pending_id: &str,
) -> anyhow::Result<u64> {
    let fill = verifier::verify_fill(&ctx.clob, pending_id).await;
    if fill == FillOutcome::Unknown {
        tracing::debug!(
            order_id = %order.id,
            exchange_order_id = pending_id,
            "Fill state still unknown — will re-check next pass"
        );
        return Ok(0);
    }

    let trader_size = ctx
        .data
        .get_position_size(&order.trader_wallet, &order.condition_id, &order.outcome)
        .await?;

    // Best-effort question for the email; the condition id is an acceptable
    // stand-in when the market fetch fails.
    let question = ctx
        .clob
        .get_market(&order.condition_id)
        .await
        .map(|m| m.question)
        .unwrap_or_else(|_| order.condition_id.clone());

    handle_fill(
        ctx,
        order,
        user,
        &question,
        trader_size,
        None,
        None,
        Decimal::ZERO,
        fill,
    )
    .await
}

/// Apply a definite fill outcome to the followed order. Partial fills are
/// bookkept the same as full fills, with the ratio recorded for audit.
#[allow(clippy::too_many_arguments)]
async fn handle_fill(
    ctx: &JobContext,
    order: &FollowedOrder,
    user: &UserAccount,
    question: &str,
    trader_size: Decimal,
    requested_size: Option<Decimal>,
    event_id: Option<Uuid>,
    price_hint: Decimal,
    fill: FillOutcome,
) -> anyhow::Result<u64> {
    match fill {
        FillOutcome::Filled { size: filled, price } => {
            counter!("close_orders_filled").increment(1);

            if let (Some(event_id), Some(requested)) = (event_id, requested_size) {
                if requested > Decimal::ZERO {
                    let ratio = (filled / requested).min(Decimal::ONE);
                    order_event_repo::merge_details(
                        &ctx.db,
                        event_id,
                        json!({ "fill_ratio": ratio.to_string() }),
                    )
                    .await?;
                }
            }

            let remaining = (order.remaining_size - filled).max(Decimal::ZERO);

            if trader_size <= Decimal::ZERO {
                followed_order_repo::finalize_close(&ctx.db, order.id, remaining).await?;
                tracing::info!(
                    order_id = %order.id,
                    filled = %filled,
                    "Trader fully exited — auto-close complete"
                );
            } else {
                followed_order_repo::record_partial_close(&ctx.db, order.id, remaining, trader_size)
                    .await?;
                tracing::info!(
                    order_id = %order.id,
                    filled = %filled,
                    remaining = %remaining,
                    trader_size = %trader_size,
                    "Auto-close fill applied"
                );
            }

            let mut sent = 0u64;
            if user.notify_enabled {
                if let Some(mailer) = &ctx.mailer {
                    let fill_price = price.unwrap_or(price_hint);
                    if mailer
                        .send_auto_close_success(&user.email, question, filled, fill_price)
                        .await
                    {
                        sent += 1;
                    }
                }
            }
            Ok(sent)
        }

        FillOutcome::NoFill => {
            counter!("close_orders_no_fill").increment(1);
            record_failure(ctx, order, user, question, "close order did not fill").await
        }

        FillOutcome::Unknown => Ok(0),
    }
}

/// Record a failed attempt and send the (throttled) escalation email when the
/// new retry count is an escalation point.
async fn record_failure(
    ctx: &JobContext,
    order: &FollowedOrder,
    user: &UserAccount,
    question: &str,
    message: &str,
) -> anyhow::Result<u64> {
    let new_count = order.retry_count + 1;
    followed_order_repo::record_failure(&ctx.db, order.id, new_count, message).await?;

    tracing::warn!(
        order_id = %order.id,
        retry_count = new_count,
        message,
        "Auto-close attempt failed"
    );

    if !retry::should_email_failure(new_count) || !user.notify_enabled {
        return Ok(0);
    }
    let Some(mailer) = &ctx.mailer else {
        return Ok(0);
    };

    let terminal = new_count >= retry::RETRY_CEILING;
    if mailer
        .send_auto_close_failure(&user.email, question, new_count, message, terminal)
        .await
    {
        Ok(1)
    } else {
        Ok(0)
    }
}
