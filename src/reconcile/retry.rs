//! Retry ceiling, cooldown windows, and failure-email throttling.
//!
//! The ceiling is re-derived from the persisted retry count every pass;
//! nothing stores "gave up" as a flag.

use chrono::{DateTime, Duration, Utc};

/// After this many failed attempts the job permanently skips the order and a
/// human must close the position manually.
pub const RETRY_CEILING: i32 = 10;

/// Failure emails go out only at these post-increment retry counts.
const FAILURE_EMAIL_RETRIES: &[i32] = &[3, 6, RETRY_CEILING];

/// Cooldown between attempts: 5 minutes for the first five retries, then
/// 10 minutes up to the ceiling.
pub fn cooldown(retry_count: i32) -> Duration {
    if retry_count < 5 {
        Duration::minutes(5)
    } else {
        Duration::minutes(10)
    }
}

/// Whether enough time has passed since the last attempt to try again.
/// An order that was never attempted is always eligible.
pub fn cooldown_elapsed(
    attempted_at: Option<DateTime<Utc>>,
    retry_count: i32,
    now: DateTime<Utc>,
) -> bool {
    match attempted_at {
        None => true,
        Some(last) => now - last >= cooldown(retry_count),
    }
}

/// Failure notifications are throttled so the user is not emailed every
/// cooldown interval; only escalation points fire.
pub fn should_email_failure(post_increment_count: i32) -> bool {
    FAILURE_EMAIL_RETRIES.contains(&post_increment_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_escalates_at_five_retries() {
        assert_eq!(cooldown(0), Duration::minutes(5));
        assert_eq!(cooldown(4), Duration::minutes(5));
        assert_eq!(cooldown(5), Duration::minutes(10));
        assert_eq!(cooldown(9), Duration::minutes(10));
    }

    #[test]
    fn recent_attempt_is_skipped() {
        // Attempted 3 minutes ago at retry count 2: still cooling down.
        let now = Utc::now();
        let attempted = now - Duration::minutes(3);
        assert!(!cooldown_elapsed(Some(attempted), 2, now));
    }

    #[test]
    fn elapsed_cooldown_allows_retry() {
        let now = Utc::now();
        assert!(cooldown_elapsed(Some(now - Duration::minutes(6)), 2, now));
        assert!(cooldown_elapsed(Some(now - Duration::minutes(11)), 7, now));
        // 6 minutes is not enough once the long cooldown applies.
        assert!(!cooldown_elapsed(Some(now - Duration::minutes(6)), 7, now));
    }

    #[test]
    fn never_attempted_is_always_eligible() {
        assert!(cooldown_elapsed(None, 0, Utc::now()));
    }

    #[test]
    fn failure_emails_fire_only_at_escalation_points() {
        // Exactly 3, 6 and the terminal 10th attempt.
        let expected: Vec<i32> = (1..=RETRY_CEILING)
            .filter(|n| should_email_failure(*n))
            .collect();
        assert_eq!(expected, vec![3, 6, 10]);
    }
}
