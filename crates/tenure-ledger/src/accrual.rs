//! Accrual engine
//!
//! Pure reward math for a round at a given time. Both rewards accrue linearly
//! over a 365-day year and stop growing once the tenure has elapsed:
//!
//! ```text
//! elapsed = clamp(now - start, 0, tenure)
//! reward  = floor(amount * rate_bps * elapsed / (10_000 * SECONDS_PER_YEAR))
//! ```
//!
//! A settled round has been paid out and reports zero for every reward.

use serde::{Deserialize, Serialize};
use tenure_common::{
    Amount, BasisPoints, Result, Round, TenureError, Timestamp, BPS_DENOMINATOR,
    SECONDS_PER_YEAR,
};

use crate::math::mul_div_floor;

/// Stable and bonus reward of a round at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub stable: Amount,
    pub bonus: Amount,
    /// Always `stable + bonus`
    pub total: Amount,
}

/// Stateless reward calculator
pub struct AccrualEngine;

impl AccrualEngine {
    /// Seconds that count toward rewards, capped at the tenure
    #[inline]
    pub fn elapsed(round: &Round, now: Timestamp) -> u64 {
        now.saturating_sub(round.start_timestamp)
            .min(round.tenure_seconds)
    }

    /// Whether the tenure has fully elapsed
    #[inline]
    pub fn is_finished(round: &Round, now: Timestamp) -> bool {
        now.saturating_sub(round.start_timestamp) >= round.tenure_seconds
    }

    /// Seconds until the round finishes, 0 once finished
    pub fn time_remaining(round: &Round, now: Timestamp) -> u64 {
        round
            .tenure_seconds
            .saturating_sub(now.saturating_sub(round.start_timestamp))
    }

    /// Reward accrued at the pool's stable rate
    pub fn stable_reward(
        round: &Round,
        stable_rate_bps: BasisPoints,
        now: Timestamp,
    ) -> Result<Amount> {
        if round.settled {
            return Ok(0);
        }
        Self::accrue(round.amount_lent, stable_rate_bps, Self::elapsed(round, now))
    }

    /// Reward accrued at the round's own bonus rate
    pub fn bonus_reward(round: &Round, now: Timestamp) -> Result<Amount> {
        if round.settled {
            return Ok(0);
        }
        Self::accrue(
            round.amount_lent,
            round.bonus_rate_bps,
            Self::elapsed(round, now),
        )
    }

    /// Sum of stable and bonus reward
    pub fn total_reward(
        round: &Round,
        stable_rate_bps: BasisPoints,
        now: Timestamp,
    ) -> Result<Amount> {
        Self::rewards(round, stable_rate_bps, now).map(|r| r.total)
    }

    /// Both rewards and their sum from a single evaluation
    pub fn rewards(
        round: &Round,
        stable_rate_bps: BasisPoints,
        now: Timestamp,
    ) -> Result<RewardBreakdown> {
        let stable = Self::stable_reward(round, stable_rate_bps, now)?;
        let bonus = Self::bonus_reward(round, now)?;
        let total = stable.checked_add(bonus).ok_or(TenureError::Overflow)?;
        Ok(RewardBreakdown {
            stable,
            bonus,
            total,
        })
    }

    fn accrue(amount: Amount, rate_bps: BasisPoints, elapsed: u64) -> Result<Amount> {
        // rate * elapsed stays below 2^96, so this product cannot overflow
        let rate_time = u128::from(rate_bps) * u128::from(elapsed);
        let denominator = BPS_DENOMINATOR * u128::from(SECONDS_PER_YEAR);
        mul_div_floor(amount, rate_time, denominator).ok_or(TenureError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tenure_common::{AccountId, SECONDS_PER_DAY};

    const USDC: Amount = 1_000_000;
    const DAY: u64 = SECONDS_PER_DAY;
    const START: Timestamp = 1_700_000_000;

    fn round(amount: Amount, bonus_rate_bps: BasisPoints, days: u64) -> Round {
        Round {
            depositor: AccountId::new("alice"),
            amount_lent: amount,
            bonus_rate_bps,
            tenure_seconds: days * DAY,
            bonus_flag: true,
            start_timestamp: START,
            settled: false,
        }
    }

    #[test]
    fn test_rewards_after_tenure() {
        let r = round(1000 * USDC, 1000, 30);
        let rewards = AccrualEngine::rewards(&r, 500, START + 31 * DAY).unwrap();
        assert_eq!(rewards.stable, 4_109_589);
        assert_eq!(rewards.bonus, 8_219_178);
        assert_eq!(rewards.total, 12_328_767);
    }

    #[test]
    fn test_rewards_are_capped_at_tenure() {
        let r = round(1000 * USDC, 1000, 30);
        let at_end = AccrualEngine::stable_reward(&r, 500, START + 30 * DAY).unwrap();
        let day_31 = AccrualEngine::stable_reward(&r, 500, START + 31 * DAY).unwrap();
        let day_60 = AccrualEngine::stable_reward(&r, 500, START + 60 * DAY).unwrap();
        assert_eq!(at_end, 4_109_589);
        assert_eq!(day_31, at_end);
        assert_eq!(day_60, at_end);
    }

    #[test]
    fn test_partial_accrual() {
        let r = round(1000 * USDC, 1000, 30);
        assert_eq!(
            AccrualEngine::stable_reward(&r, 500, START + 10 * DAY).unwrap(),
            1_369_863
        );
        assert_eq!(AccrualEngine::stable_reward(&r, 500, START).unwrap(), 0);
    }

    #[test]
    fn test_time_before_start_accrues_nothing() {
        let r = round(1000 * USDC, 1000, 30);
        assert_eq!(AccrualEngine::elapsed(&r, START - 5), 0);
        assert_eq!(AccrualEngine::total_reward(&r, 500, START - 5).unwrap(), 0);
        assert!(!AccrualEngine::is_finished(&r, START - 5));
    }

    #[test]
    fn test_finished_boundary() {
        let r = round(100 * USDC, 800, 30);
        assert!(!AccrualEngine::is_finished(&r, START + 30 * DAY - 1));
        assert!(AccrualEngine::is_finished(&r, START + 30 * DAY));
        assert_eq!(AccrualEngine::time_remaining(&r, START + 29 * DAY), DAY);
        assert_eq!(AccrualEngine::time_remaining(&r, START + 45 * DAY), 0);
    }

    #[test]
    fn test_settled_round_reports_zero() {
        let mut r = round(1000 * USDC, 1000, 30);
        r.settled = true;
        let rewards = AccrualEngine::rewards(&r, 500, START + 31 * DAY).unwrap();
        assert_eq!(rewards, RewardBreakdown::default());
    }

    #[test]
    fn test_eighteen_decimal_asset() {
        let dai: Amount = 1_000_000_000_000_000_000;
        let r = round(500 * dai, 1100, 30);
        let rewards = AccrualEngine::rewards(&r, 600, START + 31 * DAY).unwrap();
        assert_eq!(rewards.stable, 2_465_753_424_657_534_246);
        assert_eq!(rewards.bonus, 4_520_547_945_205_479_452);
        assert_eq!(rewards.total, 6_986_301_369_863_013_698);
    }

    #[test]
    fn test_large_principal_does_not_overflow() {
        let r = round(u128::MAX / 4, 10_000, 365);
        let stable = AccrualEngine::stable_reward(&r, 10_000, START + 365 * DAY).unwrap();
        // 100% over a full year pays the principal once
        assert_eq!(stable, u128::MAX / 4);
    }

    #[test]
    fn test_overflowing_reward_is_an_error() {
        let r = round(u128::MAX, 20_000, 365);
        let result = AccrualEngine::stable_reward(&r, 20_000, START + 365 * DAY);
        assert!(matches!(result, Err(TenureError::Overflow)));
    }

    proptest! {
        #[test]
        fn prop_total_is_sum(
            amount in 0u128..1_000_000_000_000_000_000_000u128,
            stable_bps in 0u32..50_000,
            bonus_bps in 0u32..50_000,
            days in 1u64..3_650,
            offset in 0u64..4_000 * DAY,
        ) {
            let r = round(amount, bonus_bps, days);
            let now = START + offset;
            let rewards = AccrualEngine::rewards(&r, stable_bps, now).unwrap();
            prop_assert_eq!(rewards.stable + rewards.bonus, rewards.total);
            prop_assert_eq!(
                AccrualEngine::total_reward(&r, stable_bps, now).unwrap(),
                AccrualEngine::stable_reward(&r, stable_bps, now).unwrap()
                    + AccrualEngine::bonus_reward(&r, now).unwrap()
            );
        }

        #[test]
        fn prop_capped_after_tenure(
            amount in 1u128..1_000_000_000_000u128,
            bonus_bps in 0u32..20_000,
            days in 1u64..1_000,
            late in 0u64..10_000 * DAY,
        ) {
            let r = round(amount, bonus_bps, days);
            let end = r.maturity();
            prop_assert_eq!(
                AccrualEngine::rewards(&r, 500, end).unwrap(),
                AccrualEngine::rewards(&r, 500, end + late).unwrap()
            );
        }
    }
}
