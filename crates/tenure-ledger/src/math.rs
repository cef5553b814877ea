//! Overflow-safe arithmetic for reward calculations.
//!
//! Rewards are `floor(amount * rate * elapsed / denominator)`. For 18-decimal
//! assets the product alone leaves `u128` quickly, so the division is split so
//! that no intermediate is larger than the final result or `denominator * b`.

/// `floor(a * b / d)` without materializing `a * b`.
///
/// With `a = q * d + r` the result is `q * b + floor(r * b / d)`, which is
/// exact. Returns `None` when `d == 0` or the result does not fit `u128`.
#[inline]
#[must_use]
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let (q, r) = (a / d, a % d);
    let whole = q.checked_mul(b)?;
    let fraction = r.checked_mul(b)? / d;
    whole.checked_add(fraction)
}

/// Checked sum, `None` on overflow
#[inline]
#[must_use]
pub fn checked_sum<I: IntoIterator<Item = u128>>(values: I) -> Option<u128> {
    values
        .into_iter()
        .try_fold(0u128, |acc, v| acc.checked_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_naive_when_small() {
        for (a, b, d) in [(1_000u128, 7u128, 3u128), (999, 1, 1000), (0, 5, 7), (12, 0, 5)] {
            assert_eq!(mul_div_floor(a, b, d), Some(a * b / d));
        }
    }

    #[test]
    fn test_exceeds_naive_product() {
        // a * b overflows u128, the quotient does not
        let a = u128::MAX / 2;
        assert_eq!(mul_div_floor(a, 4, 4), Some(a));
        assert_eq!(mul_div_floor(a, 3, 6), Some(a / 2));
    }

    #[test]
    fn test_zero_divisor() {
        assert_eq!(mul_div_floor(1, 1, 0), None);
    }

    #[test]
    fn test_result_overflow() {
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), None);
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(checked_sum([1, 2, 3]), Some(6));
        assert_eq!(checked_sum([u128::MAX, 1]), None);
        assert_eq!(checked_sum(std::iter::empty()), Some(0));
    }
}
