/// Win percentages for a pair of totals, rounded half-up.
///
/// `(200·x + total) / (2·total)` is `round(x / total · 100)` without floats.
/// A race with no votes yields `(0, 0)`.
pub fn vote_percentages(a_total: u64, b_total: u64) -> (u32, u32) {
    let total = u128::from(a_total) + u128::from(b_total);
    if total == 0 {
        return (0, 0);
    }
    let percent = |x: u64| ((200 * u128::from(x) + total) / (2 * total)) as u32;
    (percent(a_total), percent(b_total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_to_one() {
        assert_eq!(vote_percentages(30, 10), (75, 25));
    }

    #[test]
    fn no_votes_is_zero_zero() {
        assert_eq!(vote_percentages(0, 0), (0, 0));
    }

    #[test]
    fn one_side_only() {
        assert_eq!(vote_percentages(0, 9), (0, 100));
        assert_eq!(vote_percentages(4, 0), (100, 0));
    }

    #[test]
    fn halves_round_up() {
        // 1/8 = 12.5%, 7/8 = 87.5%
        assert_eq!(vote_percentages(1, 7), (13, 88));
        // 1/3 = 33.33%, 2/3 = 66.67%
        assert_eq!(vote_percentages(1, 2), (33, 67));
    }

    #[test]
    fn huge_totals_do_not_overflow() {
        assert_eq!(vote_percentages(u64::MAX, u64::MAX), (50, 50));
    }
}
