//! Percentage arithmetic shared by the analytics.
//!
//! Results are never rounded here; rounding is a presentation concern and
//! would make threshold comparisons inexact.

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `part / max(whole, 1) * 100`.
///
/// Same result as [`percentage`] for any non-zero divisor; kept separate
/// because the deck and combo rankings define their guard as a divisor floor.
pub fn percentage_floored(part: usize, whole: usize) -> f64 {
    part as f64 / whole.max(1) as f64 * 100.0
}

/// Win and loss shares of the games a card was involved in.
///
/// Both are `0.0` when the card was in no deck at all.
pub fn win_loss_split(wins: usize, losses: usize) -> (f64, f64) {
    let total = wins + losses;
    (percentage(wins, total), percentage(losses, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert!((percentage(2, 3) - 66.666_666).abs() < 0.001);
        assert_eq!(percentage(4, 5), 80.0);
        assert_eq!(percentage(0, 5), 0.0);
    }

    #[test]
    fn test_percentage_zero_divisor() {
        let p = percentage(0, 0);
        assert_eq!(p, 0.0);
        assert!(!p.is_nan());
    }

    #[test]
    fn test_percentage_floored() {
        assert_eq!(percentage_floored(0, 0), 0.0);
        assert_eq!(percentage_floored(3, 0), 300.0);
        assert_eq!(percentage_floored(1, 4), 25.0);
    }

    #[test]
    fn test_win_loss_split() {
        let (win, loss) = win_loss_split(2, 1);
        assert!((win - 66.67).abs() < 0.01);
        assert!((loss - 33.33).abs() < 0.01);
        assert_eq!(win_loss_split(0, 0), (0.0, 0.0));
    }

    #[test]
    fn test_win_loss_split_is_exact_ratio() {
        let (win, _) = win_loss_split(7, 3);
        assert!((win - 70.0).abs() < 1e-9);
    }
}
