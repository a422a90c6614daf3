//! Age arithmetic: retention window, fade bands and remaining lifetime.

/// One fade band.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Messages are visible for seven days after creation.
pub const RETENTION_WINDOW_MS: i64 = 7 * DAY_MS;

pub const MIN_FADE_LEVEL: u8 = 1;
pub const MAX_FADE_LEVEL: u8 = 7;

/// Visible iff `0 <= age < RETENTION_WINDOW_MS`.
pub const fn is_visible(age: i64) -> bool {
    age >= 0 && age < RETENTION_WINDOW_MS
}

pub const fn is_expired(age: i64) -> bool {
    age >= RETENTION_WINDOW_MS
}

/// `min(floor(age / DAY) + 1, 7)`, clamped to at least 1.
pub const fn fade_level(age: i64) -> u8 {
    if age < 0 {
        return MIN_FADE_LEVEL;
    }
    let band = age / DAY_MS + 1;
    if band >= MAX_FADE_LEVEL as i64 {
        MAX_FADE_LEVEL
    } else {
        band as u8
    }
}

/// `ceil((RETENTION_WINDOW - age) / DAY)`. At least 1 for any visible age,
/// 0 once expired, saturating at `u32::MAX` for absurd negative ages.
pub fn days_remaining(age: i64) -> u32 {
    let left = RETENTION_WINDOW_MS.saturating_sub(age);
    if left <= 0 {
        return 0;
    }
    let days = left.saturating_add(DAY_MS - 1) / DAY_MS;
    u32::try_from(days).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_seven_days_in_millis() {
        assert_eq!(RETENTION_WINDOW_MS, 604_800_000);
    }

    #[test]
    fn first_day_is_level_one() {
        assert_eq!(fade_level(0), 1);
        assert_eq!(fade_level(1), 1);
        assert_eq!(fade_level(DAY_MS - 1), 1);
        assert_eq!(fade_level(DAY_MS), 2);
    }

    #[test]
    fn last_day_saturates_at_seven() {
        assert_eq!(fade_level(6 * DAY_MS - 1), 6);
        assert_eq!(fade_level(6 * DAY_MS), 7);
        assert_eq!(fade_level(RETENTION_WINDOW_MS - 1), 7);
        assert_eq!(fade_level(RETENTION_WINDOW_MS * 3), 7);
    }

    #[test]
    fn fade_level_is_monotonic_and_bounded() {
        let step = DAY_MS / 8;
        let mut previous = MIN_FADE_LEVEL;
        let mut age = 0;
        while age < RETENTION_WINDOW_MS + DAY_MS {
            let level = fade_level(age);
            assert!((MIN_FADE_LEVEL..=MAX_FADE_LEVEL).contains(&level), "age {age}");
            assert!(level >= previous, "age {age}");
            previous = level;
            age += step;
        }
    }

    #[test]
    fn visibility_upper_bound_is_exclusive() {
        assert!(is_visible(0));
        assert!(is_visible(604_799_999));
        assert!(!is_visible(604_800_000));
        assert!(is_expired(604_800_000));
        assert!(!is_expired(604_799_999));
    }

    #[test]
    fn future_dated_ages_are_neither_visible_nor_expired() {
        assert!(!is_visible(-1));
        assert!(!is_expired(-1));
        assert_eq!(fade_level(-5), 1);
    }

    #[test]
    fn days_remaining_rounds_up() {
        assert_eq!(days_remaining(0), 7);
        assert_eq!(days_remaining(1_000), 7);
        assert_eq!(days_remaining(DAY_MS), 6);
        assert_eq!(days_remaining(DAY_MS + 1), 6);
        assert_eq!(days_remaining(RETENTION_WINDOW_MS - 1), 1);
        assert_eq!(days_remaining(RETENTION_WINDOW_MS), 0);
    }

    #[test]
    fn days_remaining_saturates_for_extreme_ages() {
        assert_eq!(days_remaining(i64::MAX), 0);
        assert_eq!(days_remaining(i64::MIN), u32::MAX);
        assert_eq!(days_remaining(-DAY_MS), 8);
    }
}
