// SPDX-License-Identifier: Apache-2.0

use certval_model::resignal_created_at;
use chrono::{Datelike, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn resignal_moves_back_two_calendar_years(
        year in 1990_i32..2100_i32,
        month in 1_u32..=12_u32,
        day in 1_u32..=28_u32,
        hour in 0_u32..24_u32,
        minute in 0_u32..60_u32,
    ) {
        let t = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("timestamp");
        let shifted = resignal_created_at(t).expect("shift");
        prop_assert_eq!(shifted.year(), year - 2);
        prop_assert_eq!(shifted.month(), month);
        prop_assert_eq!(shifted.day(), day);
        prop_assert_eq!(shifted.hour(), hour);
        prop_assert_eq!(shifted.minute(), minute);
    }
}

#[test]
fn resignal_is_not_a_fixed_day_count() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("ts");
    let shifted = resignal_created_at(t).expect("shift");
    assert_eq!(
        shifted,
        Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).single().expect("ts")
    );
    assert_ne!(shifted, t - chrono::Duration::days(730));
}
