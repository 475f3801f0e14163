//! Calendar arithmetic for the retirement year

use chrono::{Datelike, NaiveDate};

/// Calendar year in which the client reaches `retirement_age`
pub fn retirement_year(birth_date: NaiveDate, retirement_age: u32) -> i32 {
    birth_date.year() + retirement_age as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_retirement_year() {
        assert_eq!(retirement_year(date(1960, 5, 10), 67), 2027);
        assert_eq!(retirement_year(date(1960, 12, 31), 65), 2025);
    }
}
