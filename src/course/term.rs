//! Term name to registrar term code

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{Result, WatchError};
use crate::types::TermCode;

/// Convert a term name ("spring", "summer", "fall") to a term code for today
pub fn term_code(term: &str) -> Result<TermCode> {
    term_code_on(term, Local::now().date_naive())
}

/// Convert a term name to a term code as of `today`.
///
/// Spring registration opens in the fall, so after April "spring" refers
/// to the following calendar year.
pub fn term_code_on(term: &str, today: NaiveDate) -> Result<TermCode> {
    let year = today.year();
    let code = match term.trim().to_lowercase().as_str() {
        "spring" => {
            let year = if today.month() > 4 { year + 1 } else { year };
            format!("{}02", year)
        }
        "summer" => format!("{}05", year),
        "fall" => format!("{}08", year),
        _ => return Err(WatchError::InvalidTerm(term.to_string())),
    };
    Ok(TermCode::new(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fall_and_summer() {
        assert_eq!(term_code_on("fall", day(2025, 3, 1)).unwrap().as_str(), "202508");
        assert_eq!(term_code_on("Summer", day(2025, 3, 1)).unwrap().as_str(), "202505");
    }

    #[test]
    fn test_spring_rolls_over_after_april() {
        assert_eq!(term_code_on("spring", day(2025, 4, 30)).unwrap().as_str(), "202502");
        assert_eq!(term_code_on("spring", day(2025, 5, 1)).unwrap().as_str(), "202602");
        assert_eq!(term_code_on("SPRING", day(2025, 11, 12)).unwrap().as_str(), "202602");
    }

    #[test]
    fn test_unknown_term() {
        let err = term_code_on("winter", day(2025, 1, 1)).unwrap_err();
        assert!(matches!(err, WatchError::InvalidTerm(ref t) if t == "winter"));
    }
}
