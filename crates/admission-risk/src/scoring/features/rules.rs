use super::AgeConvention;
use chrono::{Datelike, NaiveDate};

pub(crate) const COMPOSITE_SEPARATOR: &str = "_";
pub(crate) const DEFAULT_WORKED: &str = "NO";
pub(crate) const DEFAULT_SCHOOL_TYPE: &str = "DESCONOCIDO";

/// Age during the evaluation year; 0 when the birth date is unknown.
pub(crate) fn age_at(
    birth_date: Option<NaiveDate>,
    evaluation_year: i32,
    convention: AgeConvention,
) -> i64 {
    let Some(birth_date) = birth_date else {
        return 0;
    };

    let years = i64::from(evaluation_year) - i64::from(birth_date.year());
    match convention {
        AgeConvention::CalendarYear => years,
        AgeConvention::ExactBirthday {
            cutoff_month,
            cutoff_day,
        } => {
            let birthday_pending =
                (birth_date.month(), birth_date.day()) > (cutoff_month, cutoff_day);
            years - i64::from(birthday_pending)
        }
    }
}

pub(crate) fn is_adult(age: i64) -> i64 {
    i64::from(age >= 18)
}

/// Whole calendar year of a numeric cell; `None` when it does not fit an `i32`.
pub(crate) fn whole_year(value: f64) -> Option<i32> {
    let year = value.trunc();
    (f64::from(i32::MIN)..=f64::from(i32::MAX))
        .contains(&year)
        .then_some(year as i32)
}

/// Years between finishing secondary school and the evaluation. Unset, zero, or
/// out-of-range completion years give 0; a completion year after the evaluation year
/// is clamped to 0.
pub(crate) fn years_after_secondary(evaluation_year: i32, completion_year: Option<f64>) -> i64 {
    match completion_year.and_then(whole_year) {
        Some(year) if year != 0 => (i64::from(evaluation_year) - i64::from(year)).max(0),
        _ => 0,
    }
}

pub(crate) fn school_type_composite(worked: Option<&str>, school_type: Option<&str>) -> String {
    format!(
        "{}{}{}",
        worked.unwrap_or(DEFAULT_WORKED),
        COMPOSITE_SEPARATOR,
        school_type.unwrap_or(DEFAULT_SCHOOL_TYPE)
    )
}

/// Either a city or a province mismatch counts as having moved for university.
pub(crate) fn migrated(
    city: Option<&str>,
    province: Option<&str>,
    reference_city: &str,
    reference_province: &str,
) -> i64 {
    let city_differs = city.map(str::trim) != Some(reference_city);
    let province_differs = province.map(str::trim) != Some(reference_province);
    i64::from(city_differs || province_differs)
}
