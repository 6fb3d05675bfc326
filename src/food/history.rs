use time::{format_description::FormatItem, macros::format_description, Date, Month};
use uuid::Uuid;

use crate::error::ApiError;

use super::{
    dto::{DailyView, DaySummary},
    ledger::LedgerStore,
    totals::daily_totals,
};

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(s: &str) -> Result<Date, ApiError> {
    Date::parse(s, DATE_FMT).map_err(|_| ApiError::Validation("Invalid date format.".into()))
}

/// Parses `YYYY-MM` into calendar components. "13" is a malformed month, not
/// next January.
pub fn parse_month(s: &str) -> Result<(i32, Month), ApiError> {
    let invalid = || ApiError::Validation("Invalid month format.".into());
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Ok((year, month))
}

/// A day's meals plus live totals. A day without a record is an empty list
/// and zeroed totals, not an error.
pub async fn daily_view(
    ledger: &dyn LedgerStore,
    user_id: Uuid,
    date: Date,
) -> Result<DailyView, ApiError> {
    let meals = ledger
        .find_by_date(user_id, date)
        .await?
        .map(|r| r.meals)
        .unwrap_or_default();
    let daily_totals = daily_totals(&meals);
    Ok(DailyView { meals, daily_totals })
}

/// One summary per day-with-data in the month, date ascending. Empty days
/// are omitted, never zero-filled.
pub async fn monthly_view(
    ledger: &dyn LedgerStore,
    user_id: Uuid,
    year: i32,
    month: Month,
) -> Result<Vec<DaySummary>, ApiError> {
    let records = ledger.find_month(user_id, year, month).await?;
    Ok(records
        .into_iter()
        .map(|record| DaySummary {
            date: record.date.to_string(),
            daily_totals: daily_totals(&record.meals),
            meals: record.meals,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::ledger::{Macronutrients, Meal, MemoryLedger};
    use time::macros::date;

    fn meal(calories: f64) -> Meal {
        Meal {
            timestamp: "13:00:00".into(),
            foods: vec!["soup".into()],
            calories,
            macronutrients: Macronutrients {
                protein: 12.0,
                carbs: 20.0,
                fats: 8.0,
            },
        }
    }

    #[test]
    fn parse_month_accepts_calendar_months() {
        assert_eq!(parse_month("2024-02").expect("parse"), (2024, Month::February));
        assert_eq!(parse_month("2024-12").expect("parse"), (2024, Month::December));
    }

    #[test]
    fn parse_month_rejects_garbage() {
        for bad in ["2024-13", "2024-00", "2024", "abcd-ef", "2024-1x", ""] {
            assert!(parse_month(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn parse_date_round_trips_iso_days() {
        assert_eq!(parse_date("2024-02-29").expect("parse"), date!(2024 - 02 - 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[tokio::test]
    async fn daily_view_of_an_empty_day_is_zeroed() {
        let ledger = MemoryLedger::default();
        let view = daily_view(&ledger, Uuid::new_v4(), date!(2024 - 05 - 01))
            .await
            .expect("view");
        assert!(view.meals.is_empty());
        assert_eq!(view.daily_totals.calories, 0.0);
        assert_eq!(view.daily_totals.protein, 0.0);
        assert_eq!(view.daily_totals.carbs, 0.0);
        assert_eq!(view.daily_totals.fats, 0.0);
    }

    #[tokio::test]
    async fn daily_view_sums_the_recorded_meals() {
        let ledger = MemoryLedger::default();
        let user = Uuid::new_v4();
        let day = date!(2024 - 05 - 01);
        ledger.append_meal(user, day, &meal(400.0)).await.expect("append");
        ledger.append_meal(user, day, &meal(350.0)).await.expect("append");

        let view = daily_view(&ledger, user, day).await.expect("view");
        assert_eq!(view.meals.len(), 2);
        assert_eq!(view.daily_totals.calories, 750.0);
        assert_eq!(view.daily_totals.protein, 24.0);
    }

    #[tokio::test]
    async fn monthly_view_omits_days_without_data() {
        let ledger = MemoryLedger::default();
        let user = Uuid::new_v4();
        ledger.append_meal(user, date!(2024 - 01 - 03), &meal(500.0)).await.expect("append");
        ledger.append_meal(user, date!(2024 - 01 - 25), &meal(600.0)).await.expect("append");
        ledger.append_meal(user, date!(2024 - 02 - 01), &meal(700.0)).await.expect("append");

        let summaries = monthly_view(&ledger, user, 2024, Month::January)
            .await
            .expect("view");
        let dates: Vec<&str> = summaries.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, ["2024-01-03", "2024-01-25"]);
        assert_eq!(summaries[1].daily_totals.calories, 600.0);
    }
}
