use anyhow::Context;
use serde::Serialize;

use super::{ledger::DayRecord, totals::daily_totals};

/// One CSV line of the range export. Field order is the column order.
#[derive(Debug, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Foods")]
    pub foods: String,
    #[serde(rename = "Calories")]
    pub calories: f64,
    #[serde(rename = "Protein(g)")]
    pub protein: f64,
    #[serde(rename = "Carbs(g)")]
    pub carbs: f64,
    #[serde(rename = "Fats(g)")]
    pub fats: f64,
}

/// Flattens day records into export rows: per day, its meals time-ascending,
/// then one synthetic "Total" row. Days arrive date-ascending from the store
/// and stay that way.
pub fn export_rows(days: &[DayRecord]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for day in days {
        let date = day.date.to_string();

        let mut meals: Vec<_> = day.meals.iter().collect();
        // HH:MM:SS sorts lexicographically; the stable sort keeps append
        // order for equal timestamps.
        meals.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        for meal in &meals {
            rows.push(ExportRow {
                date: date.clone(),
                time: meal.timestamp.clone(),
                foods: meal.foods.join(", "),
                calories: meal.calories,
                protein: meal.macronutrients.protein,
                carbs: meal.macronutrients.carbs,
                fats: meal.macronutrients.fats,
            });
        }

        let totals = daily_totals(&day.meals);
        rows.push(ExportRow {
            date,
            time: String::new(),
            foods: "Total".into(),
            calories: totals.calories,
            protein: totals.protein,
            carbs: totals.carbs,
            fats: totals.fats,
        });
    }
    rows
}

/// Renders rows as CSV with the header taken from the row field names.
pub fn write_csv(rows: &[ExportRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).context("serialize export row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv buffer: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::ledger::{Macronutrients, Meal};
    use time::macros::date;
    use uuid::Uuid;

    fn meal(timestamp: &str, foods: &[&str], calories: f64) -> Meal {
        Meal {
            timestamp: timestamp.into(),
            foods: foods.iter().map(|f| f.to_string()).collect(),
            calories,
            macronutrients: Macronutrients {
                protein: 10.0,
                carbs: 20.0,
                fats: 5.0,
            },
        }
    }

    fn two_meal_day() -> DayRecord {
        DayRecord {
            user_id: Uuid::new_v4(),
            date: date!(2024 - 04 - 02),
            meals: vec![
                meal("19:30:00", &["pasta", "salad"], 650.0),
                meal("08:05:00", &["oatmeal"], 350.0),
            ],
        }
    }

    #[test]
    fn a_day_with_two_meals_yields_three_rows() {
        let rows = export_rows(&[two_meal_day()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].foods, "Total");
        assert_eq!(rows[2].calories, 1000.0);
        assert_eq!(rows[2].protein, 20.0);
        assert_eq!(rows[2].time, "");
    }

    #[test]
    fn meal_rows_come_out_time_ascending() {
        let rows = export_rows(&[two_meal_day()]);
        assert_eq!(rows[0].time, "08:05:00");
        assert_eq!(rows[1].time, "19:30:00");
    }

    #[test]
    fn foods_are_comma_joined() {
        let rows = export_rows(&[two_meal_day()]);
        assert_eq!(rows[1].foods, "pasta, salad");
    }

    #[test]
    fn total_rows_follow_each_day() {
        let mut second = two_meal_day();
        second.date = date!(2024 - 04 - 03);
        second.meals.truncate(1);
        let rows = export_rows(&[two_meal_day(), second]);

        assert_eq!(rows.len(), 5);
        let foods: Vec<&str> = rows.iter().map(|r| r.foods.as_str()).collect();
        assert_eq!(foods[2], "Total");
        assert_eq!(foods[4], "Total");
        assert_eq!(rows[3].date, "2024-04-03");
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(export_rows(&[]).is_empty());
    }

    #[test]
    fn csv_header_matches_the_contract() {
        let bytes = write_csv(&export_rows(&[two_meal_day()])).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Time,Foods,Calories,Protein(g),Carbs(g),Fats(g)")
        );
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn csv_quotes_joined_food_lists() {
        let bytes = write_csv(&export_rows(&[two_meal_day()])).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("\"pasta, salad\""));
    }
}
