use serde::Serialize;

use super::ledger::Meal;

/// Calories per gram of protein, carbohydrate and fat.
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Sums calories and macros over a day's meals. An empty day is all zeroes.
/// Totals always sum per-meal calories as stored at ingestion time; they are
/// never re-derived from macros here.
pub fn daily_totals(meals: &[Meal]) -> DailyTotals {
    meals.iter().fold(DailyTotals::default(), |acc, meal| DailyTotals {
        calories: acc.calories + meal.calories,
        protein: acc.protein + meal.macronutrients.protein,
        carbs: acc.carbs + meal.macronutrients.carbs,
        fats: acc.fats + meal.macronutrients.fats,
    })
}

/// Single source of truth for calorie derivation. A reported value of zero
/// (or less) means the prediction service had no estimate, so the Atwater
/// derivation applies.
pub fn calories(protein: f64, carbs: f64, fats: f64, provided: Option<f64>) -> f64 {
    match provided {
        Some(kcal) if kcal > 0.0 => kcal,
        _ => protein * KCAL_PER_G_PROTEIN + carbs * KCAL_PER_G_CARBS + fats * KCAL_PER_G_FAT,
    }
}
