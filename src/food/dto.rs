use serde::{Deserialize, Serialize};

use super::{ledger::Meal, totals::DailyTotals};

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub meal: Meal,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyView {
    pub meals: Vec<Meal>,
    pub daily_totals: DailyTotals,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: String,
    pub meals: Vec<Meal>,
    pub daily_totals: DailyTotals,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::ledger::Macronutrients;

    fn meal() -> Meal {
        Meal {
            timestamp: "09:00:00".into(),
            foods: vec!["toast".into()],
            calories: 220.0,
            macronutrients: Macronutrients {
                protein: 6.0,
                carbs: 40.0,
                fats: 3.0,
            },
        }
    }

    #[test]
    fn exceeded_flag_is_omitted_when_false() {
        let json = serde_json::to_string(&AnalyzeResponse {
            meal: meal(),
            exceeded: false,
            message: None,
        })
        .expect("serialize");
        assert!(!json.contains("exceeded"));
        assert!(!json.contains("message"));
    }

    #[test]
    fn exceeded_flag_is_present_when_true() {
        let json = serde_json::to_string(&AnalyzeResponse {
            meal: meal(),
            exceeded: true,
            message: Some("Daily calorie limit exceeded!".into()),
        })
        .expect("serialize");
        assert!(json.contains("\"exceeded\":true"));
        assert!(json.contains("Daily calorie limit exceeded!"));
    }

    #[test]
    fn daily_view_serializes_camel_case_totals() {
        let json = serde_json::to_string(&DailyView {
            meals: vec![],
            daily_totals: DailyTotals::default(),
        })
        .expect("serialize");
        assert!(json.contains("\"dailyTotals\""));
        assert!(json.contains("\"meals\":[]"));
    }
}
