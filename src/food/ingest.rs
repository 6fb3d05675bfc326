use bytes::Bytes;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::repo::UserStore,
    error::ApiError,
    inference::{FoodClassifier, MacroPredictor},
    notify::Notifier,
    state::AppState,
};

use super::{
    ledger::{LedgerStore, Macronutrients, Meal},
    totals::{calories, daily_totals},
};

const TIME_FMT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

#[derive(Debug)]
pub struct IngestOutcome {
    pub meal: Meal,
    pub exceeded: bool,
    pub total_calories: f64,
}

/// Runs one uploaded image through the whole pipeline: classify, predict
/// macros, derive calories, append to the day's ledger, recompute the day
/// total and check it against the user's limit.
///
/// The user is loaded first so an unknown account never costs an inference
/// call. Notification delivery is best-effort; its failure is logged and
/// swallowed.
#[instrument(skip(state, image))]
pub async fn analyze_image(
    state: &AppState,
    user_id: Uuid,
    image: Bytes,
) -> Result<IngestOutcome, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    let foods = state.classifier.classify(&image).await.map_err(|e| {
        warn!(error = %e, "food classification failed");
        ApiError::Upstream("Failed to analyze image.".into())
    })?;

    let predicted = state.predictor.predict(&image).await.map_err(|e| {
        warn!(error = %e, "macro prediction failed");
        ApiError::Upstream("Failed to get macronutrient prediction.".into())
    })?;

    let kcal = calories(
        predicted.protein,
        predicted.carbs,
        predicted.fats,
        predicted.calories,
    );

    let now = OffsetDateTime::now_utc();
    let timestamp = now.time().format(TIME_FMT).map_err(anyhow::Error::from)?;
    let meal = Meal {
        timestamp,
        foods,
        calories: kcal,
        macronutrients: Macronutrients {
            protein: predicted.protein,
            carbs: predicted.carbs,
            fats: predicted.fats,
        },
    };

    let record = state.ledger.append_meal(user_id, now.date(), &meal).await?;
    let totals = daily_totals(&record.meals);

    let exceeded = totals.calories > user.daily_calorie_intake;
    if exceeded {
        info!(
            user_id = %user_id,
            total = totals.calories,
            limit = user.daily_calorie_intake,
            "daily calorie limit exceeded"
        );
        if let Err(e) = state
            .notifier
            .limit_exceeded(&user.email, totals.calories, user.daily_calorie_intake)
            .await
        {
            warn!(error = %e, "limit notification failed");
        }
    }

    Ok(IngestOutcome {
        meal,
        exceeded,
        total_calories: totals.calories,
    })
}
