use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use thiserror::Error;
use time::{Date, Month};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macronutrients {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// One recognized eating event. Immutable once appended to a day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Wall-clock time of day, `HH:MM:SS` zero-padded.
    pub timestamp: String,
    pub foods: Vec<String>,
    pub calories: f64,
    pub macronutrients: Macronutrients,
}

/// Per-user, per-calendar-day container of meals. At most one exists for a
/// given (user, date); meals keep their append order.
#[derive(Debug, Clone)]
pub struct DayRecord {
    pub user_id: Uuid,
    pub date: Date,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid calendar range: {0}")]
    InvalidRange(#[from] time::error::ComponentRange),

    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// First and last calendar day of a month. Real calendar arithmetic: February
/// length follows the leap-year rules and December stays in its own year.
pub fn month_bounds(year: i32, month: Month) -> Result<(Date, Date), LedgerError> {
    let first = Date::from_calendar_date(year, month, 1)?;
    let last = first.replace_day(time::util::days_in_year_month(year, month))?;
    Ok((first, last))
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends a meal to the (user, date) record, creating the record if this
    /// is the day's first meal. Returns the post-append record. The append is
    /// atomic at the store level: concurrent calls for the same day must all
    /// land, in some interleaving order.
    async fn append_meal(
        &self,
        user_id: Uuid,
        date: Date,
        meal: &Meal,
    ) -> Result<DayRecord, LedgerError>;

    async fn find_by_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<DayRecord>, LedgerError>;

    /// Day records in `[start, end]`, date ascending. Either bound may be
    /// open.
    async fn find_range(
        &self,
        user_id: Uuid,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<DayRecord>, LedgerError>;

    async fn find_month(
        &self,
        user_id: Uuid,
        year: i32,
        month: Month,
    ) -> Result<Vec<DayRecord>, LedgerError> {
        let (first, last) = month_bounds(year, month)?;
        self.find_range(user_id, Some(first), Some(last)).await
    }
}

#[derive(Debug, FromRow)]
struct DayRow {
    user_id: Uuid,
    date: Date,
    meals: Json<Vec<Meal>>,
}

impl From<DayRow> for DayRecord {
    fn from(r: DayRow) -> Self {
        Self {
            user_id: r.user_id,
            date: r.date,
            meals: r.meals.0,
        }
    }
}

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn append_meal(
        &self,
        user_id: Uuid,
        date: Date,
        meal: &Meal,
    ) -> Result<DayRecord, LedgerError> {
        // Single-statement upsert: the JSONB `||` append happens inside the
        // row lock, so concurrent appends to one day all land.
        let row = sqlx::query_as::<_, DayRow>(
            r#"
            INSERT INTO day_records (user_id, date, meals)
            VALUES ($1, $2, jsonb_build_array($3::jsonb))
            ON CONFLICT (user_id, date)
            DO UPDATE SET meals = day_records.meals || EXCLUDED.meals
            RETURNING user_id, date, meals
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(Json(meal))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_by_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<DayRecord>, LedgerError> {
        let row = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT user_id, date, meals
            FROM day_records
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_range(
        &self,
        user_id: Uuid,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<DayRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT user_id, date, meals
            FROM day_records
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// In-memory ledger with the same contract; backs `AppState::fake()` and
/// tests. Appends happen under one lock, so they are atomic per store.
#[derive(Default)]
pub struct MemoryLedger {
    days: Mutex<BTreeMap<(Uuid, Date), Vec<Meal>>>,
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn append_meal(
        &self,
        user_id: Uuid,
        date: Date,
        meal: &Meal,
    ) -> Result<DayRecord, LedgerError> {
        let mut days = self.days.lock().await;
        let meals = days.entry((user_id, date)).or_default();
        meals.push(meal.clone());
        Ok(DayRecord {
            user_id,
            date,
            meals: meals.clone(),
        })
    }

    async fn find_by_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<DayRecord>, LedgerError> {
        let days = self.days.lock().await;
        Ok(days.get(&(user_id, date)).map(|meals| DayRecord {
            user_id,
            date,
            meals: meals.clone(),
        }))
    }

    async fn find_range(
        &self,
        user_id: Uuid,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<DayRecord>, LedgerError> {
        let days = self.days.lock().await;
        let records = days
            .iter()
            .filter(|((uid, date), _)| {
                *uid == user_id
                    && start.map_or(true, |s| *date >= s)
                    && end.map_or(true, |e| *date <= e)
            })
            .map(|((_, date), meals)| DayRecord {
                user_id,
                date: *date,
                meals: meals.clone(),
            })
            .collect();
        Ok(records)
    }
}
