use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// How weekly observations roll up into a single value for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    Sum,
    Avg,
    Snapshot,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Snapshot => "snapshot",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ward {
    pub id: Uuid,
    pub name: String,
    pub membership_count: u32,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub indicator_type: String,
    pub aggregation: AggregationMethod,
    pub responsibility: String,
    pub order_index: i32,
    pub active: bool,
}

/// One reported value for one (ward, indicator, week). `week_start` is always
/// a Sunday; the store rejects a second row for the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub ward_id: Uuid,
    pub indicator_id: Uuid,
    pub value: f64,
    pub week_start: NaiveDate,
    pub source: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub ward_id: Uuid,
    pub indicator_id: Uuid,
    pub year: i32,
    pub target_value: f64,
}

/// Everything the backing file holds.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    pub wards: Vec<Ward>,
    pub indicators: Vec<Indicator>,
    pub observations: Vec<Observation>,
    pub targets: Vec<Target>,
}

/// Flattened ward × indicator × week row, as returned by the store's joined
/// read procedures so pages never join on the client.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub ward_id: Uuid,
    pub ward_name: String,
    pub ward_membership: u32,
    pub indicator_id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub indicator_type: String,
    pub aggregation: AggregationMethod,
    pub responsibility: String,
    pub order_index: i32,
    pub week_start: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct DefinitionsResponse {
    pub wards: Vec<Ward>,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub ward_id: Option<Uuid>,
    pub indicator_id: Option<Uuid>,
    pub value: Option<f64>,
    pub week_start: Option<NaiveDate>,
    /// Paired value for compound indicators (recommends without endowment).
    pub secondary_value: Option<f64>,
    /// New membership total, accepted only for the participating-members entry.
    pub membership_count: Option<u32>,
    pub created_by: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryResponse {
    pub outcome: String,
    pub message: String,
    pub observation_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EntryUpdateRequest {
    pub value: f64,
    pub week_start: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub ward_id: Uuid,
    pub ward_name: String,
    pub indicator_id: Uuid,
    pub indicator_name: String,
    pub value: f64,
    pub week_start: NaiveDate,
    pub week_label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Serialize)]
pub struct WeekOption {
    pub date: NaiveDate,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryOptions {
    pub wards: Vec<Ward>,
    pub indicators: Vec<Indicator>,
    pub weeks: Vec<WeekOption>,
}

/// Per-ward aggregate for one indicator over a resolved period.
#[derive(Debug, Clone, Serialize)]
pub struct WardAggregate {
    pub ward_id: Uuid,
    pub ward_name: String,
    pub membership: u32,
    pub value: f64,
    /// Observations that fed the value; zero means the ward reported nothing
    /// in scope and is excluded from average denominators.
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankSlot {
    pub name: String,
    pub value: f64,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardCard {
    pub indicator_id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub aggregation: AggregationMethod,
    pub stake_total: f64,
    pub per_ward: Vec<WardAggregate>,
    pub best: RankSlot,
    pub worst: RankSlot,
    pub target: f64,
    pub progress_percent: u32,
    pub gap: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub period: String,
    pub week_label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub latest_week: Option<NaiveDate>,
    pub cards: Vec<DashboardCard>,
}

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub year: i32,
    /// ward id → indicator id → annual target.
    pub matrix: HashMap<Uuid, HashMap<Uuid, f64>>,
    /// indicator id → stake-wide target (sum across wards).
    pub stake_totals: HashMap<Uuid, f64>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub ward_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub text: String,
}
