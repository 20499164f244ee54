use crate::aggregate;
use crate::analysis::{self, AnalysisLine, AnalysisPayload};
use crate::entry::{self, EntryError};
use crate::errors::AppError;
use crate::models::{
    AnalysisRequest, AnalysisResponse, DashboardCard, DashboardResponse, DefinitionsResponse,
    EntryRequest, EntryResponse, EntryUpdateRequest, HistoryEntry, HistoryOptions, HistoryPage,
    TargetsResponse,
};
use crate::period::{self, Period};
use crate::ranking;
use crate::report;
use crate::state::AppState;
use crate::store::{self, HistoryFilter, StoreError};
use crate::targets;
use crate::ui;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn dashboard_page() -> Html<String> {
    Html(ui::render_dashboard())
}

pub async fn entry_page() -> Html<String> {
    Html(ui::render_entry())
}

pub async fn history_page() -> Html<String> {
    Html(ui::render_history())
}

pub async fn report_page() -> Html<String> {
    Html(ui::render_report())
}

pub async fn get_definitions(
    State(state): State<AppState>,
) -> Result<Json<DefinitionsResponse>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(store::definitions(&data)))
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    period: Option<String>,
    year: Option<i32>,
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let today = today();
    let data = state.data.lock().await;
    let latest_week = store::latest_week(&data);

    let period = match query.period.as_deref() {
        Some(token) => {
            Period::parse(token).ok_or_else(|| AppError::bad_request("unknown period token"))?
        }
        // First load opens on the most recent reported week.
        None => Period::Week(latest_week.unwrap_or(today)),
    };
    let range = period.resolve(today);
    let year = query.year.unwrap_or_else(|| range.end.year());

    let defs = store::definitions(&data);
    // Unbounded read so snapshot indicators can look past the range start.
    let rows = store::report_rows(&data, None, range.end);
    let target_rows = store::targets_for_year(&data, year);
    let target_summary = targets::summarize(year, &target_rows, &defs.indicators);

    let cards = defs
        .indicators
        .iter()
        .map(|indicator| {
            let agg = aggregate::aggregate_indicator(indicator, &defs.wards, &rows, &range);
            let ranked = ranking::rank(&agg.per_ward);
            let (best, worst) = ranking::extremes(&ranked);
            let target = target_summary
                .stake_totals
                .get(&indicator.id)
                .copied()
                .unwrap_or(0.0);
            DashboardCard {
                indicator_id: indicator.id,
                slug: indicator.slug.clone(),
                display_name: indicator.display_name.clone(),
                aggregation: indicator.aggregation,
                stake_total: agg.stake_total,
                per_ward: agg.per_ward,
                best,
                worst,
                target,
                progress_percent: targets::progress_percent(agg.stake_total, target),
                gap: targets::gap(agg.stake_total, target),
            }
        })
        .collect();

    Ok(Json(DashboardResponse {
        period: period.token(),
        week_label: period::week_label(period::week_anchor(range.end)),
        start: range.start,
        end: range.end,
        latest_week,
        cards,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TargetsQuery {
    year: Option<i32>,
}

pub async fn get_targets(
    State(state): State<AppState>,
    Query(query): Query<TargetsQuery>,
) -> Result<Json<TargetsResponse>, AppError> {
    let year = query.year.unwrap_or_else(|| today().year());
    let data = state.data.lock().await;
    let target_rows = store::targets_for_year(&data, year);
    let defs = store::definitions(&data);
    Ok(Json(targets::summarize(year, &target_rows, &defs.indicators)))
}

pub async fn submit_entry(
    State(state): State<AppState>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    let mut data = state.data.lock().await;
    let response = match entry::submit(&mut data, &request, today(), &state.entry_config) {
        Ok(response) => response,
        Err(EntryError::Validation(message)) => return Err(AppError::bad_request(message)),
        Err(EntryError::Duplicate) => {
            return Err(AppError::conflict(
                "This indicator is already recorded for this ward and Sunday.",
            ))
        }
    };

    store::persist_data(&state.data_path, &data).await?;
    Ok(Json(response))
}

pub async fn get_recent_entries(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(store::recent_entries(&data, 5)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    page: Option<usize>,
    page_size: Option<usize>,
    wards: Option<String>,
    indicators: Option<String>,
    week: Option<NaiveDate>,
    created_from: Option<NaiveDate>,
    created_to: Option<NaiveDate>,
}

fn parse_id_list(raw: Option<&str>, label: &str) -> Result<Vec<Uuid>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Uuid>()
                .map_err(|_| AppError::bad_request(format!("invalid {label} filter")))
        })
        .collect()
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, AppError> {
    let filter = HistoryFilter {
        wards: parse_id_list(query.wards.as_deref(), "ward")?,
        indicators: parse_id_list(query.indicators.as_deref(), "indicator")?,
        week: query.week,
        created_from: query.created_from,
        created_to: query.created_to,
        page: query.page.unwrap_or(1),
        page_size: query.page_size.unwrap_or(15),
    };

    let data = state.data.lock().await;
    Ok(Json(store::history(&data, &filter)))
}

pub async fn get_history_options(
    State(state): State<AppState>,
) -> Result<Json<HistoryOptions>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(store::history_options(&data)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EntryUpdateRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    if !request.value.is_finite() || request.value < 0.0 {
        return Err(AppError::bad_request("Value must be a non-negative number."));
    }
    if request.week_start.weekday() != chrono::Weekday::Sun {
        return Err(AppError::bad_request("The reference date must be a Sunday."));
    }

    let mut data = state.data.lock().await;
    match store::update_observation(&mut data, id, request.value, request.week_start) {
        Ok(()) => {}
        Err(StoreError::NotFound) => return Err(AppError::not_found("Entry not found.")),
        Err(StoreError::Duplicate) => {
            return Err(AppError::conflict(
                "This indicator is already recorded for this ward and Sunday.",
            ))
        }
    }
    store::persist_data(&state.data_path, &data).await?;

    Ok(Json(EntryResponse {
        outcome: "updated".to_string(),
        message: "Entry updated.".to_string(),
        observation_id: Some(id),
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryResponse>, AppError> {
    let mut data = state.data.lock().await;
    match store::delete_observation(&mut data, id) {
        Ok(()) => {}
        Err(_) => return Err(AppError::not_found("Entry not found.")),
    }
    store::persist_data(&state.data_path, &data).await?;

    Ok(Json(EntryResponse {
        outcome: "deleted".to_string(),
        message: "Entry deleted.".to_string(),
        observation_id: Some(id),
    }))
}

pub async fn get_report(State(state): State<AppState>) -> Result<Json<report::ReportData>, AppError> {
    let today = today();
    let range = report::window(today);
    let data = state.data.lock().await;
    let rows = store::report_rows(&data, Some(range.start), range.end);
    Ok(Json(report::build_report(&rows, today)))
}

pub async fn get_report_csv(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let today = today();
    let range = report::window(today);
    let data = state.data.lock().await;
    let rows = store::report_rows(&data, Some(range.start), range.end);
    let bytes = report::render_csv(&rows)?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report::csv_filename(today)),
            ),
        ],
        bytes,
    ))
}

pub async fn run_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let url = state
        .analysis_url
        .clone()
        .ok_or_else(|| AppError::bad_gateway("Analysis service is not configured."))?;

    let today = today();
    let payload = {
        let data = state.data.lock().await;
        let ward = store::ward_by_id(&data, request.ward_id)
            .ok_or_else(|| AppError::not_found("Unknown ward."))?
            .clone();
        let defs = store::definitions(&data);
        let year = today.year();
        let target_rows = store::targets_for_year(&data, year);
        let target_summary = targets::summarize(year, &target_rows, &defs.indicators);

        // Year-to-date aggregates against the ward's own annual targets.
        let range = crate::period::DateRange {
            start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(today),
            end: today,
        };
        let rows = store::report_rows(&data, None, range.end);

        let indicators = defs
            .indicators
            .iter()
            .map(|indicator| {
                let agg = aggregate::aggregate_indicator(indicator, &defs.wards, &rows, &range);
                let value = agg
                    .per_ward
                    .iter()
                    .find(|w| w.ward_id == ward.id)
                    .map(|w| w.value)
                    .unwrap_or(0.0);
                let target = target_summary
                    .matrix
                    .get(&ward.id)
                    .and_then(|row| row.get(&indicator.id))
                    .copied()
                    .unwrap_or(0.0);
                AnalysisLine {
                    indicator: indicator.display_name.clone(),
                    current_value: value,
                    target,
                    progress_percent: targets::progress_percent(value, target),
                    gap: targets::gap(value, target),
                }
            })
            .collect();

        AnalysisPayload {
            unit: ward.name,
            generated_on: today,
            indicators,
        }
    };

    let text = analysis::narrative(&state.http, &url, &payload).await?;
    Ok(Json(AnalysisResponse { text }))
}
