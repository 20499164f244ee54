use crate::errors::AppError;
use crate::models::{
    DefinitionsResponse, HistoryEntry, HistoryOptions, HistoryPage, Indicator, Observation,
    ReportRow, StoreData, Target, Ward, WeekOption,
};
use crate::models::AggregationMethod;
use crate::period;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;
use uuid::Uuid;

/// Errors surfaced by the table-like store operations. The duplicate variant
/// maps to the "already recorded" message upstream.
#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
    Duplicate,
    NotFound,
}

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> StoreData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                seed_catalog()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => seed_catalog(),
        Err(err) => {
            error!("failed to read data file: {err}");
            seed_catalog()
        }
    }
}

pub async fn persist_data(path: &Path, data: &StoreData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

// Stable seed ids so a wiped data file still lines up with previously
// exported reports.
const WARD_ID_BASE: u128 = 0x9e8d_7c6b_5a49_3827_1605_f4e3_d2c1_b001;
const INDICATOR_ID_BASE: u128 = 0x1a2b_3c4d_5e6f_7081_92a3_b4c5_d6e7_f001;

fn ward_seed_id(index: u128) -> Uuid {
    Uuid::from_u128(WARD_ID_BASE + index)
}

fn indicator_seed_id(index: u128) -> Uuid {
    Uuid::from_u128(INDICATOR_ID_BASE + index)
}

/// Catalog used when the data file does not exist yet: the eight wards of the
/// stake and the eight tracked indicators. Targets start empty.
pub fn seed_catalog() -> StoreData {
    let ward_rows: [(&str, u32); 8] = [
        ("Cedar Grove Ward", 312),
        ("Crestwood Ward", 268),
        ("Fairview Ward", 401),
        ("Lakeview Ward", 187),
        ("Maple Hill Ward", 294),
        ("Oakdale Ward", 223),
        ("Riverside Ward", 356),
        ("Willow Creek Branch", 74),
    ];
    let wards = ward_rows
        .iter()
        .enumerate()
        .map(|(i, (name, membership))| Ward {
            id: ward_seed_id(i as u128),
            name: name.to_string(),
            membership_count: *membership,
            active: true,
        })
        .collect();

    let indicator_rows: [(&str, &str, &str, AggregationMethod, &str); 8] = [
        (
            "sacrament_attendance",
            "Sacrament Meeting Attendance",
            "weekly",
            AggregationMethod::Avg,
            "Bishopric",
        ),
        (
            "convert_baptisms",
            "Convert Baptisms",
            "cumulative",
            AggregationMethod::Sum,
            "Ward Mission",
        ),
        (
            "returning_members",
            "Members Returning to Church",
            "stock",
            AggregationMethod::Snapshot,
            "Elders Quorum",
        ),
        (
            "participating_members",
            "Participating Members",
            "stock",
            AggregationMethod::Snapshot,
            "Ward Council",
        ),
        (
            "members_fasting",
            "Members Fasting",
            "monthly",
            AggregationMethod::Sum,
            "Bishopric",
        ),
        (
            "missionaries_serving",
            "Missionaries Serving",
            "stock",
            AggregationMethod::Snapshot,
            "Stake Presidency",
        ),
        (
            "temple_recommends_endowed",
            "Temple Recommends - Endowed Members",
            "stock",
            AggregationMethod::Snapshot,
            "Stake Presidency",
        ),
        (
            "temple_recommends_unendowed",
            "Temple Recommends - Unendowed Members",
            "stock",
            AggregationMethod::Snapshot,
            "Bishopric",
        ),
    ];
    let indicators = indicator_rows
        .iter()
        .enumerate()
        .map(
            |(i, (slug, display_name, indicator_type, aggregation, responsibility))| Indicator {
                id: indicator_seed_id(i as u128),
                slug: slug.to_string(),
                display_name: display_name.to_string(),
                indicator_type: indicator_type.to_string(),
                aggregation: *aggregation,
                responsibility: responsibility.to_string(),
                order_index: i as i32 + 1,
                active: true,
            },
        )
        .collect();

    StoreData {
        wards,
        indicators,
        observations: Vec::new(),
        targets: Vec::new(),
    }
}

/// Active catalog entries, wards by name and indicators by their configured
/// order.
pub fn definitions(data: &StoreData) -> DefinitionsResponse {
    let mut wards: Vec<Ward> = data.wards.iter().filter(|w| w.active).cloned().collect();
    wards.sort_by(|a, b| a.name.cmp(&b.name));

    let mut indicators: Vec<Indicator> = data
        .indicators
        .iter()
        .filter(|i| i.active)
        .cloned()
        .collect();
    indicators.sort_by_key(|i| i.order_index);

    DefinitionsResponse { wards, indicators }
}

pub fn ward_by_id(data: &StoreData, id: Uuid) -> Option<&Ward> {
    data.wards.iter().find(|w| w.id == id)
}

pub fn indicator_by_id(data: &StoreData, id: Uuid) -> Option<&Indicator> {
    data.indicators.iter().find(|i| i.id == id)
}

pub fn indicator_by_slug<'a>(data: &'a StoreData, slug: &str) -> Option<&'a Indicator> {
    data.indicators.iter().find(|i| i.slug == slug)
}

/// Inserts one observation, enforcing the one-row-per-(ward, indicator, week)
/// constraint the hosted backend used to own.
pub fn insert_observation(data: &mut StoreData, observation: Observation) -> Result<(), StoreError> {
    let duplicate = data.observations.iter().any(|o| {
        o.ward_id == observation.ward_id
            && o.indicator_id == observation.indicator_id
            && o.week_start == observation.week_start
    });
    if duplicate {
        return Err(StoreError::Duplicate);
    }
    data.observations.push(observation);
    Ok(())
}

/// In-place edit of value and reference week. Moving the row onto an already
/// occupied week fails the same way a fresh duplicate insert would.
pub fn update_observation(
    data: &mut StoreData,
    id: Uuid,
    value: f64,
    week_start: NaiveDate,
) -> Result<(), StoreError> {
    let current = data
        .observations
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .ok_or(StoreError::NotFound)?;

    let occupied = data.observations.iter().any(|o| {
        o.id != id
            && o.ward_id == current.ward_id
            && o.indicator_id == current.indicator_id
            && o.week_start == week_start
    });
    if occupied {
        return Err(StoreError::Duplicate);
    }

    for observation in data.observations.iter_mut() {
        if observation.id == id {
            observation.value = value;
            observation.week_start = week_start;
        }
    }
    Ok(())
}

pub fn delete_observation(data: &mut StoreData, id: Uuid) -> Result<(), StoreError> {
    let before = data.observations.len();
    data.observations.retain(|o| o.id != id);
    if data.observations.len() == before {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub fn update_membership(data: &mut StoreData, ward_id: Uuid, membership_count: u32) -> bool {
    for ward in data.wards.iter_mut() {
        if ward.id == ward_id {
            ward.membership_count = membership_count;
            return true;
        }
    }
    false
}

#[derive(Debug, Default, Clone)]
pub struct HistoryFilter {
    pub wards: Vec<Uuid>,
    pub indicators: Vec<Uuid>,
    pub week: Option<NaiveDate>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub page: usize,
    pub page_size: usize,
}

fn history_entry(data: &StoreData, observation: &Observation) -> HistoryEntry {
    let ward_name = ward_by_id(data, observation.ward_id)
        .map(|w| w.name.clone())
        .unwrap_or_default();
    let indicator_name = indicator_by_id(data, observation.indicator_id)
        .map(|i| i.display_name.clone())
        .unwrap_or_default();
    HistoryEntry {
        id: observation.id,
        ward_id: observation.ward_id,
        ward_name,
        indicator_id: observation.indicator_id,
        indicator_name,
        value: observation.value,
        week_start: observation.week_start,
        week_label: period::week_label(observation.week_start),
        created_at: observation.created_at,
    }
}

/// Paginated, filterable listing over raw observations, newest week first and
/// newest entry first within a week.
pub fn history(data: &StoreData, filter: &HistoryFilter) -> HistoryPage {
    let mut matches: Vec<&Observation> = data
        .observations
        .iter()
        .filter(|o| filter.wards.is_empty() || filter.wards.contains(&o.ward_id))
        .filter(|o| filter.indicators.is_empty() || filter.indicators.contains(&o.indicator_id))
        .filter(|o| filter.week.map_or(true, |week| o.week_start == week))
        .filter(|o| {
            filter
                .created_from
                .map_or(true, |from| o.created_at.date_naive() >= from)
        })
        .filter(|o| {
            filter
                .created_to
                .map_or(true, |to| o.created_at.date_naive() <= to)
        })
        .collect();
    matches.sort_by(|a, b| {
        b.week_start
            .cmp(&a.week_start)
            .then(b.created_at.cmp(&a.created_at))
    });

    let total = matches.len();
    let page = filter.page.max(1);
    let page_size = filter.page_size.clamp(1, 200);
    let entries = matches
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|o| history_entry(data, o))
        .collect();

    HistoryPage {
        entries,
        total,
        page,
        page_size,
    }
}

/// Distinct filter choices for the ledger page.
pub fn history_options(data: &StoreData) -> HistoryOptions {
    let defs = definitions(data);
    let mut weeks: Vec<NaiveDate> = data.observations.iter().map(|o| o.week_start).collect();
    weeks.sort();
    weeks.dedup();
    weeks.reverse();
    let weeks = weeks
        .into_iter()
        .map(|date| WeekOption {
            date,
            label: period::week_label(date),
        })
        .collect();

    HistoryOptions {
        wards: defs.wards,
        indicators: defs.indicators,
        weeks,
    }
}

pub fn recent_entries(data: &StoreData, limit: usize) -> Vec<HistoryEntry> {
    let mut observations: Vec<&Observation> = data.observations.iter().collect();
    observations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    observations
        .into_iter()
        .take(limit)
        .map(|o| history_entry(data, o))
        .collect()
}

pub fn targets_for_year(data: &StoreData, year: i32) -> Vec<Target> {
    data.targets.iter().filter(|t| t.year == year).cloned().collect()
}

/// Most recent reference week anywhere in the data; the dashboard opens on it.
pub fn latest_week(data: &StoreData) -> Option<NaiveDate> {
    data.observations.iter().map(|o| o.week_start).max()
}

/// Joined ward × indicator × week rows, already flattened so no page joins on
/// the client. `start` is optional so snapshot consumers can read the full
/// backlog up to `end`.
pub fn report_rows(data: &StoreData, start: Option<NaiveDate>, end: NaiveDate) -> Vec<ReportRow> {
    let wards: HashMap<Uuid, &Ward> = data.wards.iter().map(|w| (w.id, w)).collect();
    let indicators: HashMap<Uuid, &Indicator> =
        data.indicators.iter().map(|i| (i.id, i)).collect();

    let mut rows: Vec<ReportRow> = data
        .observations
        .iter()
        .filter(|o| o.week_start <= end && start.map_or(true, |s| o.week_start >= s))
        .filter_map(|o| {
            let ward = wards.get(&o.ward_id)?;
            let indicator = indicators.get(&o.indicator_id)?;
            Some(ReportRow {
                ward_id: ward.id,
                ward_name: ward.name.clone(),
                ward_membership: ward.membership_count,
                indicator_id: indicator.id,
                slug: indicator.slug.clone(),
                display_name: indicator.display_name.clone(),
                indicator_type: indicator.indicator_type.clone(),
                aggregation: indicator.aggregation,
                responsibility: indicator.responsibility.clone(),
                order_index: indicator.order_index,
                week_start: o.week_start,
                value: o.value,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.order_index
            .cmp(&b.order_index)
            .then(a.ward_name.cmp(&b.ward_name))
            .then(a.week_start.cmp(&b.week_start))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(ward: Uuid, indicator: Uuid, week: NaiveDate, value: f64) -> Observation {
        Observation {
            id: Uuid::new_v4(),
            ward_id: ward,
            indicator_id: indicator,
            value,
            week_start: week,
            source: "manual".to_string(),
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seed_catalog_has_the_full_ward_and_indicator_set() {
        let data = seed_catalog();
        assert_eq!(data.wards.len(), 8);
        assert_eq!(data.indicators.len(), 8);
        assert!(indicator_by_slug(&data, "temple_recommends_unendowed").is_some());
        assert!(data.observations.is_empty());
    }

    #[test]
    fn duplicate_insert_is_rejected_without_mutating_data() {
        let mut data = seed_catalog();
        let ward = data.wards[0].id;
        let indicator = data.indicators[0].id;
        let week = date(2026, 1, 4);

        insert_observation(&mut data, observation(ward, indicator, week, 100.0)).unwrap();
        let err = insert_observation(&mut data, observation(ward, indicator, week, 55.0));
        assert_eq!(err, Err(StoreError::Duplicate));
        assert_eq!(data.observations.len(), 1);
        assert_eq!(data.observations[0].value, 100.0);
    }

    #[test]
    fn update_cannot_land_on_an_occupied_week() {
        let mut data = seed_catalog();
        let ward = data.wards[0].id;
        let indicator = data.indicators[0].id;
        let first = observation(ward, indicator, date(2026, 1, 4), 100.0);
        let second = observation(ward, indicator, date(2026, 1, 11), 90.0);
        let second_id = second.id;
        insert_observation(&mut data, first).unwrap();
        insert_observation(&mut data, second).unwrap();

        let err = update_observation(&mut data, second_id, 90.0, date(2026, 1, 4));
        assert_eq!(err, Err(StoreError::Duplicate));

        update_observation(&mut data, second_id, 95.0, date(2026, 1, 11)).unwrap();
        assert_eq!(data.observations[1].value, 95.0);
    }

    #[test]
    fn history_filters_and_paginates() {
        let mut data = seed_catalog();
        let ward_a = data.wards[0].id;
        let ward_b = data.wards[1].id;
        let indicator = data.indicators[0].id;
        for week in 0..5 {
            let day = date(2026, 1, 4) + chrono::Duration::weeks(week);
            insert_observation(&mut data, observation(ward_a, indicator, day, week as f64)).unwrap();
        }
        insert_observation(&mut data, observation(ward_b, indicator, date(2026, 1, 4), 7.0))
            .unwrap();

        let filter = HistoryFilter {
            wards: vec![ward_a],
            page: 1,
            page_size: 2,
            ..HistoryFilter::default()
        };
        let page = history(&data, &filter);
        assert_eq!(page.total, 5);
        assert_eq!(page.entries.len(), 2);
        // Newest week first.
        assert_eq!(page.entries[0].week_start, date(2026, 2, 1));

        let filter = HistoryFilter {
            week: Some(date(2026, 1, 4)),
            page: 1,
            page_size: 50,
            ..HistoryFilter::default()
        };
        assert_eq!(history(&data, &filter).total, 2);
    }

    #[test]
    fn report_rows_join_ward_and_indicator_fields() {
        let mut data = seed_catalog();
        let ward = data.wards[0].clone();
        let indicator = data.indicators[0].clone();
        insert_observation(
            &mut data,
            observation(ward.id, indicator.id, date(2026, 1, 4), 120.0),
        )
        .unwrap();

        let rows = report_rows(&data, None, date(2026, 1, 31));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ward_name, ward.name);
        assert_eq!(rows[0].slug, indicator.slug);
        assert_eq!(rows[0].ward_membership, ward.membership_count);

        // Bounded reads exclude earlier weeks.
        let rows = report_rows(&data, Some(date(2026, 1, 11)), date(2026, 1, 31));
        assert!(rows.is_empty());
    }
}
