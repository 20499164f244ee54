use crate::aggregate;
use crate::errors::AppError;
use crate::models::{AggregationMethod, RankSlot, ReportRow, WardAggregate};
use crate::period::DateRange;
use crate::ranking;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// The printable report always covers the last 30 days.
pub const REPORT_WINDOW_DAYS: i64 = 30;

pub fn window(today: NaiveDate) -> DateRange {
    DateRange {
        start: today - Duration::days(REPORT_WINDOW_DAYS),
        end: today,
    }
}

#[derive(Debug, Serialize)]
pub struct ReportWardValue {
    pub ward_id: Uuid,
    pub ward_name: String,
    pub membership: u32,
    pub value: f64,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct IndicatorSummary {
    pub indicator_id: Uuid,
    pub display_name: String,
    pub slug: String,
    pub aggregation: AggregationMethod,
    pub responsibility: String,
    pub order_index: i32,
    pub stake_total: f64,
    /// Wards ordered by per-capita score, best first.
    pub by_ward: Vec<ReportWardValue>,
    pub best: RankSlot,
    pub worst: RankSlot,
}

#[derive(Debug, Serialize)]
pub struct ReportWard {
    pub id: Uuid,
    pub name: String,
    pub membership: u32,
}

#[derive(Debug, Serialize)]
pub struct WeeklySeries {
    pub ward_name: String,
    /// One value per entry in `ReportData::weeks`; missing weeks read 0.
    pub values: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub generated_on: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub wards: Vec<ReportWard>,
    pub total_membership: u64,
    pub indicators: Vec<IndicatorSummary>,
    pub weeks: Vec<NaiveDate>,
    pub weekly: HashMap<Uuid, Vec<WeeklySeries>>,
}

/// Assembles the full report from the joined window rows. Unlike the
/// dashboard, snapshot values here are the last row inside the window; the
/// report summarizes what the window itself shows.
pub fn build_report(rows: &[ReportRow], today: NaiveDate) -> ReportData {
    let range = window(today);

    let mut ward_index: HashMap<Uuid, ReportWard> = HashMap::new();
    for row in rows {
        ward_index.entry(row.ward_id).or_insert_with(|| ReportWard {
            id: row.ward_id,
            name: row.ward_name.clone(),
            membership: row.ward_membership,
        });
    }
    let mut wards: Vec<ReportWard> = ward_index.into_values().collect();
    wards.sort_by(|a, b| a.name.cmp(&b.name));
    let total_membership = wards.iter().map(|w| w.membership as u64).sum();

    let mut weeks: Vec<NaiveDate> = rows.iter().map(|r| r.week_start).collect();
    weeks.sort();
    weeks.dedup();

    let mut by_indicator: HashMap<Uuid, Vec<&ReportRow>> = HashMap::new();
    for row in rows {
        by_indicator.entry(row.indicator_id).or_default().push(row);
    }

    let mut indicators = Vec::with_capacity(by_indicator.len());
    let mut weekly: HashMap<Uuid, Vec<WeeklySeries>> = HashMap::new();

    for (indicator_id, indicator_rows) in by_indicator {
        let Some(first) = indicator_rows.first() else {
            continue;
        };
        let method = first.aggregation;

        let mut per_ward = Vec::with_capacity(wards.len());
        for ward in &wards {
            let mut ward_rows: Vec<&&ReportRow> = indicator_rows
                .iter()
                .filter(|r| r.ward_id == ward.id)
                .collect();
            ward_rows.sort_by_key(|r| r.week_start);

            let (value, samples) = match method {
                AggregationMethod::Sum => {
                    let total: f64 = ward_rows.iter().map(|r| r.value).sum();
                    (total, ward_rows.len())
                }
                AggregationMethod::Avg => {
                    if ward_rows.is_empty() {
                        (0.0, 0)
                    } else {
                        let total: f64 = ward_rows.iter().map(|r| r.value).sum();
                        ((total / ward_rows.len() as f64).round(), ward_rows.len())
                    }
                }
                AggregationMethod::Snapshot => match ward_rows.last() {
                    Some(row) => (row.value, 1),
                    None => (0.0, 0),
                },
            };
            per_ward.push(WardAggregate {
                ward_id: ward.id,
                ward_name: ward.name.clone(),
                membership: ward.membership,
                value,
                samples,
            });
        }

        let stake_total = aggregate::stake_total(method, &per_ward);
        let ranked = ranking::rank(&per_ward);
        let (best, worst) = ranking::extremes(&ranked);
        let by_ward = ranked
            .into_iter()
            .map(|w| ReportWardValue {
                ward_id: w.ward_id,
                ward_name: w.ward_name,
                membership: w.membership,
                value: w.value,
                score: w.score,
            })
            .collect();

        indicators.push(IndicatorSummary {
            indicator_id,
            display_name: first.display_name.clone(),
            slug: first.slug.clone(),
            aggregation: method,
            responsibility: first.responsibility.clone(),
            order_index: first.order_index,
            stake_total,
            by_ward,
            best,
            worst,
        });

        let series = wards
            .iter()
            .map(|ward| WeeklySeries {
                ward_name: ward.name.clone(),
                values: weeks
                    .iter()
                    .map(|week| {
                        indicator_rows
                            .iter()
                            .find(|r| r.ward_id == ward.id && r.week_start == *week)
                            .map(|r| r.value)
                            .unwrap_or(0.0)
                    })
                    .collect(),
            })
            .collect();
        weekly.insert(indicator_id, series);
    }

    indicators.sort_by_key(|i| i.order_index);

    ReportData {
        generated_on: today,
        start: range.start,
        end: range.end,
        wards,
        total_membership,
        indicators,
        weeks,
        weekly,
    }
}

pub fn csv_filename(today: NaiveDate) -> String {
    format!("stake-report-{today}.csv")
}

/// Semicolon-delimited export with a UTF-8 byte-order mark and day-first
/// dates, so spreadsheet software in the target locale opens it cleanly.
pub fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, AppError> {
    let mut buffer = vec![0xEF, 0xBB, 0xBF];
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(&mut buffer);

        writer
            .write_record([
                "Unit",
                "Indicator",
                "Type",
                "Aggregation",
                "Responsibility",
                "Week",
                "Value",
                "Membership",
            ])
            .map_err(AppError::internal)?;

        for row in rows {
            writer
                .write_record([
                    row.ward_name.clone(),
                    row.display_name.clone(),
                    row.indicator_type.clone(),
                    row.aggregation.as_str().to_string(),
                    row.responsibility.clone(),
                    row.week_start.format("%d/%m/%Y").to_string(),
                    row.value.to_string(),
                    row.ward_membership.to_string(),
                ])
                .map_err(AppError::internal)?;
        }

        writer.flush().map_err(AppError::internal)?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(
        ward: (&str, u32, u128),
        indicator: (&str, AggregationMethod, i32, u128),
        week: NaiveDate,
        value: f64,
    ) -> ReportRow {
        ReportRow {
            ward_id: Uuid::from_u128(ward.2),
            ward_name: ward.0.to_string(),
            ward_membership: ward.1,
            indicator_id: Uuid::from_u128(indicator.3),
            slug: indicator.0.to_string(),
            display_name: indicator.0.to_string(),
            indicator_type: "weekly".to_string(),
            aggregation: indicator.1,
            responsibility: "Bishopric".to_string(),
            order_index: indicator.2,
            week_start: week,
            value,
        }
    }

    const ALPINE: (&str, u32, u128) = ("Alpine Ward", 100, 1);
    const BAYSIDE: (&str, u32, u128) = ("Bayside Ward", 200, 2);

    #[test]
    fn report_ranks_wards_per_capita() {
        let attendance = ("attendance", AggregationMethod::Sum, 1, 10);
        let today = date(2026, 3, 20);
        let rows = vec![
            row(ALPINE, attendance, date(2026, 3, 15), 50.0),
            row(BAYSIDE, attendance, date(2026, 3, 15), 50.0),
        ];
        let report = build_report(&rows, today);

        assert_eq!(report.indicators.len(), 1);
        let summary = &report.indicators[0];
        assert_eq!(summary.by_ward[0].ward_name, "Alpine Ward");
        assert_eq!(summary.by_ward[0].score, 500);
        assert_eq!(summary.by_ward[1].score, 250);
        assert_eq!(summary.best.name, "Alpine Ward");
        assert_eq!(summary.worst.name, "Bayside Ward");
        assert_eq!(summary.stake_total, 100.0);
    }

    #[test]
    fn avg_indicator_stake_row_averages_the_ward_averages() {
        let attendance = ("attendance", AggregationMethod::Avg, 1, 10);
        let today = date(2026, 3, 20);
        let rows = vec![
            row(ALPINE, attendance, date(2026, 3, 1), 90.0),
            row(ALPINE, attendance, date(2026, 3, 8), 110.0),
            row(BAYSIDE, attendance, date(2026, 3, 8), 40.0),
        ];
        let report = build_report(&rows, today);
        // Alpine averages 100 over two weeks, Bayside 40 over one; the stake
        // row averages the two ward averages, not the three raw rows.
        assert_eq!(report.indicators[0].stake_total, 70.0);
    }

    #[test]
    fn snapshot_uses_the_last_row_inside_the_window() {
        let recommends = ("recommends", AggregationMethod::Snapshot, 1, 10);
        let today = date(2026, 3, 20);
        let rows = vec![
            row(ALPINE, recommends, date(2026, 3, 1), 30.0),
            row(ALPINE, recommends, date(2026, 3, 15), 34.0),
        ];
        let report = build_report(&rows, today);
        assert_eq!(report.indicators[0].stake_total, 34.0);
    }

    #[test]
    fn weekly_series_fill_missing_weeks_with_zero() {
        let attendance = ("attendance", AggregationMethod::Sum, 1, 10);
        let today = date(2026, 3, 20);
        let rows = vec![
            row(ALPINE, attendance, date(2026, 3, 1), 80.0),
            row(ALPINE, attendance, date(2026, 3, 15), 95.0),
            row(BAYSIDE, attendance, date(2026, 3, 8), 60.0),
        ];
        let report = build_report(&rows, today);

        assert_eq!(report.weeks.len(), 3);
        let series = &report.weekly[&Uuid::from_u128(10)];
        let alpine = series.iter().find(|s| s.ward_name == "Alpine Ward").unwrap();
        assert_eq!(alpine.values, vec![80.0, 0.0, 95.0]);
        let bayside = series.iter().find(|s| s.ward_name == "Bayside Ward").unwrap();
        assert_eq!(bayside.values, vec![0.0, 60.0, 0.0]);
    }

    #[test]
    fn csv_has_bom_semicolons_and_day_first_dates() {
        let attendance = ("attendance", AggregationMethod::Sum, 1, 10);
        let rows = vec![row(ALPINE, attendance, date(2026, 3, 15), 120.0)];
        let bytes = render_csv(&rows).unwrap();

        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Unit;Indicator;Type;Aggregation;Responsibility;Week;Value;Membership"
        );
        let data_line = lines.next().unwrap();
        assert!(data_line.contains("Alpine Ward;attendance"));
        assert!(data_line.contains("15/03/2026"));
        assert!(data_line.ends_with(";120;100"));
    }

    #[test]
    fn csv_filename_embeds_the_export_date() {
        assert_eq!(
            csv_filename(date(2026, 3, 20)),
            "stake-report-2026-03-20.csv"
        );
    }
}
