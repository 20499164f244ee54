use crate::models::{EntryRequest, EntryResponse, Observation, StoreData};
use crate::store::{self, StoreError};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use tracing::warn;
use uuid::Uuid;

/// Submitting this indicator requires a paired unendowed value.
pub const RECOMMENDS_PRIMARY_SLUG: &str = "temple_recommends_endowed";
pub const RECOMMENDS_SECONDARY_SLUG: &str = "temple_recommends_unendowed";
/// Submitting this indicator may also refresh the ward's membership count.
pub const MEMBERSHIP_SLUG: &str = "participating_members";

const MEMBERSHIP_CEILING: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct EntryConfig {
    /// Values above this are treated as data-entry mistakes, not domain data.
    pub max_value: f64,
    /// Oldest accepted reference week, counted back from today.
    pub max_age_days: i64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            max_value: 10_000.0,
            max_age_days: 90,
        }
    }
}

impl EntryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_value = std::env::var("ENTRY_MAX_VALUE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(defaults.max_value);
        let max_age_days = std::env::var("ENTRY_MAX_AGE_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults.max_age_days);
        Self {
            max_value,
            max_age_days,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum EntryError {
    /// Client-detected problem; reported inline, never reaches the store.
    Validation(String),
    /// The (ward, indicator, week) key is already recorded.
    Duplicate,
}

/// Validation rules in submission order; the first failure wins.
pub fn validate_value_and_date(
    value: f64,
    week_start: NaiveDate,
    today: NaiveDate,
    config: &EntryConfig,
) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err("Value must be a non-negative number.".to_string());
    }
    if value > config.max_value {
        return Err("Value looks too high. Double-check the entry.".to_string());
    }
    if week_start > today {
        return Err("Future dates are not allowed.".to_string());
    }
    if week_start < today - Duration::days(config.max_age_days) {
        return Err(format!(
            "Date is too old ({} days max).",
            config.max_age_days
        ));
    }
    if week_start.weekday() != Weekday::Sun {
        return Err("The reference date must be a Sunday.".to_string());
    }
    Ok(())
}

fn build_observation(
    ward_id: Uuid,
    indicator_id: Uuid,
    value: f64,
    week_start: NaiveDate,
    created_by: Option<String>,
) -> Observation {
    Observation {
        id: Uuid::new_v4(),
        ward_id,
        indicator_id,
        value,
        week_start,
        source: "manual".to_string(),
        created_by,
        created_at: Utc::now(),
    }
}

/// Runs the full submission saga against the store: primary insert, then the
/// paired unendowed insert for compound indicators, then the membership-count
/// refresh. The steps are sequential and deliberately not atomic; once the
/// primary row is in, later failures are reported but never roll it back.
pub fn submit(
    data: &mut StoreData,
    request: &EntryRequest,
    today: NaiveDate,
    config: &EntryConfig,
) -> Result<EntryResponse, EntryError> {
    let (Some(ward_id), Some(indicator_id), Some(value), Some(week_start)) = (
        request.ward_id,
        request.indicator_id,
        request.value,
        request.week_start,
    ) else {
        return Err(EntryError::Validation("Fill in all fields.".to_string()));
    };

    let ward = store::ward_by_id(data, ward_id)
        .ok_or_else(|| EntryError::Validation("Unknown ward.".to_string()))?
        .clone();
    let indicator = store::indicator_by_id(data, indicator_id)
        .ok_or_else(|| EntryError::Validation("Unknown indicator.".to_string()))?
        .clone();

    validate_value_and_date(value, week_start, today, config).map_err(EntryError::Validation)?;

    let is_compound = indicator.slug == RECOMMENDS_PRIMARY_SLUG;
    let secondary_value = if is_compound {
        let secondary = request.secondary_value.ok_or_else(|| {
            EntryError::Validation("Enter the unendowed recommends value as well.".to_string())
        })?;
        validate_value_and_date(secondary, week_start, today, config)
            .map_err(|msg| EntryError::Validation(format!("Unendowed value: {msg}")))?;
        Some(secondary)
    } else {
        None
    };

    let primary = build_observation(
        ward.id,
        indicator.id,
        value,
        week_start,
        request.created_by.clone(),
    );
    let primary_id = primary.id;
    match store::insert_observation(data, primary) {
        Ok(()) => {}
        Err(StoreError::Duplicate) => return Err(EntryError::Duplicate),
        Err(StoreError::NotFound) => {
            return Err(EntryError::Validation("Unknown observation.".to_string()))
        }
    }

    let mut outcome = "saved";
    let mut message = "Entry recorded.".to_string();

    if let Some(secondary_value) = secondary_value {
        match store::indicator_by_slug(data, RECOMMENDS_SECONDARY_SLUG).map(|i| i.id) {
            Some(secondary_id) => {
                let secondary = build_observation(
                    ward.id,
                    secondary_id,
                    secondary_value,
                    week_start,
                    request.created_by.clone(),
                );
                match store::insert_observation(data, secondary) {
                    Ok(()) => message.push_str(" Unendowed recommends saved."),
                    Err(StoreError::Duplicate) => {
                        outcome = "saved_secondary_exists";
                        message.push_str(" Unendowed entry already existed and was kept.");
                    }
                    Err(StoreError::NotFound) => {
                        outcome = "saved_secondary_failed";
                        message.push_str(" Unendowed entry could not be saved.");
                    }
                }
            }
            None => {
                warn!("paired indicator {RECOMMENDS_SECONDARY_SLUG} missing from catalog");
                outcome = "saved_secondary_failed";
                message.push_str(" Unendowed entry could not be saved.");
            }
        }
    }

    if indicator.slug == MEMBERSHIP_SLUG {
        if let Some(membership) = request.membership_count {
            if membership > 0 && membership <= MEMBERSHIP_CEILING {
                store::update_membership(data, ward.id, membership);
                message.push_str(" Ward membership count updated.");
            } else {
                outcome = "saved_membership_skipped";
                message.push_str(" Membership count out of range, not updated.");
            }
        }
    }

    Ok(EntryResponse {
        outcome: outcome.to_string(),
        message,
        observation_id: Some(primary_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed_catalog;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-03-15 is a Sunday; "today" is the following Friday.
    fn today() -> NaiveDate {
        date(2026, 3, 20)
    }

    fn request(data: &StoreData, slug: &str, value: f64, week: NaiveDate) -> EntryRequest {
        EntryRequest {
            ward_id: Some(data.wards[0].id),
            indicator_id: store::indicator_by_slug(data, slug).map(|i| i.id),
            value: Some(value),
            week_start: Some(week),
            secondary_value: None,
            membership_count: None,
            created_by: None,
        }
    }

    #[test]
    fn validation_rules_apply_in_order() {
        let config = EntryConfig::default();
        let sunday = date(2026, 3, 15);

        assert!(validate_value_and_date(120.0, sunday, today(), &config).is_ok());
        assert_eq!(
            validate_value_and_date(-1.0, sunday, today(), &config),
            Err("Value must be a non-negative number.".to_string())
        );
        assert_eq!(
            validate_value_and_date(10_001.0, sunday, today(), &config),
            Err("Value looks too high. Double-check the entry.".to_string())
        );
        // A future Sunday fails on the future rule, not the weekday rule.
        assert_eq!(
            validate_value_and_date(5.0, date(2026, 3, 22), today(), &config),
            Err("Future dates are not allowed.".to_string())
        );
        assert_eq!(
            validate_value_and_date(5.0, date(2025, 11, 2), today(), &config),
            Err("Date is too old (90 days max).".to_string())
        );
        assert_eq!(
            validate_value_and_date(5.0, date(2026, 3, 16), today(), &config),
            Err("The reference date must be a Sunday.".to_string())
        );
    }

    #[test]
    fn missing_fields_are_rejected_before_anything_else() {
        let mut data = seed_catalog();
        let mut req = request(&data, "convert_baptisms", 2.0, date(2026, 3, 15));
        req.value = None;
        let err = submit(&mut data, &req, today(), &EntryConfig::default());
        assert_eq!(
            err,
            Err(EntryError::Validation("Fill in all fields.".to_string()))
        );
        assert!(data.observations.is_empty());
    }

    #[test]
    fn future_sunday_never_reaches_the_store() {
        let mut data = seed_catalog();
        let req = request(&data, "convert_baptisms", 2.0, date(2026, 3, 22));
        let err = submit(&mut data, &req, today(), &EntryConfig::default());
        assert!(matches!(err, Err(EntryError::Validation(_))));
        assert!(data.observations.is_empty());
    }

    #[test]
    fn duplicate_submission_is_rejected_without_mutation() {
        let mut data = seed_catalog();
        let req = request(&data, "convert_baptisms", 2.0, date(2026, 3, 15));
        submit(&mut data, &req, today(), &EntryConfig::default()).unwrap();

        let again = request(&data, "convert_baptisms", 9.0, date(2026, 3, 15));
        let err = submit(&mut data, &again, today(), &EntryConfig::default());
        assert_eq!(err, Err(EntryError::Duplicate));
        assert_eq!(data.observations.len(), 1);
        assert_eq!(data.observations[0].value, 2.0);
    }

    #[test]
    fn compound_entry_saves_both_rows() {
        let mut data = seed_catalog();
        let mut req = request(&data, RECOMMENDS_PRIMARY_SLUG, 40.0, date(2026, 3, 15));
        req.secondary_value = Some(12.0);

        let response = submit(&mut data, &req, today(), &EntryConfig::default()).unwrap();
        assert_eq!(response.outcome, "saved");
        assert_eq!(data.observations.len(), 2);

        let secondary_id = store::indicator_by_slug(&data, RECOMMENDS_SECONDARY_SLUG)
            .map(|i| i.id)
            .unwrap();
        assert!(data
            .observations
            .iter()
            .any(|o| o.indicator_id == secondary_id && o.value == 12.0));
    }

    #[test]
    fn compound_entry_requires_the_secondary_value() {
        let mut data = seed_catalog();
        let req = request(&data, RECOMMENDS_PRIMARY_SLUG, 40.0, date(2026, 3, 15));
        let err = submit(&mut data, &req, today(), &EntryConfig::default());
        assert!(matches!(err, Err(EntryError::Validation(_))));
        assert!(data.observations.is_empty());
    }

    #[test]
    fn existing_secondary_row_is_kept_and_reported() {
        let mut data = seed_catalog();
        // The unendowed row for this week already exists.
        let mut pre = request(&data, RECOMMENDS_SECONDARY_SLUG, 9.0, date(2026, 3, 15));
        pre.indicator_id = store::indicator_by_slug(&data, RECOMMENDS_SECONDARY_SLUG).map(|i| i.id);
        submit(&mut data, &pre, today(), &EntryConfig::default()).unwrap();

        let mut req = request(&data, RECOMMENDS_PRIMARY_SLUG, 40.0, date(2026, 3, 15));
        req.secondary_value = Some(12.0);
        let response = submit(&mut data, &req, today(), &EntryConfig::default()).unwrap();

        // Primary landed, secondary kept its original value: partial outcome,
        // not a total failure.
        assert_eq!(response.outcome, "saved_secondary_exists");
        assert_eq!(data.observations.len(), 2);
        let secondary_id = store::indicator_by_slug(&data, RECOMMENDS_SECONDARY_SLUG)
            .map(|i| i.id)
            .unwrap();
        let kept = data
            .observations
            .iter()
            .find(|o| o.indicator_id == secondary_id)
            .unwrap();
        assert_eq!(kept.value, 9.0);
    }

    #[test]
    fn participating_members_entry_updates_membership() {
        let mut data = seed_catalog();
        let ward_id = data.wards[0].id;
        let mut req = request(&data, MEMBERSHIP_SLUG, 150.0, date(2026, 3, 15));
        req.membership_count = Some(320);

        let response = submit(&mut data, &req, today(), &EntryConfig::default()).unwrap();
        assert_eq!(response.outcome, "saved");
        let ward = store::ward_by_id(&data, ward_id).unwrap();
        assert_eq!(ward.membership_count, 320);
    }

    #[test]
    fn out_of_range_membership_is_skipped_but_primary_stays() {
        let mut data = seed_catalog();
        let ward_id = data.wards[0].id;
        let before = store::ward_by_id(&data, ward_id).unwrap().membership_count;
        let mut req = request(&data, MEMBERSHIP_SLUG, 150.0, date(2026, 3, 15));
        req.membership_count = Some(50_000);

        let response = submit(&mut data, &req, today(), &EntryConfig::default()).unwrap();
        assert_eq!(response.outcome, "saved_membership_skipped");
        assert_eq!(data.observations.len(), 1);
        let ward = store::ward_by_id(&data, ward_id).unwrap();
        assert_eq!(ward.membership_count, before);
    }
}
