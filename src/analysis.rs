use crate::errors::AppError;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

/// Payload posted to the narrative-analysis webhook.
#[derive(Debug, Serialize)]
pub struct AnalysisPayload {
    pub unit: String,
    pub generated_on: NaiveDate,
    pub indicators: Vec<AnalysisLine>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisLine {
    pub indicator: String,
    pub current_value: f64,
    pub target: f64,
    pub progress_percent: u32,
    pub gap: f64,
}

/// Posts the payload and relays the returned narrative verbatim. Any failure
/// becomes a contained bad-gateway error for the analysis panel only.
pub async fn narrative(
    client: &reqwest::Client,
    url: &str,
    payload: &AnalysisPayload,
) -> Result<String, AppError> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|err| {
            error!("analysis webhook unreachable: {err}");
            AppError::bad_gateway("Analysis service is unavailable right now.")
        })?;

    if !response.status().is_success() {
        error!("analysis webhook returned {}", response.status());
        return Err(AppError::bad_gateway(
            "Analysis service is unavailable right now.",
        ));
    }

    let body = response.text().await.map_err(|err| {
        error!("analysis webhook body unreadable: {err}");
        AppError::bad_gateway("Analysis service is unavailable right now.")
    })?;
    Ok(unwrap_text(&body))
}

/// Webhook replies arrive either as plain text or as JSON wrapping the text.
pub fn unwrap_text(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["text", "output", "message"] {
            if let Some(text) = value.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
        if let Some(text) = value.as_str() {
            return text.to_string();
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(unwrap_text("Attendance is trending up."), "Attendance is trending up.");
    }

    #[test]
    fn json_wrapped_text_is_unwrapped() {
        assert_eq!(
            unwrap_text(r#"{"text":"Attendance is trending up."}"#),
            "Attendance is trending up."
        );
        assert_eq!(unwrap_text(r#"{"output":"Gap closing."}"#), "Gap closing.");
        assert_eq!(unwrap_text(r#""Quoted narrative.""#), "Quoted narrative.");
    }

    #[test]
    fn unrecognized_json_is_shown_verbatim() {
        let body = r#"{"rows":[1,2]}"#;
        assert_eq!(unwrap_text(body), body);
    }
}
