//! Scrapes the data.gov.sg 24-hour weather forecast.
//!
//! ```sh
//! RUST_LOG=info cargo run -p scrapekit --example weather_forecast
//! ```
use miette::IntoDiagnostic;
use scrapekit::parser::{JsonParser, PathSegment};
use scrapekit::{Document, ExtractError, RequestOptions, RequesterConfig, Scraper};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

const FORECAST_URL: &str = "https://api-open.data.gov.sg/v2/real-time/api/twenty-four-hr-forecast";

#[derive(Debug, Default, Serialize)]
struct Range {
    low: Value,
    high: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct Wind {
    speed: Range,
    direction: String,
}

#[derive(Debug, Default, Serialize)]
struct TimeSpan {
    start: String,
    end: String,
    text: String,
}

#[derive(Debug, Default, Serialize)]
struct RegionForecast {
    code: String,
    text: String,
}

#[derive(Debug, Default, Serialize)]
struct Period {
    time: TimeSpan,
    regions: BTreeMap<String, RegionForecast>,
}

#[derive(Debug, Default, Serialize)]
struct Forecast {
    forecast_date: String,
    updated_timestamp: String,
    general_forecast: String,
    temperature: Range,
    humidity: Range,
    wind: Wind,
    valid_period: TimeSpan,
    periods: Vec<Period>,
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let path: Vec<PathSegment> = path.iter().copied().map(PathSegment::from).collect();
    JsonParser.extract_value(value, &path)
}

fn string_at(value: &Value, path: &[&str]) -> String {
    lookup(value, path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn range_at(value: &Value, path: &[&str], default_unit: Option<&str>) -> Range {
    let Some(range) = lookup(value, path) else {
        return Range {
            unit: default_unit.map(str::to_string),
            ..Default::default()
        };
    };
    Range {
        low: range.get("low").cloned().unwrap_or_default(),
        high: range.get("high").cloned().unwrap_or_default(),
        unit: range
            .get("unit")
            .and_then(Value::as_str)
            .or(default_unit)
            .map(str::to_string),
    }
}

fn time_span(value: &Value) -> TimeSpan {
    TimeSpan {
        start: string_at(value, &["start"]),
        end: string_at(value, &["end"]),
        text: string_at(value, &["text"]),
    }
}

fn period(value: &Value) -> Period {
    let regions: BTreeMap<String, RegionForecast> = lookup(value, &["regions"])
        .and_then(Value::as_object)
        .map(|regions| {
            regions
                .iter()
                .map(|(region, forecast)| {
                    (
                        region.clone(),
                        RegionForecast {
                            code: string_at(forecast, &["code"]),
                            text: string_at(forecast, &["text"]),
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    Period {
        time: lookup(value, &["timePeriod"]).map(time_span).unwrap_or_default(),
        regions,
    }
}

fn extract_forecast(document: Document) -> Result<Forecast, ExtractError> {
    let kind = document.kind();
    let json = document
        .into_json()
        .ok_or_else(|| ExtractError::UnexpectedDocument(format!("expected JSON, got {}", kind)))?;

    let record = JsonParser
        .extract_value(
            &json,
            &[
                PathSegment::from("data"),
                PathSegment::from("records"),
                PathSegment::Index(0),
            ],
        )
        .ok_or_else(|| ExtractError::MissingField("data.records[0]".to_string()))?;

    Ok(Forecast {
        forecast_date: string_at(record, &["date"]),
        updated_timestamp: string_at(record, &["updatedTimestamp"]),
        general_forecast: string_at(record, &["general", "forecast", "text"]),
        temperature: range_at(record, &["general", "temperature"], Some("Degrees Celsius")),
        humidity: range_at(record, &["general", "relativeHumidity"], Some("Percentage")),
        wind: Wind {
            speed: range_at(record, &["general", "wind", "speed"], None),
            direction: string_at(record, &["general", "wind", "direction"]),
        },
        valid_period: lookup(record, &["general", "validPeriod"])
            .map(time_span)
            .unwrap_or_default(),
        periods: lookup(record, &["periods"])
            .and_then(Value::as_array)
            .map(|periods| periods.iter().map(period).collect())
            .unwrap_or_default(),
    })
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scraper = Scraper::builder(extract_forecast)
        .requester_config(RequesterConfig {
            // The API is not a crawlable site.
            respect_robots_txt: false,
            ..RequesterConfig::from_env()
        })
        .parser_type("json")
        .build()
        .into_diagnostic()?;

    match scraper
        .scrape(FORECAST_URL, &[], &RequestOptions::default())
        .await
    {
        Ok(forecast) => {
            let output = serde_json::to_string_pretty(&forecast).into_diagnostic()?;
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!("Failed to scrape weather forecast: {}", e);
            return Err(e).into_diagnostic();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_forecast() {
        let payload = json!({
            "data": {
                "records": [{
                    "date": "2024-05-01",
                    "updatedTimestamp": "2024-05-01T05:34:00+08:00",
                    "general": {
                        "temperature": {"low": 25, "high": 34, "unit": "Degrees Celsius"},
                        "relativeHumidity": {"low": 55, "high": 95},
                        "forecast": {"code": "TL", "text": "Thundery Showers"},
                        "validPeriod": {"start": "2024-05-01T06:00:00+08:00", "end": "2024-05-02T06:00:00+08:00", "text": "6 AM 1 May to 6 AM 2 May"},
                        "wind": {"speed": {"low": 10, "high": 20}, "direction": "SSE"}
                    },
                    "periods": [{
                        "timePeriod": {"start": "2024-05-01T06:00:00+08:00", "end": "2024-05-01T12:00:00+08:00", "text": "Morning"},
                        "regions": {
                            "west": {"code": "PC", "text": "Partly Cloudy (Day)"},
                            "east": {"code": "TL", "text": "Thundery Showers"}
                        }
                    }]
                }]
            }
        });

        let forecast = extract_forecast(Document::Json(payload)).unwrap();

        assert_eq!(forecast.forecast_date, "2024-05-01");
        assert_eq!(forecast.general_forecast, "Thundery Showers");
        assert_eq!(forecast.temperature.high, json!(34));
        assert_eq!(forecast.humidity.unit.as_deref(), Some("Percentage"));
        assert_eq!(forecast.wind.direction, "SSE");
        assert_eq!(forecast.wind.speed.unit, None);
        assert_eq!(forecast.valid_period.text, "6 AM 1 May to 6 AM 2 May");
        assert_eq!(forecast.periods.len(), 1);
        assert_eq!(forecast.periods[0].time.text, "Morning");
        assert_eq!(
            forecast.periods[0].regions.keys().collect::<Vec<_>>(),
            vec!["east", "west"]
        );
    }

    #[test]
    fn test_extract_forecast_without_records() {
        let err = extract_forecast(Document::Json(json!({"data": {"records": []}}))).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField(_)));

        let err = extract_forecast(Document::Xml(Default::default())).unwrap_err();
        assert!(matches!(err, ExtractError::UnexpectedDocument(_)));
    }
}
