use crate::hls::{AttributeMap, AttributeValue, Attributes, date_time::parse_date_time};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// A time range with associated metadata (`EXT-X-DATERANGE`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    pub start_date: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<FixedOffset>>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_duration: Option<f64>,
    pub end_on_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scte35_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scte35_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scte35_in: Option<String>,
    /// `X-` attributes, keyed as written.
    #[serde(skip_serializing_if = "AttributeMap::is_empty")]
    pub client_attributes: AttributeMap,
}

impl DateRange {
    /// Build from the two mandatory attributes plus the rest of the list.
    ///
    /// Optional fields that fail to parse are left unset.
    pub fn new(id: &str, start_date: DateTime<FixedOffset>, attrs: &Attributes) -> Self {
        let client_attributes = attrs
            .iter()
            .filter(|(key, _)| key.starts_with("X-"))
            .map(|(key, value)| (key.to_string(), AttributeValue::infer(value)))
            .collect();

        Self {
            id: id.to_string(),
            class: attrs.get("CLASS").map(str::to_string),
            start_date,
            end_date: attrs.get("END-DATE").and_then(|s| parse_date_time(s).ok()),
            duration: attrs.float("DURATION"),
            planned_duration: attrs.float("PLANNED-DURATION"),
            end_on_next: attrs.flag("END-ON-NEXT"),
            scte35_cmd: attrs.get("SCTE35-CMD").map(str::to_string),
            scte35_out: attrs.get("SCTE35-OUT").map(str::to_string),
            scte35_in: attrs.get("SCTE35-IN").map(str::to_string),
            client_attributes,
        }
    }
}
