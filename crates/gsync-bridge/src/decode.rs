use log::warn;
use serde::de::DeserializeOwned;

use crate::command::OutputShape;
use crate::error::BridgeError;
use crate::types::{
    ExportResult, MeetingDetail, MeetingSummary, ScheduleStatus, StatusMap, SyncStats,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    Text(String),
    Export(ExportResult),
    Meetings(Vec<MeetingSummary>),
    Meeting(Box<MeetingDetail>),
    Stats(Box<SyncStats>),
    Status(StatusMap),
    Schedule(ScheduleStatus),
}

/// Decode captured tool output according to the shape its command declares.
///
/// # Errors
/// Returns [`BridgeError::DecodingFailed`] carrying the untouched output when
/// it does not match `shape`.
pub fn decode(bytes: &[u8], shape: OutputShape) -> Result<DecodedPayload, BridgeError> {
    Ok(match shape {
        OutputShape::Text => DecodedPayload::Text(decode_text(bytes)),
        OutputShape::ExportResult => DecodedPayload::Export(decode_json(bytes)?),
        OutputShape::MeetingList => DecodedPayload::Meetings(decode_json(bytes)?),
        OutputShape::MeetingDetail => DecodedPayload::Meeting(Box::new(decode_json(bytes)?)),
        OutputShape::Stats => DecodedPayload::Stats(Box::new(decode_json(bytes)?)),
        OutputShape::KeyValue => DecodedPayload::Status(decode_object(bytes)?),
        OutputShape::ScheduleStatus => DecodedPayload::Schedule(decode_json(bytes)?),
    })
}

/// Strictly decode one JSON document into `T`.
///
/// # Errors
/// Returns [`BridgeError::DecodingFailed`] with the raw output as text.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, BridgeError> {
    serde_json::from_slice(bytes).map_err(|error| {
        warn!("Tool output did not match expected shape: {error}");
        decoding_failed(bytes)
    })
}

/// Free-text output. Malformed UTF-8 degrades to an empty string.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap_or_default()
}

fn decode_object(bytes: &[u8]) -> Result<StatusMap, BridgeError> {
    match decode_json::<serde_json::Value>(bytes)? {
        serde_json::Value::Object(map) => Ok(map),
        other => {
            warn!("Expected a JSON object, got {other}");
            Err(decoding_failed(bytes))
        }
    }
}

fn decoding_failed(bytes: &[u8]) -> BridgeError {
    BridgeError::DecodingFailed(String::from_utf8_lossy(bytes).into_owned())
}
