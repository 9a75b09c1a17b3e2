//! Incident table and request file readers.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use patrol_planner_hotspot_models::IncidentPoint;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// One row of the incident CSV. Unparseable coordinates read as missing.
#[derive(Debug, Deserialize)]
struct IncidentRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
    incident_date: String,
    #[serde(default)]
    crime_type: Option<String>,
}

/// Parses an incident date, accepting a bare date or a timestamp.
///
/// Timestamps are truncated to their calendar date without any time zone
/// conversion.
#[must_use]
pub fn parse_incident_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.date());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// Reads incidents from CSV with a header row.
///
/// Required columns are `latitude`, `longitude`, and `incident_date`;
/// `crime_type` is optional. Rows whose date cannot be parsed are skipped.
///
/// # Errors
///
/// Returns an error if the CSV is malformed or a required column is missing.
pub fn read_incidents<R: Read>(reader: R) -> Result<Vec<IncidentPoint>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut incidents = Vec::new();
    let mut skipped = 0_usize;

    for row in csv_reader.deserialize::<IncidentRow>() {
        let row = row?;
        let Some(incident_date) = parse_incident_date(&row.incident_date) else {
            skipped += 1;
            continue;
        };
        incidents.push(IncidentPoint {
            latitude: row.latitude,
            longitude: row.longitude,
            incident_date,
            crime_type: row.crime_type.filter(|t| !t.is_empty()),
        });
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows with unparseable incident_date");
    }
    log::debug!("Read {} incidents", incidents.len());

    Ok(incidents)
}

/// Reads the incident CSV at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_incidents(path: &Path) -> Result<Vec<IncidentPoint>, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open incidents {}: {e}", path.display()))?;
    let incidents = read_incidents(BufReader::new(file))
        .map_err(|e| format!("Failed to read incidents {}: {e}", path.display()))?;

    log::info!("Loaded {} incidents from {}", incidents.len(), path.display());

    Ok(incidents)
}

/// Reads a JSON document at `path` into `T`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or does not match `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    Ok(value)
}
