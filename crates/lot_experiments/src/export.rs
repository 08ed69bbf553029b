//! Result export to CSV and JSON.

use std::fs::File;
use std::path::Path;

use lot_core::events::LotEvent;

use crate::metrics::RunSummary;

fn ensure_not_empty<T>(items: &[T]) -> Result<(), Box<dyn std::error::Error>> {
    if items.is_empty() {
        return Err("No results to export".into());
    }
    Ok(())
}

/// Write one CSV row per replication summary, with a header row.
pub fn export_summaries_csv(
    summaries: &[RunSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_not_empty(summaries)?;
    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the summaries as a pretty-printed JSON array.
pub fn export_summaries_json(
    summaries: &[RunSummary],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summaries)?;
    Ok(())
}

/// Write a run's lifecycle events, one row per event: time, vehicle, kind, action.
pub fn export_events_csv(
    events: &[LotEvent],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_not_empty(events)?;
    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    wtr.write_record(["time", "vehicle", "kind", "action"])?;
    for event in events {
        wtr.write_record([
            event.time.to_string(),
            event.vehicle.to_string(),
            event.kind.to_string(),
            event.action.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
