use analytics::store::fixtures::{TripRow, write_trip_rows};
use std::path::Path;

/// Five trips on Thursday 2016-06-30, newest first.
pub const TRIPS: [TripRow; 5] = [
    ("a", 1, "2016-06-30 23:59:58", 1, 1100, "N"),
    ("b", 2, "2016-06-30 23:59:53", 3, 300, "N"),
    ("c", 2, "2016-06-30 23:59:47", 1, 1635, "N"),
    ("d", 1, "2016-06-30 23:59:41", 1, 1141, "N"),
    ("e", 2, "2016-06-30 23:59:33", 1, 848, "N"),
];

pub fn write_trips(path: &Path) -> anyhow::Result<()> {
    write_trip_rows(path, &TRIPS)?;
    Ok(())
}
