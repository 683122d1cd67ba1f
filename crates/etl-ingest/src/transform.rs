//! Imperial to metric conversion for the person table

use crate::record::{PersonRecord, RecordTable};
use etl_common::numeric::round2;

/// Meters per inch
pub const METERS_PER_INCH: f64 = 0.0254;

/// Kilograms per pound
pub const KILOGRAMS_PER_POUND: f64 = 0.45359237;

/// Convert heights from inches to meters and weights from pounds to kilograms
///
/// Both results are rounded to two decimals, half away from zero. Calling
/// this on an already converted table converts it again.
pub fn transform(table: RecordTable) -> RecordTable {
    table.into_iter().map(to_metric).collect()
}

fn to_metric(record: PersonRecord) -> PersonRecord {
    PersonRecord {
        height: round2(record.height * METERS_PER_INCH),
        weight: round2(record.weight * KILOGRAMS_PER_POUND),
        ..record
    }
}
