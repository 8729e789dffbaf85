use chrono::TimeZone;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Coarse/fine time pair: milliseconds since epoch plus sub-millisecond
/// nanoseconds. Used for both earth-receive time and spacecraft clock.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeTag {
    pub coarse: u64,
    pub fine: u32,
}

impl TimeTag {
    pub fn new(coarse: u64, fine: u32) -> Self {
        Self { coarse, fine }
    }

    /// Fixed-width rendering so the lexical order of rendered tags matches
    /// their numeric order.
    pub fn render(&self) -> String {
        format!("{:020}.{:09}", self.coarse, self.fine)
    }

    /// Human-readable UTC form for output rows. Falls back to the fixed-width
    /// form when the coarse part does not fit a calendar date.
    pub fn to_utc_string(&self) -> String {
        match i64::try_from(self.coarse)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            None => self.render(),
        }
    }
}

/// One decoded telemetry channel sample. The pipeline only ever looks at the
/// ordering fields and the filter fields; everything else rides along opaquely
/// in the rendered output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Insertion sequence assigned by the upstream query, monotonic across
    /// the whole result stream.
    pub event_seq: u64,
    pub channel_id: String,
    pub module: Option<String>,
    /// Earth-receive time.
    pub ert: TimeTag,
    /// Spacecraft clock.
    pub sclk: TimeTag,
    /// Data number, already rendered by the decode layer.
    pub dn: String,
    /// Engineering unit value, when a conversion exists.
    pub eu: Option<f64>,
    /// Worst alarm level name, when the sample is in alarm.
    pub alarm: Option<String>,
}

/// Column positions in the rendered CSV row, for stream filters that need to
/// look inside rendered records.
pub const CSV_CHANNEL_ID_COLUMN: usize = 1;
pub const CSV_DN_COLUMN: usize = 5;
const CSV_COLUMN_COUNT: usize = 8;

impl ChannelRecord {
    pub fn is_in_alarm(&self) -> bool {
        self.alarm.is_some()
    }

    /// Renders the record as one CSV output row. Column order is fixed; see
    /// [`csv_header`] for the names.
    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.event_seq,
            self.channel_id,
            self.module.as_deref().unwrap_or(""),
            self.ert.to_utc_string(),
            format_args!("{}.{:09}", self.sclk.coarse, self.sclk.fine),
            self.dn,
            self.eu.map(|eu| eu.to_string()).unwrap_or_default(),
            self.alarm.as_deref().unwrap_or(""),
        )
    }
}

pub fn csv_header() -> String {
    "event_seq,channel_id,module,ert,sclk,dn,eu,alarm".to_string()
}

/// Extracts a single column from a rendered CSV row. Returns `None` for rows
/// that do not have the expected column count (headers, template output).
pub fn csv_field(line: &str, index: usize) -> Option<&str> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != CSV_COLUMN_COUNT {
        return None;
    }
    fields.get(index).copied()
}
