//! History table
//!
//! The history table lists every stored ride. Its header holds the record count at
//! 0x08; 156-byte records follow from offset 24.

use tracing::{debug, trace};

use super::{Track, TrackRecord};
use crate::dump::{ByteSource, Cursor};
use crate::{MemoryLayout, Result};

const HEADER_LEN: u32 = 24;
const RECORD_LEN: u32 = 156;
const NAME_LEN: usize = 16;

/// Read the history table and return one [`Track`] per record, in table order.
///
/// Only the table is read here; segment chains and summaries are decoded when a
/// track is first asked for them.
pub fn read_history<'d>(source: &'d dyn ByteSource, layout: MemoryLayout) -> Result<Vec<Track<'d>>> {
    let mut cursor = source.read_from_offset(layout.history)?;
    let count = cursor.u16_at(0x08)?;
    debug!(count, offset = format_args!("{:#x}", layout.history), "Reading history table");

    cursor.advance(HEADER_LEN);

    let mut history = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let record = read_record(&cursor)?;
        trace!(timestamp = record.timestamp, name = %record.name, lap_count = record.lap_count, "History record");

        history.push(Track::new(source, layout, record));
        cursor.advance(RECORD_LEN);
    }

    Ok(history)
}

/// Parse the history record at the cursor's current position.
pub fn read_record(cursor: &Cursor<'_>) -> Result<TrackRecord> {
    let lap_count = cursor.u8_at(0x94)?;
    Ok(TrackRecord {
        timestamp: cursor.u32_at(0x00)?,
        name: cursor.str_at(0x04, NAME_LEN)?,
        lap_count,
        trackpoints_offset: cursor.u32_at(0x88)?,
        summary_offset: cursor.u32_at(0x8c)?,
        laps_offset: if lap_count > 0 { Some(cursor.u32_at(0x90)?) } else { None },
    })
}
