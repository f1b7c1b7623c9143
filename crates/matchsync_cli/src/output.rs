use std::io::Write;

use serde::Serialize;

/// Write `value` as JSON followed by a newline.
///
/// Compact output puts each document on one line so several reports can be
/// piped into line-oriented tools.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    out: &mut impl Write,
    value: &T,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
