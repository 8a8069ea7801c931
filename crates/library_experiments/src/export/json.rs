use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::error::ExperimentError;

pub(crate) fn write_json_impl<T: Serialize + ?Sized, W: Write>(
    value: &T,
    writer: W,
) -> Result<(), ExperimentError> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
