//! An async adapter that drives a [`Pipeline`] from a `tokio::io::AsyncRead`.
//!
//! This does not reimplement streaming: it owns the read loop and the
//! cooperative yielding an async executor expects, and otherwise defers
//! everything to the same sequential [`Pipeline`] the synchronous caller uses.

use crate::error::{Error, Result};
use crate::options::CsvOptions;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::record::Record;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads `source` to completion through a [`Pipeline`], yielding to the
/// executor after every chunk so one large parse never starves other tasks.
pub async fn parse_async<R: AsyncRead + Unpin>(
    options: &CsvOptions,
    mut source: R,
    read_chunk_bytes: usize,
) -> Result<Vec<Record>> {
    options.validate()?;
    let mut pipeline = Pipeline::new(options).with_pipeline_options(PipelineOptions::default());
    let mut buf = vec![0u8; read_chunk_bytes.max(1)];
    let mut records = Vec::new();
    let mut pending = String::new();

    loop {
        let read = source.read(&mut buf).await.map_err(|e| Error::ParseError {
            message: format!("async read failed: {e}"),
            location: crate::token::Location::default(),
            source: None,
        })?;
        if read == 0 {
            break;
        }
        pending.push_str(&String::from_utf8_lossy(&buf[..read]));
        records.extend(pipeline.transform(&pending)?);
        pending.clear();
        tokio::task::yield_now().await;
    }

    records.extend(pipeline.flush()?);
    Ok(records)
}
