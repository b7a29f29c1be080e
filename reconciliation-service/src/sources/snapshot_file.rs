use std::path::PathBuf;

use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use crate::{
    pipeline::{Envelope, EnvelopeStream, PipelineError, Source},
    snapshot::StoreSnapshot,
};

/// Replays recorded snapshots from an NDJSON file, one full subtree per line.
///
/// A line that fails to decode is reported downstream as an error and the
/// replay carries on with the next line.
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source<StoreSnapshot> for SnapshotFileSource {
    async fn stream(&self) -> EnvelopeStream<StoreSnapshot> {
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!(
                        "failed to open snapshot file {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };
            let mut lines = BufReader::new(file).lines();
            let mut line_no: usize = 0;

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(PipelineError::Source(format!("failed to read snapshot line: {e}")));
                        break;
                    }
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }

                match StoreSnapshot::from_slice(line.as_bytes()) {
                    Ok(snapshot) => yield Ok(Envelope::now(snapshot)),
                    Err(e) => {
                        metrics::counter!("snapshot_file_parse_errors_total").increment(1);
                        yield Err(PipelineError::Source(format!("line {line_no}: {e}")));
                    }
                }
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;

    #[tokio::test]
    async fn replays_lines_and_reports_bad_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"t1": {{"Profile": {{"fullName": "Ana"}}}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"Instructors": {{"t2": {{}}}}}}"#).unwrap();

        let source = SnapshotFileSource::new(file.path());
        let items: Vec<_> = source.stream().await.collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().payload.instructors[0].name, "Ana");
        assert!(matches!(&items[1], Err(PipelineError::Source(msg)) if msg.starts_with("line 3")));
        assert_eq!(items[2].as_ref().unwrap().payload.instructors[0].id, "t2");
    }

    #[tokio::test]
    async fn missing_file_is_a_single_error() {
        let source = SnapshotFileSource::new("/definitely/not/here.ndjson");
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
