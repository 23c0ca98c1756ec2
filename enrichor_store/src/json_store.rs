use async_trait::async_trait;
use enrichor_core::{Error, Record, RecordStore, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::atomic::write_atomic;

/// Record store kept as one JSON object mapping identifier to record.
///
/// Records are returned in ascending identifier order, which is the
/// iteration order checkpoints refer to.
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonRecordStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn read_all(&self) -> Result<Vec<Record>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::config(format!(
                    "record store not found at {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(Error::persistence(&self.path, e)),
        };

        let map: BTreeMap<String, Record> =
            serde_json::from_slice(&bytes).map_err(|source| Error::MalformedStore {
                path: self.path.clone(),
                source,
            })?;

        debug!("Read {} records from {}", map.len(), self.path.display());
        Ok(map
            .into_iter()
            .map(|(id, mut record)| {
                record.id = id;
                record
            })
            .collect())
    }

    async fn write_all(&self, records: &[Record]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let map: BTreeMap<&str, &Record> = records.iter().map(|r| (r.id.as_str(), r)).collect();
        let mut bytes = serde_json::to_vec_pretty(&map)?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes).await?;

        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}
