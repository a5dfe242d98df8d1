use super::{PipelineSerializer, YamlSerializer};
use crate::error::SnapshotError;
use crate::model::Pipeline;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

const SNAPSHOT_FORMAT: u32 = 1;

/// A binary capture of a pipeline for fast reload.
///
/// The body is the YAML document with identities, so a restored pipeline keeps
/// every step and branch identity it was captured with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PipelineSnapshot {
    format: u32,
    document: String,
}

impl PipelineSnapshot {
    pub fn capture(pipeline: &Pipeline) -> Result<Self, SnapshotError> {
        let document = YamlSerializer::new()
            .serialize(pipeline)
            .map_err(|e| SnapshotError::Generic(e.to_string()))?;
        Ok(Self {
            format: SNAPSHOT_FORMAT,
            document,
        })
    }

    pub fn restore(&self) -> Result<Pipeline, SnapshotError> {
        Ok(YamlSerializer::new().deserialize(&self.document)?)
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard())
            .map_err(|e| SnapshotError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Saves the snapshot to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), SnapshotError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            SnapshotError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            SnapshotError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        tracing::debug!(path, bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    pub fn from_file(path: &str) -> Result<Self, SnapshotError> {
        let mut file = fs::File::open(path).map_err(|e| {
            SnapshotError::Generic(format!("Could not open file '{}': {}", path, e))
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            SnapshotError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let (snapshot, _): (Self, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| SnapshotError::Generic(format!("Deserialization failed: {}", e)))?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(SnapshotError::Generic(format!(
                "Unsupported snapshot format {} (expected {})",
                snapshot.format, SNAPSHOT_FORMAT
            )));
        }
        Ok(snapshot)
    }
}
