//! Result collection, upload, and file output

use crate::defaults;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered per-iteration throughput results.
///
/// Non-positive values never enter the set; an iteration whose stream
/// delivered nothing (or only zeros) simply leaves no trace here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    values: Vec<f64>,
}

/// Upload body shape: `{"Throughput": [..]}` in iteration order
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadPayload {
    #[serde(rename = "Throughput")]
    pub throughput: Vec<f64>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Record one iteration's final throughput. Returns whether the
    /// value was accepted (Kbps > 0).
    pub fn push(&mut self, kbps: f64) -> bool {
        if kbps > 0.0 {
            self.values.push(kbps);
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Snapshot as the upload body
    pub fn to_payload(&self) -> UploadPayload {
        UploadPayload {
            throughput: self.values.clone(),
        }
    }

    /// POST the payload to `url` and return the raw response body.
    ///
    /// The provider's status code is not interpreted; whatever body it
    /// answers with is handed back for display.
    pub async fn upload(&self, url: &str) -> Result<String> {
        let body = serde_json::to_vec(&self.to_payload())?;
        let client = reqwest::Client::builder()
            .timeout(defaults::UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| AppError::network(format!("failed to build upload client: {}", e)))?;
        let response = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::network(format!("upload failed: {}", e)))?;
        response
            .text()
            .await
            .map_err(|e| AppError::network(format!("failed to read upload response: {}", e)))
    }
}

/// Write a raw Kbps value to `path` as plain decimal text, world-readable.
pub fn write_value(path: &Path, kbps: f64) -> Result<()> {
    std::fs::write(path, format!("{}", kbps))
        .map_err(|e| AppError::io(format!("failed to write {}: {}", path.display(), e)))?;
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, Permissions::from_mode(0o644))
            .map_err(|e| AppError::io(format!("failed to chmod {}: {}", path.display(), e)))?;
    }
    Ok(())
}
