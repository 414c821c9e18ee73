//! Google Drive store (Drive API v3 over blocking HTTP).
//!
//! Objects are Drive files addressed by name.  Authentication lives in
//! `auth`; this module only issues file requests with a bearer token.

pub mod auth;

use serde::Deserialize;

pub use auth::{DriveConfig, TokenManager};

use super::{validate_object_name, RemoteStore};
use crate::errors::{Result, StashError};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveStore {
    tokens: TokenManager,
}

impl DriveStore {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            tokens: TokenManager::new(config),
        }
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.tokens.access_token()?))
    }

    /// Look up the id of the first non-trashed file called `name`.
    fn find(&self, name: &str) -> Result<Option<String>> {
        let query = format!("name = '{}' and trashed = false", escape_query(name));
        let mut resp = ureq::get(FILES_URL)
            .header("Authorization", self.bearer()?)
            .query("q", &query)
            .query("fields", "files(id)")
            .call()
            .map_err(|e| map_http_error(name, e))?;

        let list: FileList = resp
            .body_mut()
            .read_json()
            .map_err(|e| StashError::Remote(format!("file list response: {e}")))?;

        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    fn create_empty(&self, name: &str) -> Result<String> {
        let mut resp = ureq::post(FILES_URL)
            .header("Authorization", self.bearer()?)
            .send_json(serde_json::json!({ "name": name }))
            .map_err(|e| map_http_error(name, e))?;

        let file: DriveFile = resp
            .body_mut()
            .read_json()
            .map_err(|e| StashError::Remote(format!("create response: {e}")))?;
        Ok(file.id)
    }
}

impl RemoteStore for DriveStore {
    fn name(&self) -> &str {
        "google"
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        validate_object_name(name)?;
        let id = self
            .find(name)?
            .ok_or_else(|| StashError::RemoteNotFound(name.to_string()))?;

        tracing::debug!(object = name, "downloading from Google Drive");
        let mut resp = ureq::get(format!("{FILES_URL}/{id}"))
            .header("Authorization", self.bearer()?)
            .query("alt", "media")
            .call()
            .map_err(|e| map_http_error(name, e))?;

        resp.body_mut()
            .read_to_vec()
            .map_err(|e| StashError::Remote(format!("could not download '{name}': {e}")))
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_object_name(name)?;
        let id = match self.find(name)? {
            Some(id) => id,
            None => self.create_empty(name)?,
        };

        tracing::debug!(object = name, bytes = data.len(), "uploading to Google Drive");
        ureq::patch(format!("{UPLOAD_URL}/{id}"))
            .header("Authorization", self.bearer()?)
            .query("uploadType", "media")
            .send(data)
            .map_err(|e| map_http_error(name, e))?;
        Ok(())
    }
}

/// Escape a value for a Drive `q` string literal.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn map_http_error(name: &str, err: ureq::Error) -> StashError {
    match err {
        ureq::Error::StatusCode(404) => StashError::RemoteNotFound(name.to_string()),
        other => StashError::Remote(format!("Google Drive request for '{name}' failed: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_are_escaped() {
        assert_eq!(escape_query("plain"), "plain");
        assert_eq!(escape_query("it's"), "it\\'s");
        assert_eq!(escape_query("a\\b"), "a\\\\b");
    }

    #[test]
    fn not_found_status_maps_to_remote_not_found() {
        let err = map_http_error("vault1", ureq::Error::StatusCode(404));
        assert!(matches!(err, StashError::RemoteNotFound(_)));

        let err = map_http_error("vault1", ureq::Error::StatusCode(500));
        assert!(matches!(err, StashError::Remote(_)));
    }

    #[test]
    fn file_list_tolerates_missing_files_field() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }
}
