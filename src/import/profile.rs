//! Exported profile files on disk.

use super::handlers::MetaDataHandler;
use crate::export::PROFILE_SUFFIX;
use crate::json::{FieldMap, JsonReader, JsonValue};
use crate::models::keys;
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// The metadata block of a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileMetadata {
    /// Profile name given at export time.
    pub profile_name: String,
    /// When the document was exported.
    pub creation_date: DateTime<Utc>,
    /// Format version the document was written with.
    pub version: String,
    /// Format discriminator, checked before import.
    pub doc_type: String,
}

impl ProfileMetadata {
    pub(crate) fn from_fields(fields: &FieldMap) -> Result<Self> {
        let missing =
            |key: &str| Error::MalformedDocument(format!("metadata block is missing {key}"));
        let profile_name = fields
            .get(keys::PROFILE_NAME)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing(keys::PROFILE_NAME))?;
        let version = fields
            .get(keys::VERSION)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing(keys::VERSION))?;
        let doc_type = fields
            .get(keys::TYPE)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| missing(keys::TYPE))?;
        let millis = fields
            .get(keys::CREATION_DATE)
            .and_then(JsonValue::as_i64)
            .ok_or_else(|| missing(keys::CREATION_DATE))?;
        let creation_date = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| missing(keys::CREATION_DATE))?;

        Ok(Self {
            profile_name: profile_name.to_string(),
            creation_date,
            version: version.to_string(),
            doc_type: doc_type.to_string(),
        })
    }
}

/// One exported profile file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    path: PathBuf,
    /// File name, including the profile suffix.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
}

impl Profile {
    /// Describes an existing profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be inspected.
    pub fn at(path: &Path) -> Result<Self> {
        let meta =
            std::fs::metadata(path).map_err(|e| Error::operation("stat_profile_file", e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            file_size: meta.len(),
        })
    }

    /// Location of the profile file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the metadata block, touching only the leading bytes of the
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the metadata
    /// block is malformed.
    pub fn load_metadata(&self) -> Result<ProfileMetadata> {
        let handler = JsonReader::read_file(&self.path, MetaDataHandler::new())?;
        ProfileMetadata::from_fields(&handler.into_fields())
    }

    /// Deletes the profile file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn delete(self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|e| Error::operation("delete_profile_file", e))
    }
}

/// Lists the profile files of a directory, sorted by file name.
///
/// Only files carrying the two-part profile suffix are considered.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn read_profiles_from_dir(dir: &Path) -> Result<Vec<Profile>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| Error::operation("read_profiles_dir", e))?;

    let mut profiles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::operation("read_profiles_dir", e))?;
        let path = entry.path();
        let is_profile = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(PROFILE_SUFFIX));
        if is_profile && path.is_file() {
            profiles.push(Profile::at(&path)?);
        }
    }
    profiles.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(profiles)
}

/// Strips path-hostile characters from a profile name so it can be used
/// as a file stem.
#[must_use]
pub fn normalize_file_name(name: &str) -> String {
    const HOSTILE: &[char] = &['/', '\\', ':', '?', '%', '*', '|', '"', '<', '>'];
    name.trim()
        .chars()
        .filter(|c| !HOSTILE.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "{\"metaData\":{\"creationDate\":1700000000000,\
        \"profileName\":\"Maria\",\"version\":\"1.0.0\",\
        \"type\":\"JsonSingleDocExportTarget\"},\
        \"HKCategoryTypeIdentifierSleepAnalysis\":[]}";

    #[test]
    fn test_load_metadata_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maria.json.hsg");
        std::fs::write(&path, DOC).unwrap();

        let profile = Profile::at(&path).unwrap();
        assert_eq!(profile.file_name, "maria.json.hsg");
        assert_eq!(profile.file_size, DOC.len() as u64);

        let metadata = profile.load_metadata().unwrap();
        assert_eq!(metadata.profile_name, "Maria");
        assert_eq!(metadata.version, "1.0.0");
        assert_eq!(metadata.doc_type, "JsonSingleDocExportTarget");
        assert_eq!(metadata.creation_date.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_directory_listing_filters_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json.hsg"), DOC).unwrap();
        std::fs::write(dir.path().join("a.json.hsg"), DOC).unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hi").unwrap();

        let profiles = read_profiles_from_dir(dir.path()).unwrap();
        let names: Vec<&str> = profiles.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.json.hsg", "b.json.hsg"]);
    }

    #[test]
    fn test_delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json.hsg");
        std::fs::write(&path, DOC).unwrap();

        Profile::at(&path).unwrap().delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("  Maria 2024  "), "Maria 2024");
        assert_eq!(normalize_file_name("a/b\\c:d?e"), "abcde");
        assert_eq!(normalize_file_name("100%*|\"<>"), "100");
    }
}
