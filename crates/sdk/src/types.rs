//! Task Argument Types
//!
//! Mirrors the `args` object each remote function expects. Optional fields
//! are sent as `null` so the server applies its own default.

use serde::Serialize;

/// Args of `slugify`
#[derive(Debug, Clone, Serialize)]
pub struct SlugifyArgs {
    pub text: String,
}

/// Args of `upload_data`
#[derive(Debug, Clone, Serialize)]
pub struct UploadDataArgs {
    pub contents: Vec<String>,
    pub filenames: Vec<String>,
    pub username: String,
}

/// Args of `list_doc_files`
#[derive(Debug, Clone, Serialize)]
pub struct ListDocFilesArgs {
    pub doc_name: String,
    pub file_pattern: String,
}

/// Args of `check_file_exists`
#[derive(Debug, Clone, Serialize)]
pub struct CheckFileArgs {
    pub file: String,
}

/// Args of `read_file`
#[derive(Debug, Clone, Serialize)]
pub struct ReadFileArgs {
    pub file: String,
    /// Add the file path as a column of the returned data
    pub add_file: Option<bool>,
}

/// Args of `read_files`; either `files` or `doc_name` + `file_pattern`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadFilesArgs {
    pub files: Option<Vec<String>>,
    pub doc_name: Option<String>,
    pub file_pattern: Option<String>,
    pub add_file: Option<bool>,
}

/// Args of `list_corresponding_files`: the target files derived from `files`
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCorrespondingFilesArgs {
    pub files: Vec<String>,
    pub data_type: Option<String>,
    pub variable_desc: Option<String>,
    pub source: Option<String>,
    pub pagenum: Option<String>,
    pub file_format: Option<String>,
}
