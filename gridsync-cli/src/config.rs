//! YAML configuration: `script.yml` (service and logging) and `setup.yml`
//! (credentials, grids, file mappings).

use std::path::Path;
use std::time::Duration;

use gridsync::formats::FormatType;
use serde::Deserialize;

pub const DEFAULT_SETUP_PATH: &str = "config/setup.yml";
pub const DEFAULT_SCRIPT_PATH: &str = "config/script.yml";

const ALL_FORMATS: [FormatType; 3] = [FormatType::Markup, FormatType::Json, FormatType::Po];

const DEFAULT_FETCH_LIMIT: usize = 1500;
const DEFAULT_IMPORT_CHUNK_SIZE: usize = 1500;
const DEFAULT_MAX_FETCH_RETRY: u32 = 3;

/// Contents of `script.yml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptConfig {
    pub gridly_url: String,
    #[serde(default = "default_max_fetch_retry")]
    pub max_fetch_retry: u32,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_import_chunk_size")]
    pub import_chunk_size: usize,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    /// `DEBUG`, `INFO` or `WARNING`; anything else means `INFO`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `FILE` writes to `file`; anything else logs to stderr.
    #[serde(default = "default_log_mode")]
    pub mode: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            mode: default_log_mode(),
            file: default_log_file(),
        }
    }
}

impl LogConfig {
    /// The `tracing` filter directive for the configured level.
    pub fn filter_directive(&self) -> &'static str {
        match self.level.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => "debug",
            "WARNING" | "WARN" => "warn",
            _ => "info",
        }
    }

    pub fn logs_to_file(&self) -> bool {
        self.mode.trim().eq_ignore_ascii_case("FILE")
    }
}

fn default_max_fetch_retry() -> u32 {
    DEFAULT_MAX_FETCH_RETRY
}

fn default_fetch_limit() -> usize {
    DEFAULT_FETCH_LIMIT
}

fn default_import_chunk_size() -> usize {
    DEFAULT_IMPORT_CHUNK_SIZE
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_log_mode() -> String {
    "CONSOLE".to_string()
}

fn default_log_file() -> String {
    "log/app.log".to_string()
}

fn default_true() -> bool {
    true
}

/// Contents of `setup.yml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetupConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub export: Option<ExportConfig>,
    #[serde(default)]
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExportConfig {
    pub directory: String,
    /// Merge all grids into one JSON file. Markup output is always per grid.
    #[serde(default = "default_true")]
    pub combine: bool,
    #[serde(default)]
    pub grids: Vec<GridConfig>,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImportConfig {
    pub data_directory: String,
    #[serde(default)]
    pub grids: Vec<GridConfig>,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GridConfig {
    pub name: String,
    pub view_id: String,
    /// Id prefix owned by this grid on import.
    #[serde(default)]
    pub path: Option<String>,
    /// Receives imported records no other grid owns.
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(default)]
    pub mappings: Vec<FileMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileMapping {
    pub file_name: String,
    pub column_id: String,
    /// Written as a top-level `name` into exported JSON.
    #[serde(default)]
    pub lang: Option<String>,
}

impl FileMapping {
    /// Format declared by the file name's extension.
    pub fn format(&self) -> Result<FormatType, String> {
        FormatType::from_path(&self.file_name).map_err(|e| e.to_string())
    }
}

/// Runtime knobs threaded through the export and import loops.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub max_fetch_retry: u32,
    pub fetch_limit: usize,
    pub import_chunk_size: usize,
    /// Pause before retrying a rate-limited request.
    pub retry_delay: Duration,
}

impl Settings {
    pub fn from_script(script: &ScriptConfig) -> Self {
        Settings {
            base_url: script.gridly_url.trim_end_matches('/').to_string(),
            max_fetch_retry: script.max_fetch_retry,
            fetch_limit: script.fetch_limit.max(1),
            import_chunk_size: script.import_chunk_size.max(1),
            retry_delay: Duration::from_secs(1),
        }
    }
}

pub fn load_script_config<P: AsRef<Path>>(path: P) -> Result<ScriptConfig, String> {
    load_yaml(path.as_ref())
}

pub fn load_setup_config<P: AsRef<Path>>(path: P) -> Result<SetupConfig, String> {
    load_yaml(path.as_ref())
}

fn load_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading config {}: {}", path.display(), e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| format!("Error parsing config {}: {}", path.display(), e))
}

fn validate_api_key(setup: &SetupConfig) -> Result<&str, String> {
    match setup.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err("api-key is missing. Please add 'api-key' property in setup.yml.".to_string()),
    }
}

fn validate_grids(grids: &[GridConfig], section: &str) -> Result<(), String> {
    if grids.is_empty() {
        return Err(format!(
            "{section} grid(s) is missing. Please add '{section}.grids' property in setup.yml."
        ));
    }
    for grid in grids {
        if grid.name.trim().is_empty() {
            return Err(format!(
                "grid name is missing. Please add '{section}.grids.name' in setup.yml"
            ));
        }
        if grid.view_id.trim().is_empty() {
            return Err(format!(
                "grid view-id is missing. Please add '{section}.grids.view-id' in setup.yml"
            ));
        }
    }
    Ok(())
}

fn validate_mappings(
    mappings: &[FileMapping],
    section: &str,
    allowed: &[FormatType],
) -> Result<(), String> {
    if mappings.is_empty() {
        return Err(format!(
            "file mapping(s) is missing. Please add '{section}.files.mappings' in setup.yml"
        ));
    }
    let extensions = allowed
        .iter()
        .map(|f| format!(".{}", f.extension()))
        .collect::<Vec<_>>()
        .join(", ");
    for mapping in mappings {
        if mapping.file_name.trim().is_empty() {
            return Err(format!(
                "file-name is missing. Please add '{section}.files.mappings.file-name' in setup.yml"
            ));
        }
        match mapping.format() {
            Ok(format) if allowed.contains(&format) => {}
            _ => {
                return Err(format!(
                    "file {} must be one of {}. Please fix '{section}.files.mappings.file-name' in setup.yml",
                    mapping.file_name, extensions
                ));
            }
        }
        if mapping.column_id.trim().is_empty() {
            return Err(format!(
                "column-id is missing. Please add '{section}.files.mappings.column-id' in setup.yml"
            ));
        }
    }
    Ok(())
}

/// Checks everything an export needs and returns the api key and export section.
pub fn validate_export(setup: &SetupConfig) -> Result<(&str, &ExportConfig), String> {
    let api_key = validate_api_key(setup)?;
    let export = setup.export.as_ref().ok_or_else(|| {
        "export configurations are missing. Please add 'export' property in setup.yml.".to_string()
    })?;
    if export.directory.trim().is_empty() {
        return Err(
            "export directory is missing. Please add 'export.directory' property in setup.yml."
                .to_string(),
        );
    }
    validate_grids(&export.grids, "export")?;
    let exportable: Vec<FormatType> = ALL_FORMATS
        .into_iter()
        .filter(FormatType::supports_export)
        .collect();
    validate_mappings(&export.files.mappings, "export", &exportable)?;
    Ok((api_key, export))
}

/// Checks everything an import needs and returns the api key and import section.
pub fn validate_import(setup: &SetupConfig) -> Result<(&str, &ImportConfig), String> {
    let api_key = validate_api_key(setup)?;
    let import = setup.import.as_ref().ok_or_else(|| {
        "import configurations are missing. Please add 'import' property in setup.yml.".to_string()
    })?;
    if import.data_directory.trim().is_empty() {
        return Err(
            "import data-directory is missing. Please add 'import.data-directory' property in setup.yml."
                .to_string(),
        );
    }
    validate_grids(&import.grids, "import")?;
    match import.grids.iter().filter(|g| g.default).count() {
        0 => {
            return Err(
                "Default grid is missing. Please set one grid with 'import.grids.default=true' in setup.yml"
                    .to_string(),
            );
        }
        1 => {}
        _ => {
            return Err(
                "More than one default grid. Please set 'import.grids.default=true' on exactly one grid in setup.yml"
                    .to_string(),
            );
        }
    }
    validate_mappings(&import.files.mappings, "import", &ALL_FORMATS)?;
    Ok((api_key, import))
}
