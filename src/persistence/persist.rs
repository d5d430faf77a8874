use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use super::settings::AppSettings;
use crate::graph_utils::document::{Category, GraphDocument, Node, SavedVersion};

/// Storage-slot shape: the live node set is wrapped together with a
/// last-modified stamp, unlike the export shape below.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    pub nodes: Vec<Node>,
    pub last_modified: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub current_state: CurrentState,
    pub saved_versions: Vec<SavedVersion>,
    pub categories: Vec<Category>,
}

impl StoredDocument {
    pub fn from_document(doc: &GraphDocument) -> Self {
        Self {
            current_state: CurrentState {
                nodes: doc.nodes.clone(),
                last_modified: epoch_ms(),
            },
            saved_versions: doc.saved_versions.clone(),
            categories: doc.categories.clone(),
        }
    }

    pub fn into_document(self) -> GraphDocument {
        GraphDocument {
            nodes: self.current_state.nodes,
            saved_versions: self.saved_versions,
            categories: self.categories,
        }
    }
}

/// Export-file shape: `currentState` is the bare node array. The asymmetry
/// with [`StoredDocument`] is part of the on-disk contract; import accepts
/// both.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile<'a> {
    pub exported_at: String,
    pub current_state: &'a [Node],
    pub saved_versions: &'a [SavedVersion],
    pub categories: &'a [Category],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportedState {
    Bare(Vec<Node>),
    #[serde(rename_all = "camelCase")]
    Wrapped {
        nodes: Vec<Node>,
        #[serde(default)]
        #[allow(dead_code)]
        last_modified: i64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportFile {
    current_state: ImportedState,
    #[serde(default)]
    saved_versions: Option<Vec<SavedVersion>>,
    #[serde(default)]
    categories: Option<Vec<Category>>,
}

/// A validated import. Versions and categories are optional in the file;
/// missing sections keep whatever the live document already has.
#[derive(Debug)]
pub struct ImportedDocument {
    pub nodes: Vec<Node>,
    pub saved_versions: Option<Vec<SavedVersion>>,
    pub categories: Option<Vec<Category>>,
}

impl ImportedDocument {
    pub fn into_document(self, current: &GraphDocument) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes,
            saved_versions: self
                .saved_versions
                .unwrap_or_else(|| current.saved_versions.clone()),
            categories: self
                .categories
                .unwrap_or_else(|| current.categories.clone()),
        }
    }
}

pub fn epoch_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

static SETTINGS_OVERRIDE: OnceLock<AppSettings> = OnceLock::new();

pub fn set_settings_override(settings: AppSettings) {
    let _ = SETTINGS_OVERRIDE.set(settings);
}

fn autosave_dir() -> PathBuf {
    // If an override is set (e.g. from main.rs), use it.
    if let Some(settings) = SETTINGS_OVERRIDE.get() {
        return settings.autosave_dir();
    }
    // Load settings if present; else use defaults
    let settings = AppSettings::load().unwrap_or_default();
    settings.autosave_dir()
}

/// The single storage slot the editor reads at startup and writes back on
/// every committed change.
pub fn active_state_path() -> PathBuf {
    autosave_dir().join("dependency-graph.json")
}

fn ensure_autosave_dir() -> std::io::Result<()> {
    fs::create_dir_all(autosave_dir())
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn save_active(doc: &GraphDocument) -> anyhow::Result<PathBuf> {
    ensure_autosave_dir()?;
    let stored = StoredDocument::from_document(doc);
    let mut s = serde_json::to_string_pretty(&stored)?;
    s.push('\n');
    let path = active_state_path();
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

pub fn load_active() -> anyhow::Result<Option<GraphDocument>> {
    let path = active_state_path();
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<GraphDocument> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let stored: StoredDocument = serde_json::from_str(&buf)?;
    Ok(stored.into_document())
}

/// Serialize the full document in the export shape.
pub fn export_json(doc: &GraphDocument) -> anyhow::Result<String> {
    let file = ExportFile {
        exported_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        current_state: &doc.nodes,
        saved_versions: &doc.saved_versions,
        categories: &doc.categories,
    };
    let mut s = serde_json::to_string_pretty(&file)?;
    s.push('\n');
    Ok(s)
}

pub fn export_file_name() -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    let stamp = OffsetDateTime::now_utc()
        .format(fmt)
        .unwrap_or_else(|_| "unknown".to_string());
    format!("dependency-graph-{}.json", stamp)
}

/// Write the export file into `dir` under the dated default name.
pub fn export_to_dir(doc: &GraphDocument, dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name());
    let s = export_json(doc)?;
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

/// Parse an import. Fails closed: a missing or malformed `currentState`
/// (or any malformed node inside it) is an error and nothing is applied.
pub fn parse_import(text: &str) -> anyhow::Result<ImportedDocument> {
    let file: ImportFile = serde_json::from_str(text)?;
    let nodes = match file.current_state {
        ImportedState::Bare(nodes) => nodes,
        ImportedState::Wrapped { nodes, .. } => nodes,
    };
    Ok(ImportedDocument {
        nodes,
        saved_versions: file.saved_versions,
        categories: file.categories,
    })
}

pub fn import_from_path(path: &Path) -> anyhow::Result<ImportedDocument> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    parse_import(&buf)
}
