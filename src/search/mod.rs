//! Content search
//!
//! Material is split into heading-level documents which are handed to a search
//! backend (an embedding + vector store in production). The backend itself lives
//! outside this crate behind [`SearchBackend`].

pub mod chunk;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::material::{MaterialTree, NodeKey};
use chunk::split_page;

/// One indexable chunk of material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    /// Stable id: page URL plus anchor
    pub id: String,
    pub text: String,
    pub title: String,
    pub url: String,
    pub section_anchor: String,
    pub theme: String,
    pub course: String,
    pub page: String,
}

/// A ranked match returned by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: f32,
    pub document: SearchDocument,
}

/// A text search service over material documents
pub trait SearchBackend {
    /// Replace the indexed documents
    fn index(&mut self, documents: &[SearchDocument]) -> Result<()>;

    /// Best matches for `query`, highest score first
    fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

fn page_documents(
    markdown: &str,
    key: &NodeKey,
    base_path: &str,
    names: (&str, &str, &str),
) -> Vec<SearchDocument> {
    let page_url = key.url(base_path);
    let (theme, course, page) = names;

    split_page(markdown)
        .into_iter()
        .map(|c| {
            let url = if c.anchor.is_empty() {
                page_url.clone()
            } else {
                format!("{}#{}", page_url, c.anchor)
            };
            SearchDocument {
                id: url.clone(),
                text: c.text,
                title: c.title,
                url,
                section_anchor: c.anchor,
                theme: theme.to_string(),
                course: course.to_string(),
                page: page.to_string(),
            }
        })
        .collect()
}

/// Split every theme, course and section body of `tree` into documents.
///
/// The tree must have been loaded with markdown.
pub fn documents(tree: &MaterialTree, base_path: &str) -> Vec<SearchDocument> {
    let mut docs = Vec::new();

    for theme in &tree.themes {
        let key = NodeKey::theme(&theme.repo, &theme.id);
        let names = (theme.name.as_str(), "", theme.name.as_str());
        docs.extend(page_documents(&theme.markdown, &key, base_path, names));

        for course in &theme.courses {
            let key = NodeKey::course(&theme.repo, &theme.id, &course.id);
            let names = (theme.name.as_str(), course.name.as_str(), course.name.as_str());
            docs.extend(page_documents(&course.markdown, &key, base_path, names));

            for section in &course.sections {
                let key = NodeKey::section(&theme.repo, &theme.id, &course.id, &section.id);
                let names = (theme.name.as_str(), course.name.as_str(), section.name.as_str());
                docs.extend(page_documents(&section.markdown, &key, base_path, names));
            }
        }
    }

    docs
}

/// The documents last sent to the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub documents: Vec<SearchDocument>,
}

impl Snapshot {
    /// Load a snapshot; a missing file is an empty snapshot
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read search snapshot from {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| "Failed to parse search snapshot")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot directory {:?}", parent))?;
        }
        let contents =
            serde_json::to_string(self).with_context(|| "Failed to serialize search snapshot")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write search snapshot to {:?}", path))?;
        Ok(())
    }

    /// Does `current` differ from what was indexed? Documents are compared by id
    /// and text, so a moved or renamed page counts as a change.
    pub fn has_changed(&self, current: &[SearchDocument]) -> bool {
        self.documents.len() != current.len()
            || self
                .documents
                .iter()
                .zip(current)
                .any(|(old, new)| old.id != new.id || old.text != new.text)
    }
}

/// Re-index `documents` if they differ from the snapshot at `snapshot_path`.
///
/// Returns whether the backend was updated.
pub fn refresh_index(
    backend: &mut dyn SearchBackend,
    documents: Vec<SearchDocument>,
    snapshot_path: &Path,
) -> Result<bool> {
    let previous = Snapshot::load(snapshot_path)?;
    if !previous.has_changed(&documents) {
        tracing::info!("Material unchanged, skipping search re-index");
        return Ok(false);
    }

    tracing::info!("Indexing {} search documents", documents.len());
    backend.index(&documents)?;
    Snapshot { documents }.save(snapshot_path)?;
    Ok(true)
}
