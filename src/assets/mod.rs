//! Asset repositories - loading cutscene lists from storage
//!
//! Hand-off targets and host-started cutscenes resolve against named list
//! assets. Repositories load them: from script files on disk, or from memory
//! in tests and embedded hosts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::parser::parse_script;
use crate::types::list::{ActionList, ListSource};

/// Errors surfaced by asset repositories
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Asset not found: {id}")]
    NotFound { id: String },
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("Invalid asset format: {message}")]
    InvalidFormat { message: String },
}

/// Source of named [`ActionList`] assets.
#[async_trait]
pub trait ListRepository: Send + Sync {
    /// Load one asset by id. The returned list carries its asset id as
    /// source.
    async fn load(&self, id: &str) -> Result<ActionList, RepositoryError>;

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn list_ids(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Strategy for deriving asset ids at registration time.
pub trait IdGenerator {
    fn generate(&self, name: &str, content: &str) -> String;
}

/// Slugs the list name; falls back to a content hash for unnamed scripts.
pub struct DefaultIdGenerator;

impl IdGenerator for DefaultIdGenerator {
    fn generate(&self, name: &str, content: &str) -> String {
        if name.is_empty() {
            ContentHashIdGenerator.generate(name, content)
        } else {
            crate::types::list::slug(name)
        }
    }
}

/// Content-addressed ids: stable across renames, distinct across edits.
pub struct ContentHashIdGenerator;

impl IdGenerator for ContentHashIdGenerator {
    fn generate(&self, _name: &str, content: &str) -> String {
        format!("{:x}", md5::compute(content))
    }
}

/// Loads `<id>.md` script files from a base directory.
pub struct FileSystemListRepository {
    base_path: PathBuf,
}

impl FileSystemListRepository {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn script_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{id}.md"))
    }
}

#[async_trait]
impl ListRepository for FileSystemListRepository {
    async fn load(&self, id: &str) -> Result<ActionList, RepositoryError> {
        let path = self.script_path(id);
        if !path.exists() {
            return Err(RepositoryError::NotFound { id: id.to_string() });
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| RepositoryError::Io {
                message: format!("Failed to read script file {}: {}", path.display(), e),
            })?;

        let mut list = parse_script(&content).map_err(|e| RepositoryError::InvalidFormat {
            message: format!("Failed to parse script '{id}': {e}"),
        })?;
        list.id = id.to_string();
        list.source = ListSource::Asset { id: id.to_string() };
        Ok(list)
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.script_path(id).exists())
    }

    async fn list_ids(&self) -> Result<Vec<String>, RepositoryError> {
        let mut ids = Vec::new();
        let mut entries =
            tokio::fs::read_dir(&self.base_path)
                .await
                .map_err(|e| RepositoryError::Io {
                    message: format!(
                        "Failed to read directory {}: {}",
                        self.base_path.display(),
                        e
                    ),
                })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::Io {
                message: format!("Failed to read directory entry: {e}"),
            })?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("md")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }

        Ok(ids)
    }
}

/// In-memory repository for tests and embedded hosts.
#[derive(Default)]
pub struct InMemoryListRepository {
    lists: HashMap<String, ActionList>,
}

impl InMemoryListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut list: ActionList) {
        list.source = ListSource::Asset {
            id: list.id.clone(),
        };
        self.lists.insert(list.id.clone(), list);
    }
}

#[async_trait]
impl ListRepository for InMemoryListRepository {
    async fn load(&self, id: &str) -> Result<ActionList, RepositoryError> {
        self.lists
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_string() })
    }

    async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.lists.contains_key(id))
    }

    async fn list_ids(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.lists.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::action::{Action, ActionKind};
    use crate::types::value::Arg;

    fn sample_list(name: &str) -> ActionList {
        ActionList::new(
            name,
            vec![Action::new(ActionKind::Say {
                speaker: Arg::literal("A"),
                text: Arg::literal("hi"),
                seconds: 0.0,
            })],
        )
    }

    #[tokio::test]
    async fn in_memory_repository_round_trips() {
        let mut repo = InMemoryListRepository::new();
        repo.add(sample_list("intro"));

        assert!(repo.exists("intro").await.unwrap());
        let loaded = repo.load("intro").await.unwrap();
        assert_eq!(loaded.id, "intro");
        assert_eq!(
            loaded.source,
            ListSource::Asset {
                id: "intro".to_string()
            }
        );
        assert!(matches!(
            repo.load("missing").await,
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn content_hash_ids_are_stable_and_distinct() {
        let generator = ContentHashIdGenerator;
        let a = generator.generate("", "[WAIT 1s]");
        let b = generator.generate("", "[WAIT 1s]");
        let c = generator.generate("", "[WAIT 2s]");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn default_ids_prefer_the_name() {
        let generator = DefaultIdGenerator;
        assert_eq!(generator.generate("The Gate", "ignored"), "the_gate");
        assert_eq!(
            generator.generate("", "content"),
            ContentHashIdGenerator.generate("", "content")
        );
    }
}
