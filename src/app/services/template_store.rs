//! Directory-backed template storage
//!
//! Each template lives in its own TOML file named after a slug of the template
//! name (`Leased Print` is stored as `leased-print.toml`). Saving a template
//! whose slug already exists replaces it.

use crate::app::models::Template;
use crate::config::Config;
use crate::constants::TEMPLATE_EXTENSION;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Template CRUD over a directory of TOML files
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the platform data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Config::default_templates_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a template with the given name is stored in
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::configuration(format!(
                "Template name '{}' has no usable characters",
                name
            )));
        }
        Ok(self.dir.join(format!("{}.{}", slug, TEMPLATE_EXTENSION)))
    }

    /// All stored templates, sorted by name
    ///
    /// A missing directory holds no templates. Files that fail to parse are
    /// skipped with a warning.
    pub fn list(&self) -> Result<Vec<Template>> {
        if !self.dir.exists() {
            debug!("Template directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut templates = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                Error::directory_traversal(
                    format!("Failed to read template directory {}", self.dir.display()),
                    e,
                )
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != TEMPLATE_EXTENSION) {
                continue;
            }

            match load_template_file(path) {
                Ok(template) => templates.push(template),
                Err(e) => warn!("Skipping unreadable template {}: {}", path.display(), e),
            }
        }

        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    /// Template stored under `name`
    ///
    /// # Errors
    ///
    /// `Error::TemplateNotFound` when no template with that name is stored
    pub fn get(&self, name: &str) -> Result<Template> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(Error::template_not_found(name));
        }
        load_template_file(&path)
    }

    /// Create or replace a template, returning the file it was written to
    pub fn save(&self, template: &Template) -> Result<PathBuf> {
        let path = self.path_for(&template.name)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::io(
                format!("Failed to create template directory {}", self.dir.display()),
                e,
            )
        })?;

        let content = toml::to_string_pretty(template)
            .map_err(|e| Error::toml(path.display().to_string(), e.to_string()))?;
        std::fs::write(&path, content)
            .map_err(|e| Error::io(format!("Failed to write template {}", path.display()), e))?;

        info!("Saved template '{}' to {}", template.name, path.display());
        Ok(path)
    }

    /// Remove a stored template
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(Error::template_not_found(name));
        }
        std::fs::remove_file(&path)
            .map_err(|e| Error::io(format!("Failed to remove template {}", path.display()), e))?;

        info!("Removed template '{}'", name);
        Ok(())
    }
}

/// Parse a template from a TOML file
pub fn load_template_file(path: &Path) -> Result<Template> {
    if !path.exists() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read template {}", path.display()), e))?;
    toml::from_str(&content).map_err(|e| Error::toml(path.display().to_string(), e.to_string()))
}

/// Lowercase alphanumeric runs joined by single hyphens
fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::Matchpoints;
    use tempfile::TempDir;

    fn template(name: &str) -> Template {
        Template::new(name)
            .with_matchpoints(Matchpoints::from_keys(&["isbn", "upc"]).unwrap())
            .with_agent("acq")
            .with_field("fund", "10001adbk")
            .with_field("copies", 3i64)
            .with_field("locations", vec!["mya0n".to_string()])
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Leased Print"), "leased-print");
        assert_eq!(slugify("  BT / Series (2024) "), "bt-series-2024");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_save_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = TemplateStore::new(temp_dir.path().join("templates"));

        let saved = template("Leased Print");
        let path = store.save(&saved).unwrap();
        assert!(path.ends_with("leased-print.toml"));

        let loaded = store.get("Leased Print").unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_save_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TemplateStore::new(temp_dir.path());

        store.save(&template("Firm")).unwrap();
        store
            .save(&Template::new("Firm").with_field("fund", "other"))
            .unwrap();

        let templates = store.list().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(
            templates[0].value("fund").and_then(|v| v.as_scalar()),
            Some("other".to_string())
        );
    }

    #[test]
    fn test_list_sorted_and_skips_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = TemplateStore::new(temp_dir.path());
        store.save(&template("Zines")).unwrap();
        store.save(&template("Audio")).unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "not a template").unwrap();
        std::fs::write(temp_dir.path().join("broken.toml"), "name = ").unwrap();

        let names: Vec<String> = store.list().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Audio", "Zines"]);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TemplateStore::new(temp_dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_get_and_delete_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = TemplateStore::new(temp_dir.path());

        assert!(matches!(
            store.get("nope"),
            Err(Error::TemplateNotFound { .. })
        ));
        assert!(matches!(
            store.delete("nope"),
            Err(Error::TemplateNotFound { .. })
        ));

        store.save(&template("Gone Soon")).unwrap();
        store.delete("Gone Soon").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_unusable_name_rejected() {
        let store = TemplateStore::new("/tmp");
        assert!(matches!(
            store.save(&Template::new("///")),
            Err(Error::Configuration { .. })
        ));
    }
}
