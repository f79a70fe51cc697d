//! Named templates on disk.
//!
//! A template named `academic` is `<dir>/academic.json` for prompting plus
//! an optional deck template at `<dir>/academic.pptx` or
//! `<dir>/academic/template.pptx`.

use slidegen_core::{Error, Result, TemplateConfig};
use slidegen_pptx::DeckTemplate;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_EXTENSION: &str = "json";
const DECK_TEMPLATE_FILE: &str = "template.pptx";

/// A template's prompting configuration and the deck it renders into.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    /// Prompting configuration.
    pub config: TemplateConfig,
    /// Deck template, the built-in one when none is on disk.
    pub deck: DeckTemplate,
}

/// Summary line for `slidegen templates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    /// File stem, used to select the template.
    pub name: String,
    /// Display name from the configuration.
    pub display_name: String,
    /// Description from the configuration, possibly empty.
    pub description: String,
}

/// Directory of template configurations.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load a template by name or by path to a JSON file.
    pub fn load(&self, name: &str) -> Result<LoadedTemplate> {
        let config_path = self.config_path(name)?;
        log::debug!("Loading template configuration {}", config_path.display());

        let json = fs::read_to_string(&config_path).map_err(|e| {
            Error::ConfigError(format!("Cannot read {}: {}", config_path.display(), e))
        })?;
        let config = TemplateConfig::from_json(&json)?;

        let deck = match self.deck_template_path(name, &config_path) {
            Some(path) => {
                log::debug!("Using deck template {}", path.display());
                DeckTemplate::from_path(&path)?
            }
            None => {
                log::debug!("No deck template for '{}', using the built-in one", name);
                DeckTemplate::builtin()
            }
        };

        Ok(LoadedTemplate { config, deck })
    }

    /// Every `*.json` configuration in the directory, sorted by name.
    ///
    /// A missing directory lists as empty. Unparseable files are skipped.
    pub fn list(&self) -> Result<Vec<TemplateSummary>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let config = match fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|json| TemplateConfig::from_json(&json))
            {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let display_name = if config.name.trim().is_empty() {
                name.to_string()
            } else {
                config.name
            };
            summaries.push(TemplateSummary {
                name: name.to_string(),
                display_name,
                description: config.description,
            });
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    fn config_path(&self, name: &str) -> Result<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let named = self.dir.join(format!("{}.{}", name, CONFIG_EXTENSION));
        if named.is_file() {
            return Ok(named);
        }

        Err(Error::ConfigError(format!(
            "Template '{}' not found (looked for {})",
            name,
            named.display()
        )))
    }

    fn deck_template_path(&self, name: &str, config_path: &Path) -> Option<PathBuf> {
        let stem = config_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let base = config_path.parent().unwrap_or(&self.dir);

        [
            base.join(format!("{}.pptx", stem)),
            base.join(stem).join(DECK_TEMPLATE_FILE),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidegen_pptx::{Deck, DeckRenderer};
    use slidegen_core::{FlatOutline, StructuredOutline};
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, contents: &str) {
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_load_named_template_uses_builtin_deck() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "academic.json",
            r#"{"name": "Academic", "description": "Lecture slides", "system_prompt": "Be rigorous."}"#,
        );

        let loaded = TemplateStore::new(dir.path()).load("academic").unwrap();
        assert_eq!(loaded.config.name, "Academic");
        assert_eq!(loaded.config.system_prompt, "Be rigorous.");
        assert_eq!(loaded.deck.layouts().unwrap().len(), 2);
    }

    #[test]
    fn test_load_by_direct_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "custom.json", r#"{"name": "Custom"}"#);
        let path = dir.path().join("custom.json");

        let store = TemplateStore::new("does-not-exist");
        let loaded = store.load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.config.name, "Custom");
    }

    #[test]
    fn test_missing_template_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = TemplateStore::new(dir.path()).load("sales").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "broken.json", "{ not json");
        let err = TemplateStore::new(dir.path()).load("broken").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_deck_template_in_subdirectory_is_used() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pitch_deck.json", r#"{"name": "Pitch"}"#);

        // A rendered deck is a valid template; its slides are dropped on use.
        let outline = StructuredOutline::Flat(FlatOutline {
            titles: vec!["Seed".into()],
            bullets: vec![],
        });
        let deck = DeckRenderer::new()
            .render(&outline, &DeckTemplate::builtin(), "Seed")
            .unwrap();
        fs::create_dir(dir.path().join("pitch_deck")).unwrap();
        deck.save(dir.path().join("pitch_deck").join(DECK_TEMPLATE_FILE))
            .unwrap();

        let loaded = TemplateStore::new(dir.path()).load("pitch_deck").unwrap();
        let reloaded = Deck::from_bytes(&loaded.deck.package().to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded.slide_count().unwrap(), 2);
    }

    #[test]
    fn test_unreadable_deck_template_is_config_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "sales.json", r#"{"name": "Sales"}"#);
        write(dir.path(), "sales.pptx", "not a zip");

        let err = TemplateStore::new(dir.path()).load("sales").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_list_templates() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "sales.json", r#"{"name": "Sales", "description": "Pitch a product"}"#);
        write(dir.path(), "academic.json", r#"{"description": "Lectures"}"#);
        write(dir.path(), "broken.json", "{");
        write(dir.path(), "notes.txt", "ignored");

        let list = TemplateStore::new(dir.path()).list().unwrap();
        let names: Vec<_> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["academic", "sales"]);
        assert_eq!(list[0].display_name, "academic");
        assert_eq!(list[1].display_name, "Sales");
        assert_eq!(list[1].description, "Pitch a product");
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let store = TemplateStore::new("/nonexistent/slidegen/templates");
        assert!(store.list().unwrap().is_empty());
    }
}
