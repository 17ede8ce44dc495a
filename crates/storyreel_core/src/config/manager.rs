//! Loading and persisting the settings file.
//!
//! The manager owns one TOML file. Whole-file saves regenerate it with
//! section comments; section updates go through `toml_edit` so the rest of
//! the file is left byte-for-byte alone. Every write lands in a temp file
//! first and is renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors raised while reading or writing the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Config file is not valid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Could not serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Could not parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result alias for config load and save paths.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level section names a settings file may contain.
const KNOWN_SECTIONS: [&str; 5] = ["paths", "logging", "timing", "captions", "render"];

/// Owns the settings file and the in-memory [`Settings`] parsed from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Point the manager at a settings file.
    ///
    /// Nothing is read yet; follow with [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    /// The settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to the in-memory settings.
    ///
    /// Changes stay in memory until [`save`](Self::save) or
    /// [`update_section`](Self::update_section) writes them out.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the settings file, failing if it does not exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Read the settings file, writing defaults first if it is missing.
    ///
    /// An existing file is normalized: unknown sections are scrubbed and
    /// missing keys filled in with defaults, then written back only when
    /// the content actually changed.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            let (settings, needs_rewrite) = Self::normalize(&content)?;
            self.settings = settings;
            if needs_rewrite {
                self.save()?;
            }
        } else {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Create the output and log directories named in the settings.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [&self.settings.paths.output_dir, &self.settings.paths.logs_dir] {
            fs::create_dir_all(Path::new(dir))?;
        }
        Ok(())
    }

    /// The directory run subdirectories are created under.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_dir)
    }

    /// The directory for logs kept outside any single run.
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_dir)
    }

    /// Parse file content and decide whether it needs rewriting.
    ///
    /// A rewrite is needed when the file carries sections we do not know,
    /// or when it differs from what [`save`](Self::save) would emit for the
    /// parsed settings (missing keys, stale comments, reordered tables).
    fn normalize(content: &str) -> ConfigResult<(Settings, bool)> {
        let doc: DocumentMut = content.parse()?;
        let settings: Settings = toml::from_str(content)?;

        let has_unknown = doc
            .iter()
            .any(|(key, _)| !KNOWN_SECTIONS.contains(&key));
        let needs_rewrite = has_unknown || content != Self::annotated_toml(&settings)?;

        Ok((settings, needs_rewrite))
    }

    /// Write the full settings file atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = Self::annotated_toml(&self.settings)?;
        self.write_atomic(&content)?;
        Ok(())
    }

    /// Rewrite a single section of the file, leaving the rest untouched.
    ///
    /// The file is re-read from disk so concurrent edits to other sections
    /// survive; only the named table is replaced before the atomic write.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let on_disk = if self.path.exists() {
            fs::read_to_string(&self.path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if on_disk.is_empty() {
            DocumentMut::new()
        } else {
            on_disk.parse()?
        };

        let section_toml = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            ConfigSection::Timing => toml::to_string_pretty(&self.settings.timing)?,
            ConfigSection::Captions => toml::to_string_pretty(&self.settings.captions)?,
            ConfigSection::Render => toml::to_string_pretty(&self.settings.render)?,
        };
        let section_doc: DocumentMut = section_toml.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.write_atomic(&doc.to_string())?;
        Ok(())
    }

    /// Render the settings as a commented TOML document.
    fn annotated_toml(settings: &Settings) -> ConfigResult<String> {
        let sections: [(&str, &str, String); 5] = [
            (
                "Output and log directories",
                "paths",
                toml::to_string_pretty(&settings.paths)?,
            ),
            (
                "Run log behavior",
                "logging",
                toml::to_string_pretty(&settings.logging)?,
            ),
            (
                "Pacing analysis (scene breaks from narration timing)",
                "timing",
                toml::to_string_pretty(&settings.timing)?,
            ),
            (
                "Caption layout and subtitle styling",
                "captions",
                toml::to_string_pretty(&settings.captions)?,
            ),
            (
                "Render graph (motion, crossfades, encoding)",
                "render",
                toml::to_string_pretty(&settings.render)?,
            ),
        ];

        let mut out = String::from("# StoryReel configuration\n");
        out.push_str("# Generated file; hand edits to known keys survive reloads.\n");
        for (note, name, body) in sections {
            out.push('\n');
            out.push_str(&format!("# {note}\n[{name}]\n{body}"));
        }
        Ok(out)
    }

    /// Write content next to the target and rename it into place.
    fn write_atomic(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gets_created_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("storyreel.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        for section in KNOWN_SECTIONS {
            assert!(content.contains(&format!("[{section}]")), "missing [{section}]");
        }
    }

    #[test]
    fn hand_edited_values_survive_normalization() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("storyreel.toml");
        fs::write(&config_path, "[paths]\noutput_dir = \"archive/reels\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().paths.output_dir, "archive/reels");
        // The rewrite filled in the sections the hand-written file lacked.
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("archive/reels"));
        assert!(content.contains("[render]"));
    }

    #[test]
    fn unknown_sections_are_scrubbed() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("storyreel.toml");
        fs::write(
            &config_path,
            "[paths]\noutput_dir = \"out\"\n\n[obsolete]\nknob = 3\n",
        )
        .unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(!content.contains("[obsolete]"));
        assert_eq!(manager.settings().paths.output_dir, "out");
    }

    #[test]
    fn reload_of_a_generated_file_does_not_rewrite_it() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("storyreel.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        let first = fs::read_to_string(&config_path).unwrap();

        let (_, needs_rewrite) = ConfigManager::normalize(&first).unwrap();
        assert!(!needs_rewrite);
    }

    #[test]
    fn update_section_leaves_other_sections_alone() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("storyreel.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        manager.settings_mut().timing.silence_gap_ms = 900;
        manager.update_section(ConfigSection::Timing).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("silence_gap_ms = 900"));
        assert!(content.contains("[paths]"));
        assert!(content.contains("[captions]"));
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("storyreel.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(!config_path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_errors_on_missing_file() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("nope.toml"));

        let err = manager.load().unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
