//! Cycle configuration for glyphcycle.
//!
//! Locates, loads, and validates the TOML file that declares glyph cycles,
//! and installs the built-in defaults where the user can edit them.
//!
//! ```toml
//! [[cycles]]
//! name = "omicron"
//! glyphs = "oω◦ₒ"
//!
//! [[cycles]]
//! glyphs = ["a", "α"]
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glyphcycle_types::{Cycle, CycleMap, InvalidCycle};
use glyphcycle_utils::{AtomicWriteOptions, atomic_write, atomic_write_new_with_options};
use serde::Deserialize;
use thiserror::Error;

/// The configuration used when no file exists, and the template installed
/// for editing.
pub const DEFAULT_CONFIG: &str = include_str!("../default.toml");

/// Environment variable that overrides the config path.
pub const CONFIG_ENV_VAR: &str = "GLYPHCYCLE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("built-in default config is malformed")]
    Builtin(#[source] toml::de::Error),
    #[error("invalid cycle {cycle}")]
    InvalidCycle {
        cycle: String,
        #[source]
        source: InvalidCycle,
    },
    #[error("failed to write config at {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Write { path, .. } => Some(path),
            ConfigError::Builtin(_) | ConfigError::InvalidCycle { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GlyphCycleConfig {
    #[serde(default)]
    pub cycles: Vec<CycleDeclaration>,
}

/// One `[[cycles]]` entry as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct CycleDeclaration {
    /// Optional label used in diagnostics.
    pub name: Option<String>,
    pub glyphs: GlyphList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GlyphList {
    /// A string split into grapheme clusters.
    Joined(String),
    /// One glyph per element.
    Split(Vec<String>),
}

impl CycleDeclaration {
    /// The declaration's name, or its 1-based position when unnamed.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", index + 1),
        }
    }

    pub fn to_cycle(&self) -> Result<Cycle, InvalidCycle> {
        match &self.glyphs {
            GlyphList::Joined(glyphs) => Cycle::parse(glyphs),
            GlyphList::Split(glyphs) => Cycle::new(glyphs.iter().cloned()),
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file was found; `expected` is where one would have been read.
    Builtin { expected: Option<PathBuf> },
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: GlyphCycleConfig,
    pub source: ConfigSource,
}

impl GlyphCycleConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        toml::from_str(DEFAULT_CONFIG).map_err(ConfigError::Builtin)
    }

    /// Read and parse the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Load from `explicit` if given, otherwise from [`config_path`].
    ///
    /// A missing file is not an error: the built-in defaults are used instead.
    /// A missing `explicit` path is logged as a warning, since the caller
    /// asked for that file by name.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let path = explicit.map(Path::to_path_buf).or_else(config_path);

        let Some(path) = path.clone().filter(|path| path.exists()) else {
            match explicit {
                Some(missing) => tracing::warn!(
                    path = %missing.display(),
                    "Config file not found, using built-in cycles"
                ),
                None => tracing::debug!("No config file found, using built-in cycles"),
            }
            return Ok(LoadedConfig {
                config: Self::builtin()?,
                source: ConfigSource::Builtin { expected: path },
            });
        };

        let config = Self::load_from(&path)?;
        tracing::debug!(
            path = %path.display(),
            cycles = config.cycles.len(),
            "Loaded cycle config"
        );
        Ok(LoadedConfig {
            config,
            source: ConfigSource::File(path),
        })
    }

    /// Validate every declaration, keeping its label.
    ///
    /// Fails on the first invalid declaration.
    pub fn labelled_cycles(&self) -> Result<Vec<(String, Cycle)>, ConfigError> {
        self.cycles
            .iter()
            .enumerate()
            .map(|(index, declaration)| {
                let label = declaration.label(index);
                match declaration.to_cycle() {
                    Ok(cycle) => Ok((label, cycle)),
                    Err(source) => Err(ConfigError::InvalidCycle {
                        cycle: label,
                        source,
                    }),
                }
            })
            .collect()
    }

    /// Validate the declarations and build the lookup tables.
    ///
    /// Glyphs declared in more than one cycle are logged; the later cycle
    /// keeps them.
    pub fn cycle_map(&self) -> Result<CycleMap, ConfigError> {
        let cycles = self.labelled_cycles()?;

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (label, cycle) in &cycles {
            for glyph in cycle.glyphs() {
                if let Some(previous) = owners.insert(glyph.as_str(), label.as_str()) {
                    tracing::warn!(
                        glyph = %glyph,
                        earlier = %previous,
                        later = %label,
                        "Glyph declared in more than one cycle; later cycle wins"
                    );
                }
            }
        }

        Ok(CycleMap::build(cycles.into_iter().map(|(_, cycle)| cycle)))
    }
}

/// Write the built-in config to `path` unless a file is already there.
///
/// Returns `true` if a file was written.
pub fn install_default(path: &Path) -> Result<bool, ConfigError> {
    ensure_parent_dir(path)?;

    let written =
        atomic_write_new_with_options(path, DEFAULT_CONFIG.as_bytes(), AtomicWriteOptions::default());
    match written {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Installed default cycle config");
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(ConfigError::Write {
            path: path.to_path_buf(),
            source: err,
        }),
    }
}

/// Overwrite `path` with the built-in config.
pub fn reset_default(path: &Path) -> Result<(), ConfigError> {
    ensure_parent_dir(path)?;

    atomic_write(path, DEFAULT_CONFIG.as_bytes()).map_err(|err| ConfigError::Write {
        path: path.to_path_buf(),
        source: err,
    })?;
    tracing::info!(path = %path.display(), "Reset cycle config to defaults");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|err| ConfigError::Write {
                path: path.to_path_buf(),
                source: err,
            })
        }
        _ => Ok(()),
    }
}

/// Default location of the user-editable config: `~/.glyphcycle/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".glyphcycle").join("config.toml"))
}
