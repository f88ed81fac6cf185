#![forbid(unsafe_code)]

//! Connection profiles.
//!
//! A profile file is TOML with a `[neo4j]` table:
//!
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//! database = "neo4j"
//! import_folder = "/var/lib/neo4j/import"
//! ```
//!
//! Profiles are looked up either by path or by name under
//! `$HOME/.cypher_tools/<name>.toml`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Directory under `$HOME` holding named profiles.
pub const PROFILE_DIR_NAME: &str = ".cypher_tools";
/// Extension appended to a profile name.
pub const PROFILE_EXTENSION: &str = "toml";

/// Immutable connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Bolt or neo4j URI.
    pub uri: String,
    /// Principal to authenticate as.
    pub user: String,
    /// Credential for `user`.
    pub password: String,
    /// Default database, server default when `None`.
    pub database: Option<String>,
    /// Server-side import directory used for CSV staging.
    pub import_folder: Option<PathBuf>,
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("import_folder", &self.import_folder)
            .finish()
    }
}

impl ConnectionProfile {
    /// Resolves `name` as a file path first, then as a named profile.
    pub fn resolve(name: &str) -> Result<Self, ProfileError> {
        let direct = Path::new(name);
        if direct.is_file() {
            debug!(path = %direct.display(), "loading profile from path");
            return Self::load(direct);
        }
        let dir = profile_dir().ok_or(ProfileError::NoHomeDir)?;
        Self::resolve_in(name, &dir)
    }

    /// Resolves `name` against an explicit profile directory.
    pub fn resolve_in(name: &str, dir: &Path) -> Result<Self, ProfileError> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Self::load(direct);
        }
        let named = named_profile_path(dir, name);
        if named.is_file() {
            debug!(path = %named.display(), profile = name, "loading named profile");
            return Self::load(&named);
        }
        Err(ProfileError::NotFound {
            name: name.to_string(),
        })
    }

    /// Loads a profile file.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = read_file(path)?;
        convert_profile(path, raw.neo4j.unwrap_or_default())
    }
}

/// `$HOME/.cypher_tools`, if a home directory is known.
pub fn profile_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(PROFILE_DIR_NAME))
}

/// Path of named profile `name` inside `dir`.
pub fn named_profile_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{PROFILE_EXTENSION}"))
}

fn read_file(path: &Path) -> Result<RawConfig, ProfileError> {
    let contents = fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ProfileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn convert_profile(path: &Path, raw: RawProfile) -> Result<ConnectionProfile, ProfileError> {
    let missing = |field: &'static str| ProfileError::MissingField {
        path: path.to_path_buf(),
        field,
    };
    let required = |value: Option<String>, field: &'static str| {
        value.filter(|v| !v.trim().is_empty()).ok_or_else(|| missing(field))
    };
    Ok(ConnectionProfile {
        uri: required(raw.uri, "uri")?,
        user: required(raw.user, "user")?,
        password: required(raw.password, "password")?,
        database: raw.database.filter(|d| !d.trim().is_empty()),
        import_folder: raw.import_folder,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    neo4j: Option<RawProfile>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    import_folder: Option<PathBuf>,
}

/// Fields to merge into a profile file. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    /// Full URI; wins over `server`/`port`.
    pub uri: Option<String>,
    /// Host used to build `bolt://server:port` when `uri` is absent.
    pub server: Option<String>,
    /// Port used with `server`, 7687 when absent.
    pub port: Option<u16>,
    /// Principal.
    pub user: Option<String>,
    /// Credential.
    pub password: Option<String>,
    /// Default database.
    pub database: Option<String>,
    /// Server-side import directory.
    pub import_folder: Option<PathBuf>,
}

/// Default bolt port.
pub const DEFAULT_PORT: u16 = 7687;

impl ProfileUpdate {
    fn effective_uri(&self) -> Option<String> {
        self.uri.clone().or_else(|| {
            self.server
                .as_ref()
                .map(|server| format!("bolt://{server}:{}", self.port.unwrap_or(DEFAULT_PORT)))
        })
    }
}

/// Merges `update` into the profile file at `path`, creating it if needed.
pub fn write_profile(path: &Path, update: &ProfileUpdate) -> Result<(), ProfileError> {
    let mut raw = if path.exists() {
        read_file(path)?
    } else {
        RawConfig::default()
    };
    let entry = raw.neo4j.get_or_insert_with(RawProfile::default);
    if let Some(uri) = update.effective_uri() {
        entry.uri = Some(uri);
    }
    if let Some(user) = &update.user {
        entry.user = Some(user.clone());
    }
    if let Some(password) = &update.password {
        entry.password = Some(password.clone());
    }
    if let Some(database) = &update.database {
        entry.database = Some(database.clone());
    }
    if let Some(folder) = &update.import_folder {
        entry.import_folder = Some(folder.clone());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ProfileError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized =
        toml::to_string_pretty(&raw).map_err(|source| ProfileError::Serialize { source })?;
    fs::write(path, serialized).map_err(|source| ProfileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "profile written");
    Ok(())
}

/// Errors raised while resolving or writing a profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Neither a file nor a named profile exists.
    #[error("profile '{name}' not found")]
    NotFound {
        /// Name or path that was looked up.
        name: String,
    },
    /// Required field absent or blank.
    #[error("profile {path} is missing required field '{field}'")]
    MissingField {
        /// Offending file.
        path: PathBuf,
        /// Field name.
        field: &'static str,
    },
    /// File could not be read.
    #[error("failed to read profile {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// File is not valid TOML or has wrongly typed fields.
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// Profile could not be serialized.
    #[error("failed to serialize profile: {source}")]
    Serialize {
        /// Underlying error.
        source: toml::ser::Error,
    },
    /// File could not be written.
    #[error("failed to write profile {path}: {source}")]
    Write {
        /// Offending file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Parent directory could not be created.
    #[error("failed to create profile directory {path}: {source}")]
    CreateDir {
        /// Directory.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// No home directory to look up named profiles in.
    #[error("no home directory found; pass a profile path instead")]
    NoHomeDir,
}
