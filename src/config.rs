//! Process configuration: where the store lives and where to listen.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Result;

pub const DEFAULT_PORT: u16 = 3000;

/// Location of the SQLite store, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, gone when the process exits.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

impl StoreLocation {
    /// Parse a connection string.
    ///
    /// Accepts `:memory:`, `sqlite::memory:`, `sqlite://<path>`,
    /// `sqlite:<path>` or a bare path.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            anyhow::bail!("Store connection string is empty");
        }

        let rest = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);

        match rest {
            ":memory:" => Ok(Self::Memory),
            "" => anyhow::bail!("Store connection string has no path: {}", url),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    /// `<platform data dir>/notes.db`.
    pub fn default_file() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "notes-server")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(Self::File(dirs.data_dir().join("notes.db")))
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything `serve` needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store: StoreLocation,
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    /// Build from the raw CLI/env values, falling back to the platform data
    /// directory when no connection string is given.
    pub fn resolve(database: Option<&str>, host: IpAddr, port: u16) -> Result<Self> {
        let store = match database {
            Some(url) => StoreLocation::parse(url)?,
            None => StoreLocation::default_file()?,
        };
        Ok(Self { store, host, port })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
