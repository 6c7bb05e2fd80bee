//! Download targets: identifier keys and local storage paths.
//!
//! A [`DownloadKey`] names one logical download. It is derived from the
//! normalized URL alone, or from the URL and an explicit file name, so that the
//! same URL stored under two names yields two keys while identical requests
//! always collapse onto one.
//!
//! # Examples
//!
//! ```rust
//! use convoy::download::PathResolver;
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::new(PathBuf::from("/tmp/downloads"));
//! let target = resolver.resolve("https://x/y/a.zip", None, Some("archives"))?;
//! assert_eq!(target.file_name, "a.zip");
//! assert_eq!(target.local_path, PathBuf::from("/tmp/downloads/archives/a.zip"));
//! assert_eq!(target.key.url(), "https://x/y/a.zip");
//! # Ok::<(), convoy::Error>(())
//! ```

use crate::error::{Error, Result};

use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies one logical download target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadKey {
    url: String,
    file_name: Option<String>,
}

impl DownloadKey {
    /// Key of a download stored under the file name derived from its URL.
    pub fn for_url(url: &str) -> Result<Self> {
        Ok(Self {
            url: parse_url(url)?.into(),
            file_name: None,
        })
    }

    /// Key of a download stored under an explicit file name.
    pub fn named(url: &str, file_name: &str) -> Result<Self> {
        let parsed = parse_url(url)?;
        if file_name.is_empty() {
            return Err(empty_file_name(&parsed));
        }
        Ok(Self {
            url: parsed.into(),
            file_name: Some(String::from(file_name)),
        })
    }

    /// The normalized URL of the download.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The explicit file name, if the key was built with one.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

impl fmt::Display for DownloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file_name {
            Some(name) => write!(f, "{} ({})", self.url, name),
            None => f.write_str(&self.url),
        }
    }
}

/// Everything the registry needs to know about where a download goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Identifier key of the download.
    pub key: DownloadKey,
    /// Parsed URL to fetch.
    pub url: Url,
    /// File name used to save the file on disk.
    pub file_name: String,
    /// Optional sub-directory of the base directory.
    pub directory: Option<String>,
    /// Final location of the file once the transfer completes.
    pub local_path: PathBuf,
}

/// Maps URLs and optional names onto keys and local paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
}

impl PathResolver {
    /// Creates a resolver rooted at `base`.
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// Base storage directory.
    pub fn base_directory(&self) -> &Path {
        &self.base
    }

    /// Resolves the key and local path of a download.
    ///
    /// Without an explicit `file_name`, the last path segment of the URL is
    /// used; an empty or missing segment is an [`Error::InvalidUrl`].
    pub fn resolve(
        &self,
        url: &str,
        file_name: Option<&str>,
        directory: Option<&str>,
    ) -> Result<ResolvedTarget> {
        let parsed = parse_url(url)?;
        let (key, file_name) = match file_name {
            Some("") => return Err(empty_file_name(&parsed)),
            Some(name) => (
                DownloadKey {
                    url: parsed.to_string(),
                    file_name: Some(String::from(name)),
                },
                String::from(name),
            ),
            None => (
                DownloadKey {
                    url: parsed.to_string(),
                    file_name: None,
                },
                file_name_from_url(&parsed)?,
            ),
        };

        Ok(ResolvedTarget {
            local_path: self.local_path_for_file(&file_name, directory),
            key,
            url: parsed,
            file_name,
            directory: directory.map(String::from),
        })
    }

    /// Local path of a file in the base directory or one of its sub-directories.
    pub fn local_path_for_file(&self, file_name: &str, directory: Option<&str>) -> PathBuf {
        match directory {
            Some(directory) => self.base.join(directory).join(file_name),
            None => self.base.join(file_name),
        }
    }

    /// Local path of the file a URL would be stored as, when no name is given.
    pub fn local_path_for_url(&self, url: &str, directory: Option<&str>) -> Result<PathBuf> {
        let parsed = parse_url(url)?;
        let file_name = file_name_from_url(&parsed)?;
        Ok(self.local_path_for_file(&file_name, directory))
    }
}

fn empty_file_name(url: &Url) -> Error {
    Error::InvalidUrl(format!("an empty file name was given for \"{}\"", url))
}

fn parse_url(value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e)))
}

/// Derives a file name from the last path segment of a URL.
pub fn file_name_from_url(url: &Url) -> Result<String> {
    url.path_segments()
        .ok_or_else(|| {
            Error::InvalidUrl(format!("The url \"{}\" does not contain a valid path", url))
        })?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .map(|(key, val)| [key, val].concat())
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::InvalidUrl(format!("The url \"{}\" does not contain a filename", url))
        })
}
