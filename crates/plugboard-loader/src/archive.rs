// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only views over module contents.
//!
//! An archive is either an exploded directory or a packaged bundle
//! (`.tar`, `.tar.gz`, `.tgz`). Entry names are relative, `/`-separated and
//! sorted; directory entries end with `/`. Packaged bundles are read into
//! memory once, so nested bundles can be opened without touching the disk.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use plugboard_core::ArchiveError;
use tracing::debug;

const BUNDLE_SUFFIXES: &[&str] = &[".tar", ".tar.gz", ".tgz"];

/// Whether a file name looks like a packaged bundle.
pub fn is_bundle_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BUNDLE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

fn is_gzip_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".gz") || lower.ends_with(".tgz")
}

#[derive(Debug, Clone)]
enum Contents {
    Exploded,
    Packaged(HashMap<String, Vec<u8>>),
}

/// A module directory, a code location or a nested bundle.
#[derive(Debug, Clone)]
pub struct ModuleArchive {
    path: PathBuf,
    location: String,
    entries: Vec<String>,
    contents: Contents,
}

impl ModuleArchive {
    /// Opens a directory or a bundle file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::Missing {
                path: path.to_path_buf(),
            },
            _ => ArchiveError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if metadata.is_dir() {
            return Self::open_dir(path);
        }

        let name = path.to_string_lossy();
        if !is_bundle_name(&name) {
            return Err(ArchiveError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a recognized bundle"),
            });
        }
        let file = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path.to_path_buf(), path.display().to_string(), file, is_gzip_name(&name))
    }

    fn open_dir(path: &Path) -> Result<Self, ArchiveError> {
        let mut entries = Vec::new();
        walk(path, path, &mut entries).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        entries.sort();
        Ok(Self {
            path: path.to_path_buf(),
            location: path.display().to_string(),
            entries,
            contents: Contents::Exploded,
        })
    }

    fn from_reader<R: Read>(
        path: PathBuf,
        location: String,
        reader: R,
        gzip: bool,
    ) -> Result<Self, ArchiveError> {
        let read = if gzip {
            read_bundle(GzDecoder::new(reader))
        } else {
            read_bundle(reader)
        };
        let (mut entries, data) = read.map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        entries.sort();
        entries.dedup();
        debug!(archive = %location, entries = entries.len(), "read packaged bundle");
        Ok(Self {
            path,
            location,
            entries,
            contents: Contents::Packaged(data),
        })
    }

    /// Filesystem path. For a bundle nested in another bundle this is the
    /// outer bundle's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable location, `outer!/inner.tar` for nested bundles.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_exploded(&self) -> bool {
        matches!(self.contents, Contents::Exploded)
    }

    /// Simple name of the archive (last path segment, without trailing `/`).
    pub fn name(&self) -> &str {
        let trimmed = self.location.trim_end_matches('/');
        trimmed
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(trimmed)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.binary_search_by(|e| e.as_str().cmp(entry)).is_ok()
    }

    /// Reads a file entry.
    pub fn read(&self, entry: &str) -> Result<Vec<u8>, ArchiveError> {
        if entry.ends_with('/') || !self.contains(entry) {
            return Err(ArchiveError::EntryNotFound {
                archive: self.location.clone(),
                entry: entry.to_string(),
            });
        }
        match &self.contents {
            Contents::Exploded => {
                let file = self.path.join(entry);
                fs::read(&file).map_err(|source| ArchiveError::Io { path: file, source })
            }
            Contents::Packaged(data) => {
                data.get(entry)
                    .cloned()
                    .ok_or_else(|| ArchiveError::EntryNotFound {
                        archive: self.location.clone(),
                        entry: entry.to_string(),
                    })
            }
        }
    }

    pub fn read_to_string(&self, entry: &str) -> Result<String, ArchiveError> {
        let bytes = self.read(entry)?;
        String::from_utf8(bytes).map_err(|e| ArchiveError::Io {
            path: self.path.join(entry),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Opens every entry accepted by `filter` as an archive of its own.
    ///
    /// Directory entries become exploded archives (only for exploded
    /// parents); bundle entries are opened as packaged archives. Other
    /// entries are skipped.
    pub fn nested_archives<F>(&self, filter: F) -> Result<Vec<ModuleArchive>, ArchiveError>
    where
        F: Fn(&str) -> bool,
    {
        let mut nested = Vec::new();
        for entry in self.entries.iter().filter(|e| filter(e.as_str())) {
            if entry.ends_with('/') {
                if self.is_exploded() {
                    nested.push(Self::open_dir(&self.path.join(entry.trim_end_matches('/')))?);
                }
            } else if is_bundle_name(entry) {
                nested.push(self.open_bundle_entry(entry)?);
            }
        }
        Ok(nested)
    }

    fn open_bundle_entry(&self, entry: &str) -> Result<ModuleArchive, ArchiveError> {
        match &self.contents {
            Contents::Exploded => Self::open(self.path.join(entry)),
            Contents::Packaged(_) => {
                let bytes = self.read(entry)?;
                Self::from_reader(
                    self.path.clone(),
                    format!("{}!/{entry}", self.location),
                    io::Cursor::new(bytes),
                    is_gzip_name(entry),
                )
            }
        }
    }
}

fn walk(root: &Path, dir: &Path, entries: &mut Vec<String>) -> io::Result<()> {
    for item in fs::read_dir(dir)? {
        let item = item?;
        let path = item.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if item.file_type()?.is_dir() {
            entries.push(format!("{name}/"));
            walk(root, &path, entries)?;
        } else {
            entries.push(name);
        }
    }
    Ok(())
}

type BundleContents = (Vec<String>, HashMap<String, Vec<u8>>);

fn read_bundle<R: Read>(reader: R) -> io::Result<BundleContents> {
    let mut archive = tar::Archive::new(reader);
    let mut entries = Vec::new();
    let mut data = HashMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw = entry.path()?.to_string_lossy().replace('\\', "/");
        let name = raw.trim_start_matches("./").to_string();
        if name.is_empty() {
            continue;
        }
        let kind = entry.header().entry_type();
        if kind.is_dir() {
            let dir = if name.ends_with('/') { name } else { format!("{name}/") };
            entries.push(dir);
        } else if kind.is_file() {
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            add_parent_dirs(&name, &mut entries);
            entries.push(name.clone());
            data.insert(name, buf);
        }
    }
    Ok((entries, data))
}

/// Bundles built without directory headers still expose their directories.
fn add_parent_dirs(name: &str, entries: &mut Vec<String>) {
    let mut end = 0;
    while let Some(pos) = name[end..].find('/') {
        end += pos + 1;
        entries.push(name[..end].to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn bundle_names() {
        assert!(is_bundle_name("alpha.tar"));
        assert!(is_bundle_name("alpha.TAR.GZ"));
        assert!(is_bundle_name("lib/dep.tgz"));
        assert!(!is_bundle_name("alpha.zip"));
        assert!(!is_bundle_name("classes/"));
    }

    #[test]
    fn exploded_entries_are_sorted_and_dirs_marked() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("b/c/x.type"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "hi").unwrap();

        let archive = ModuleArchive::open(dir.path()).unwrap();
        assert!(archive.is_exploded());
        assert_eq!(archive.entries(), &["a.txt", "b/", "b/c/", "b/c/x.type"]);
        assert_eq!(archive.read_to_string("a.txt").unwrap(), "hi");
        assert!(archive.read("b/").is_err());
        assert!(matches!(
            archive.read("missing"),
            Err(ArchiveError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn packaged_bundle_is_read_into_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.tar");
        fs::write(&path, tar_bytes(&[("demo/Greeter.type", "binding = \"g\"")])).unwrap();

        let archive = ModuleArchive::open(&path).unwrap();
        assert!(!archive.is_exploded());
        assert_eq!(archive.name(), "alpha.tar");
        assert_eq!(archive.entries(), &["demo/", "demo/Greeter.type"]);
        assert_eq!(
            archive.read_to_string("demo/Greeter.type").unwrap(),
            "binding = \"g\""
        );
    }

    #[test]
    fn gzip_bundle_and_nested_bundle() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let inner = tar_bytes(&[("x/Y.type", "")]);
        let mut outer = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(inner.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        outer.append_data(&mut header, "lib/inner.tar", inner.as_slice()).unwrap();
        let outer = outer.into_inner().unwrap();

        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&outer).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outer.tgz");
        fs::write(&path, gz.finish().unwrap()).unwrap();

        let archive = ModuleArchive::open(&path).unwrap();
        let nested = archive.nested_archives(|e| e.starts_with("lib/")).unwrap();
        assert_eq!(nested.len(), 1);
        assert!(nested[0].location().ends_with("outer.tgz!/lib/inner.tar"));
        assert!(nested[0].contains("x/Y.type"));
    }

    #[test]
    fn missing_location() {
        assert!(matches!(
            ModuleArchive::open("/no/such/plugboard/dir"),
            Err(ArchiveError::Missing { .. })
        ));
    }
}
