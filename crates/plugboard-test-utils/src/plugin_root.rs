// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk plugin roots for tests.
//!
//! [`ModuleSpec`] describes a module in memory; [`PluginRoot::add`] writes it
//! into a temporary plugin root using the regular layout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use plugboard_core::symbol::symbol_entry_name;
use plugboard_core::{EXTENSION_CONTRACT, TypeDescriptor};
use tempfile::TempDir;

/// Manifest file used by [`ModuleSpec::extension`] and [`ModuleSpec::declare`].
pub const DEFAULT_SERVICES_FILE: &str = "plugboard.spi.Extension";

/// A set of files packed into one bundle (or laid out as `classes/`).
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    file_name: String,
    files: Vec<(String, Vec<u8>)>,
}

impl Bundle {
    /// `file_name` decides the format: `.tar`, `.tar.gz` or `.tgz`.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            files: Vec::new(),
        }
    }

    pub fn define(mut self, symbol: &str, descriptor: &TypeDescriptor) -> Self {
        self.files
            .push((symbol_entry_name(symbol), descriptor.to_toml().into_bytes()));
        self
    }

    pub fn resource(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((name.into(), content.into()));
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Writes the bundle as a tar (gzip-compressed for `.gz`/`.tgz`).
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in &self.files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data.as_slice())?;
        }
        let bytes = builder.into_inner()?;

        let lower = self.file_name.to_ascii_lowercase();
        let bytes = if lower.ends_with(".gz") || lower.ends_with(".tgz") {
            let mut gz = GzEncoder::new(Vec::new(), Compression::fast());
            gz.write_all(&bytes)?;
            gz.finish()?
        } else {
            bytes
        };
        fs::write(path, bytes)
    }

    fn write_exploded(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        for (name, data) in &self.files {
            write_file(&dir.join(name), data)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum BodyLayout {
    Classes,
    Packaged,
    Missing,
}

/// In-memory description of one module directory.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    name: String,
    layout: BodyLayout,
    body: Bundle,
    libs: Vec<Bundle>,
    classloader: Option<String>,
    services: Vec<(String, Vec<String>)>,
    files: Vec<(String, Vec<u8>)>,
}

impl ModuleSpec {
    /// A module whose body is a `classes/` directory.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            body: Bundle::new(format!("{name}.tar")),
            name,
            layout: BodyLayout::Classes,
            libs: Vec::new(),
            classloader: None,
            services: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packs the body into `<name>.tar`, or `<name>.tgz` with `gzip`.
    pub fn packaged(mut self, gzip: bool) -> Self {
        let ext = if gzip { "tgz" } else { "tar" };
        self.body.file_name = format!("{}.{ext}", self.name);
        self.layout = BodyLayout::Packaged;
        self
    }

    /// Leaves the module without a body.
    pub fn without_body(mut self) -> Self {
        self.layout = BodyLayout::Missing;
        self
    }

    /// Adds a type to the body.
    pub fn define(mut self, symbol: &str, descriptor: &TypeDescriptor) -> Self {
        self.body = self.body.define(symbol, descriptor);
        self
    }

    /// Defines an extension type with `binding` and declares it.
    pub fn extension(self, symbol: &str, binding: &str) -> Self {
        self.extension_with(
            symbol,
            TypeDescriptor::implementing(EXTENSION_CONTRACT).with_binding(binding),
        )
    }

    /// Defines and declares an extension type with a custom descriptor.
    pub fn extension_with(self, symbol: &str, descriptor: TypeDescriptor) -> Self {
        self.define(symbol, &descriptor).declare(symbol)
    }

    /// Adds a resource to the body.
    pub fn resource(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.body = self.body.resource(name, content);
        self
    }

    /// Adds a bundle under `lib/`.
    pub fn lib(mut self, bundle: Bundle) -> Self {
        self.libs.push(bundle);
        self
    }

    pub fn classloader(mut self, parent: &[&str], plugin: &[&str]) -> Self {
        self.classloader = Some(format!(
            "classloader.load.parent={}\nclassloader.load.plugin={}\n",
            parent.join(","),
            plugin.join(",")
        ));
        self
    }

    /// Declares `symbol` in `services/plugboard.spi.Extension`.
    pub fn declare(self, symbol: &str) -> Self {
        self.service(DEFAULT_SERVICES_FILE, &[symbol])
    }

    /// Appends names to `services/<file>`.
    pub fn service(mut self, file: &str, names: &[&str]) -> Self {
        let names = names.iter().map(|n| n.to_string());
        match self.services.iter_mut().find(|(f, _)| f == file) {
            Some((_, existing)) => existing.extend(names),
            None => self.services.push((file.to_string(), names.collect())),
        }
        self
    }

    /// Adds `config/<file>`.
    pub fn config(self, file: &str, content: &str) -> Self {
        self.file(&format!("config/{file}"), content)
    }

    /// Adds an arbitrary file relative to the module directory.
    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), content.into()));
        self
    }

    /// Writes the module into `dir` (created if needed).
    pub fn write_to(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)?;
        match self.layout {
            BodyLayout::Classes => self.body.write_exploded(&dir.join("classes"))?,
            BodyLayout::Packaged => self.body.write_to(&dir.join(self.body.file_name()))?,
            BodyLayout::Missing => {}
        }
        if !self.libs.is_empty() {
            fs::create_dir_all(dir.join("lib"))?;
            for lib in &self.libs {
                lib.write_to(&dir.join("lib").join(lib.file_name()))?;
            }
        }
        if let Some(classloader) = &self.classloader {
            write_file(&dir.join("classloader.properties"), classloader.as_bytes())?;
        }
        for (file, names) in &self.services {
            let mut content = names.join("\n");
            content.push('\n');
            write_file(&dir.join("services").join(file), content.as_bytes())?;
        }
        for (path, data) in &self.files {
            write_file(&dir.join(path), data)?;
        }
        Ok(())
    }
}

/// A temporary plugin root, deleted on drop.
#[derive(Debug)]
pub struct PluginRoot {
    dir: TempDir,
}

impl PluginRoot {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `module` as `<root>/<name>/` and returns that directory.
    pub fn add(&self, module: ModuleSpec) -> io::Result<PathBuf> {
        let dir = self.path().join(module.name());
        module.write_to(&dir)?;
        Ok(dir)
    }

    /// Builds a root holding every module in `modules`.
    pub fn with_modules(modules: impl IntoIterator<Item = ModuleSpec>) -> io::Result<Self> {
        let root = Self::new()?;
        for module in modules {
            root.add(module)?;
        }
        Ok(root)
    }
}

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)
}
