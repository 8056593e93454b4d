// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synthesis of layout classes for guest subclasses.
//!
//! Given a frozen [`RepresentationSpec`], the [`SubclassFactory`]:
//!
//! 1. picks a unique name from the base class's simple name,
//! 2. assembles a [`ClassBody`] (type field and accessors, optional
//!    dictionary field and accessors, one object field per slot),
//! 3. optionally dumps the body listing to a directory,
//! 4. defines the class through its [`SubclassLoader`], which verifies the
//!    body and attaches a field [`Layout`].
//!
//! Every call synthesizes a new class. Reuse of a class for equal specs is
//! the business of the caller (the type factory keeps that cache).
//!
//! The naming lock covers only the counter update; synthesis and loading
//! run with no lock held.

mod body;
mod instance;
mod loader;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

pub use body::{ClassBody, FieldDef, FieldKind, MethodDef, MethodRole, DICT_FIELD, TYPE_FIELD};
pub use instance::DerivedObject;
pub use loader::{Layout, SubclassLoader};

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::host::HostClass;
use crate::kernel::RepresentationSpec;
use body::SubclassBuilder;

/// Creates host classes matching representation specifications.
pub struct SubclassFactory {
    config: KernelConfig,
    unique: Mutex<HashMap<String, u32>>,
    loader: SubclassLoader,
    dump_dir: ArcSwapOption<PathBuf>,
}

impl SubclassFactory {
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        log::info!("Subclass factory created for {}", config.subclass_package);
        let dump_dir = ArcSwapOption::from(config.dump_dir.clone().map(Arc::new));
        Ok(Self {
            config,
            unique: Mutex::new(HashMap::new()),
            loader: SubclassLoader::new(),
            dump_dir,
        })
    }

    /// A name not yet issued for `base`, by this factory.
    pub fn unique_name(&self, base: &str) -> String {
        let n = {
            let mut unique = self.unique.lock();
            let counter = unique.entry(base.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };
        self.config.subclass_name(base, n)
    }

    /// Synthesize and define a class for the frozen `spec`.
    pub fn find_or_create_subclass(&self, spec: &RepresentationSpec) -> Result<HostClass> {
        if !spec.is_frozen() {
            return Err(Error::internal(format!(
                "specification {} reached the subclass factory unfrozen",
                spec.name()
            )));
        }
        let simple = self.unique_name(spec.base().simple_name());
        let name = if self.config.subclass_package.is_empty() {
            simple
        } else {
            format!("{}.{}", self.config.subclass_package, simple)
        };
        log::debug!("Creating class {} for spec {}", name, spec);

        let body = SubclassBuilder::new(name, spec).build();
        if let Some(dir) = self.dump_dir.load_full() {
            dump(&dir, &body)?;
        }
        self.loader.define_class(&body)
    }

    /// Change (or stop) dumping of class bodies.
    pub fn set_dump_dir(&self, dir: Option<PathBuf>) {
        self.dump_dir.store(dir.map(Arc::new));
    }

    pub fn dump_dir(&self) -> Option<PathBuf> {
        self.dump_dir.load_full().map(|d| d.as_ref().clone())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn loader(&self) -> &SubclassLoader {
        &self.loader
    }
}

impl std::fmt::Debug for SubclassFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubclassFactory")
            .field("package", &self.config.subclass_package)
            .field("defined", &self.loader.len())
            .finish()
    }
}

fn dump(dir: &Path, body: &ClassBody) -> Result<()> {
    let path = dir.join(format!("{}.class.txt", body.simple_name()));
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, format!("{}\n", body)))
        .map_err(|e| Error::internal(format!("writing class file {}: {}", path.display(), e)))
}
