//! In-memory collaborators for guard tests

#![allow(dead_code)]

use pkgcruft_config::Config;
use pkgcruft_errors::Error;
use pkgcruft_guard::{CruftGuard, FindingSink};
use pkgcruft_platform::{
    LinkerInspector, LinkerOutput, PackageManager, ProcessIntrospector,
};
use pkgcruft_types::{MappingKind, PackageId, ProcessIdentity, Protection, VmMapping};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A whole system: package database, linker and process table
#[derive(Default)]
pub struct FakeSystem {
    pub installed: BTreeMap<PackageId, Vec<PathBuf>>,
    pub remote: Vec<PackageId>,
    /// Answers for `owner_of` beyond the installed inventory
    pub owners: HashMap<PathBuf, PackageId>,
    /// Executable → (soname, resolved path or not found)
    pub deps: HashMap<PathBuf, Vec<(String, Option<PathBuf>)>>,
    pub mappings: Vec<VmMapping>,
    pub identities: Vec<ProcessIdentity>,
    pub names: HashMap<u32, String>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a package, also offered by the repository
    pub fn package(mut self, id: &str, files: &[PathBuf]) -> Self {
        let id = PackageId::new(id);
        self.remote.push(id.clone());
        self.installed.insert(id, files.to_vec());
        self
    }

    /// Install a package the repository no longer offers
    pub fn defunct_package(mut self, id: &str, files: &[PathBuf]) -> Self {
        self.installed.insert(PackageId::new(id), files.to_vec());
        self
    }

    pub fn links(mut self, exe: &Path, soname: &str, resolved: Option<&Path>) -> Self {
        self.deps
            .entry(exe.to_path_buf())
            .or_default()
            .push((soname.to_string(), resolved.map(Path::to_path_buf)));
        self
    }

    /// A process with a deleted executable text mapping
    pub fn stale_process(mut self, pid: u32, name: &str, executable: Option<&Path>) -> Self {
        self.mappings.push(VmMapping {
            pid,
            protection: Protection::parse("r-x"),
            kind: MappingKind::Vnode,
            path: None,
        });
        match executable {
            Some(path) => self.identities.push(ProcessIdentity {
                pid,
                name: name.to_string(),
                executable: Some(path.to_path_buf()),
                osrel: Some("1400097".to_string()),
            }),
            None => {
                self.names.insert(pid, name.to_string());
            }
        }
        self
    }

    pub fn guard(self, prefix: &Path) -> CruftGuard {
        let system = Arc::new(self);
        CruftGuard::builder()
            .with_config(Config {
                prefix: prefix.to_path_buf(),
                concurrency: 4,
                ..Config::default()
            })
            .with_packages(Arc::clone(&system) as Arc<dyn PackageManager>)
            .with_linker(Arc::clone(&system) as Arc<dyn LinkerInspector>)
            .with_processes(system as Arc<dyn ProcessIntrospector>)
            .build()
            .unwrap()
    }
}

impl PackageManager for FakeSystem {
    fn local_packages(&self) -> Result<Vec<PackageId>, Error> {
        Ok(self.installed.keys().cloned().collect())
    }

    fn remote_packages(&self) -> Result<Vec<PackageId>, Error> {
        Ok(self.remote.clone())
    }

    fn package_files(&self, packages: &[PackageId]) -> Result<Vec<(PackageId, PathBuf)>, Error> {
        Ok(packages
            .iter()
            .flat_map(|id| {
                self.installed
                    .get(id)
                    .into_iter()
                    .flatten()
                    .map(move |path| (id.clone(), path.clone()))
            })
            .collect())
    }

    fn owner_of(&self, path: &Path) -> Option<PackageId> {
        self.owners.get(path).cloned()
    }
}

impl LinkerInspector for FakeSystem {
    fn inspect(&self, paths: &[PathBuf]) -> Result<LinkerOutput, Error> {
        let mut output = LinkerOutput::default();
        for path in paths {
            for (soname, resolved) in self.deps.get(path).into_iter().flatten() {
                let resolved = resolved
                    .as_ref()
                    .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
                writeln!(output.stdout, "{}\t{soname}\t{resolved}", path.display())
                    .map_err(|e| Error::internal(e.to_string()))?;
            }
        }
        Ok(output)
    }
}

impl ProcessIntrospector for FakeSystem {
    fn vm_mappings(&self) -> Result<Vec<VmMapping>, Error> {
        Ok(self.mappings.clone())
    }

    fn identities(&self, pids: &[u32]) -> Result<Vec<ProcessIdentity>, Error> {
        Ok(self
            .identities
            .iter()
            .filter(|identity| pids.contains(&identity.pid))
            .cloned()
            .collect())
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        self.names.get(&pid).cloned()
    }
}

/// Create a file (and its parents) with the given mode
pub fn touch(path: &Path, mode: u32) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"\x7fELF").unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    path.to_path_buf()
}

/// Run one check and collect its output lines
pub fn lines(
    guard: &CruftGuard,
    check: fn(&CruftGuard, &mut FindingSink<'_>) -> Result<(), Error>,
) -> Vec<String> {
    let mut out = Vec::new();
    check(guard, &mut |finding| {
        out.push(finding.to_string());
        Ok(())
    })
    .unwrap();
    out
}
