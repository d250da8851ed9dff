//! `procstat(1)` and `ps(1)` backed process introspection

use pkgcruft_errors::{Error, PlatformError};
use pkgcruft_types::{MappingKind, ProcessIdentity, Protection, VmMapping};
use std::path::PathBuf;
use tracing::debug;

use crate::process::{PlatformCommand, ProcessIntrospector};

const PROCSTAT: &str = "procstat";
const PS: &str = "ps";

/// `PID START END PRT RES PRES REF SHD FLAG TP` precede the path
const VM_FIXED_COLUMNS: usize = 10;
/// `PID COMM OSREL` precede the path
const BINARY_FIXED_COLUMNS: usize = 3;

/// FreeBSD implementation of process introspection
#[derive(Debug, Clone)]
pub struct Procstat {
    procstat: String,
    ps: String,
}

impl Procstat {
    pub fn new() -> Self {
        Self {
            procstat: PROCSTAT.to_string(),
            ps: PS.to_string(),
        }
    }

    fn run(&self, cmd: &PlatformCommand) -> Result<String, Error> {
        let output = cmd.output()?;
        // Processes exiting mid-scan make procstat complain and exit
        // non-zero while still printing everything else
        if !output.success() {
            if output.stdout.is_empty() {
                return Err(output.failure(cmd));
            }
            debug!(command = %cmd.describe(), stderr = %output.stderr_text(), "partial output");
        }
        Ok(output.stdout_text())
    }
}

impl Default for Procstat {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessIntrospector for Procstat {
    fn vm_mappings(&self) -> Result<Vec<VmMapping>, Error> {
        let mut cmd = PlatformCommand::new(&self.procstat);
        cmd.args(["-a", "-v"]);
        let text = self.run(&cmd)?;
        let mappings = parse_vm_mappings(&text);
        if mappings.is_empty() && !text.trim().is_empty() {
            let line = text.lines().next().unwrap_or_default().to_string();
            return Err(PlatformError::InvalidOutput {
                command: cmd.describe(),
                line,
            }
            .into());
        }
        Ok(mappings)
    }

    fn identities(&self, pids: &[u32]) -> Result<Vec<ProcessIdentity>, Error> {
        if pids.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = PlatformCommand::new(&self.procstat);
        cmd.arg("-b").args(pids.iter().map(u32::to_string));
        Ok(parse_identities(&self.run(&cmd)?))
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let mut cmd = PlatformCommand::new(&self.ps);
        cmd.args(["-o", "comm=", "-p"]).arg(pid.to_string());
        let output = cmd.output().ok()?;
        if !output.success() {
            return None;
        }
        let name = output.stdout_text().trim().to_string();
        (!name.is_empty()).then_some(name)
    }
}

/// Split off `count` whitespace-separated fields, returning them and
/// whatever follows (trimmed, possibly empty)
fn split_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();
    while fields.len() < count {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest.trim_end()))
}

fn optional_path(value: &str) -> Option<PathBuf> {
    match value {
        "" | "-" => None,
        path => Some(PathBuf::from(path)),
    }
}

/// Parse `procstat -a -v` output; headers and malformed lines are skipped
pub fn parse_vm_mappings(text: &str) -> Vec<VmMapping> {
    text.lines()
        .filter_map(|line| {
            let (fields, path) = split_fields(line, VM_FIXED_COLUMNS)?;
            let pid = fields[0].parse().ok()?;
            Some(VmMapping {
                pid,
                protection: Protection::parse(fields[3]),
                kind: MappingKind::parse(fields[9]),
                path: optional_path(path),
            })
        })
        .collect()
}

/// Parse `procstat -b` output; headers and malformed lines are skipped
pub fn parse_identities(text: &str) -> Vec<ProcessIdentity> {
    text.lines()
        .filter_map(|line| {
            let (fields, path) = split_fields(line, BINARY_FIXED_COLUMNS)?;
            let pid = fields[0].parse().ok()?;
            Some(ProcessIdentity {
                pid,
                name: fields[1].to_string(),
                executable: optional_path(path),
                osrel: match fields[2] {
                    "-" | "0" => None,
                    osrel => Some(osrel.to_string()),
                },
            })
        })
        .collect()
}
