//! `qemu-img` command construction.
//!
//! The data path never touches this crate: `qemu-img convert` talks NBD
//! directly to the host. These functions only assemble argument vectors,
//! so they can be checked without spawning anything.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::process::{Invocation, ProcessOutput};

/// Port the host's NBD server listens on.
pub const NBD_PORT: u16 = 10809;

/// Id of the TLS credentials object passed with `--object`.
pub const TLS_OBJECT_ID: &str = "tls0";

/// Trace pattern enabling qemu's NBD message tracing.
pub const NBD_TRACE_PATTERN: &str = "nbd*";

/// Settings shared by both transfer directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    /// Conversion tool binary.
    pub qemu_img: String,
    /// Directory holding the client TLS certificates. `None` means plain NBD.
    pub cert_dir: Option<PathBuf>,
    /// Trace the NBD messages exchanged by the conversion tool.
    pub verbose: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            qemu_img: "qemu-img".to_string(),
            cert_dir: None,
            verbose: false,
        }
    }
}

impl TransferOptions {
    pub fn with_cert_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cert_dir = Some(dir.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The `--object` spec registering the client TLS credentials.
    pub fn tls_object(&self) -> Option<String> {
        self.cert_dir.as_ref().map(|dir| {
            format!(
                "tls-creds-x509,id={},endpoint=client,dir={}",
                TLS_OBJECT_ID,
                dir.display()
            )
        })
    }

    /// Program plus the global flags that precede the sub-command.
    fn base_invocation(&self) -> Invocation {
        let invocation = Invocation::new(&self.qemu_img);
        if self.verbose {
            invocation.args(["-T", NBD_TRACE_PATTERN])
        } else {
            invocation
        }
    }

    fn push_tls_object(&self, invocation: Invocation) -> Invocation {
        match self.tls_object() {
            Some(object) => invocation.args(["--object".to_string(), object]),
            None => invocation,
        }
    }
}

/// An NBD export of a VDI, addressed by its UUID and authorized by a
/// session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbdExport<'a> {
    pub host: &'a str,
    pub vdi_uuid: &'a str,
    pub session_id: &'a str,
    pub writable: bool,
    pub tls: bool,
}

impl<'a> NbdExport<'a> {
    /// A read-only export without TLS.
    pub fn new(host: &'a str, vdi_uuid: &'a str, session_id: &'a str) -> Self {
        Self {
            host,
            vdi_uuid,
            session_id,
            writable: false,
            tls: false,
        }
    }

    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }
}

impl fmt::Display for NbdExport<'_> {
    /// Formats as a qemu image-options string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "driver=nbd,host={},port={},export=/{}?session_id={}",
            self.host, NBD_PORT, self.vdi_uuid, self.session_id
        )?;
        if self.writable {
            f.write_str("&rw")?;
        }
        if self.tls {
            write!(f, ",tls-creds={}", TLS_OBJECT_ID)?;
        }
        Ok(())
    }
}

/// `qemu-img convert` reading from an NBD export into a local file.
pub fn export_command(
    options: &TransferOptions,
    host: &str,
    vdi_uuid: &str,
    session_id: &str,
    format: &str,
    output: &Path,
) -> Invocation {
    let device = NbdExport::new(host, vdi_uuid, session_id).tls(options.cert_dir.is_some());

    let invocation = options.base_invocation().arg("convert");
    options
        .push_tls_object(invocation)
        .args(["--image-opts".to_string(), device.to_string()])
        .args(["-O", format])
        .arg(output.display().to_string())
}

/// `qemu-img convert` writing a local file into a writable NBD export.
///
/// `-n` skips target creation; the VDI already exists at the right size.
pub fn import_command(
    options: &TransferOptions,
    host: &str,
    vdi_uuid: &str,
    session_id: &str,
    source: &Path,
) -> Invocation {
    let device = NbdExport::new(host, vdi_uuid, session_id)
        .writable(true)
        .tls(options.cert_dir.is_some());

    let invocation = options
        .base_invocation()
        .args(["convert", "-n"])
        .arg(source.display().to_string());
    options
        .push_tls_object(invocation)
        .args(["--target-image-opts".to_string(), device.to_string()])
}

/// `qemu-img info` with JSON output.
pub fn info_command(options: &TransferOptions, image: &Path) -> Invocation {
    Invocation::new(&options.qemu_img)
        .args(["info", "--output=json"])
        .arg(image.display().to_string())
}

/// The parts of `qemu-img info --output=json` this crate reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageInfo {
    pub virtual_size: u64,
    pub format: Option<String>,
    pub filename: Option<String>,
    pub actual_size: Option<u64>,
}

/// Interpret the result of an [`info_command`] run.
pub fn parse_info(image: &Path, output: &ProcessOutput) -> Result<ImageInfo> {
    if !output.success() {
        return Err(Error::probe(format!(
            "qemu-img info on '{}' failed with {}: {}",
            image.display(),
            output.describe_exit(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        Error::probe(format!(
            "unreadable qemu-img info output for '{}': {}",
            image.display(),
            e
        ))
    })
}
