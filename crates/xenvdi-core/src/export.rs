//! Export a VDI to a local image file.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use xenvdi_core::{export_vdi, Credentials, ExportRequest, HttpTransport, SystemRunner, TransferOptions, XenApi};
//!
//! let credentials = Credentials::new("xen1.example.com", "root", "secret");
//! let api = XenApi::new(HttpTransport::new(&credentials.host).unwrap());
//! let request = ExportRequest {
//!     credentials,
//!     vdi_uuid: "3f1c0a4e-0000-0000-0000-000000000000".to_string(),
//!     format: "qcow2".to_string(),
//!     output: PathBuf::from("/tmp/disk.qcow2"),
//!     options: TransferOptions::default(),
//! };
//! export_vdi(&api, &SystemRunner, &request).unwrap();
//! ```

use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::process::ProcessRunner;
use crate::qemu_img::{self, TransferOptions};
use crate::session::{Credentials, Session};
use crate::xenapi::{Transport, XenApi};

/// Everything needed to export one VDI.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub credentials: Credentials,
    pub vdi_uuid: String,
    /// Output image format, e.g. `qcow2` or `raw`.
    pub format: String,
    pub output: PathBuf,
    pub options: TransferOptions,
}

/// Copy a VDI out of the pool into `request.output`.
///
/// The session is logged out on every path once login succeeds.
pub fn export_vdi<T, R>(api: &XenApi<T>, runner: &R, request: &ExportRequest) -> Result<()>
where
    T: Transport,
    R: ProcessRunner + ?Sized,
{
    let credentials = &request.credentials;
    let session = Session::login(api, &credentials.username, &credentials.password)?;

    let command = qemu_img::export_command(
        &request.options,
        &credentials.host,
        &request.vdi_uuid,
        session.id(),
        &request.format,
        &request.output,
    );

    info!(command = %command, "running command");
    let output = runner
        .run(&command)
        .map_err(|e| Error::transfer(format!("could not run '{}': {}", command, e)))?;
    if !output.success() {
        return Err(Error::transfer(format!(
            "exporting VDI {} failed: qemu-img exited with {}",
            request.vdi_uuid,
            output.describe_exit()
        )));
    }

    info!(vdi = %request.vdi_uuid, output = %request.output.display(), "export complete");
    Ok(())
}
