//! Import a local image file as a new VDI.
//!
//! The source is probed before any session is opened, so a bad file never
//! touches the pool. Once `VDI.create` succeeds the VDI is kept even if the
//! copy fails; the warning and the returned error name it so it can be
//! cleaned up by hand.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::process::ProcessRunner;
use crate::qemu_img::{self, ImageInfo, TransferOptions};
use crate::session::{Credentials, Session};
use crate::vdi::VdiRecord;
use crate::xenapi::{Transport, XenApi};

/// Everything needed to import one image.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub credentials: Credentials,
    /// Local image to upload.
    pub file: PathBuf,
    /// UUID of the SR receiving the new VDI.
    pub sr_uuid: String,
    pub options: TransferOptions,
}

/// The VDI an import created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedVdi {
    pub vdi_ref: String,
    pub uuid: String,
    pub virtual_size: u64,
}

/// Run `qemu-img info` on `file`.
pub fn probe_image<R>(runner: &R, options: &TransferOptions, file: &Path) -> Result<ImageInfo>
where
    R: ProcessRunner + ?Sized,
{
    let command = qemu_img::info_command(options, file);
    let output = runner
        .capture(&command)
        .map_err(|e| Error::probe(format!("could not run '{}': {}", command, e)))?;
    qemu_img::parse_info(file, &output)
}

/// Create a VDI sized to `request.file` and copy the file into it.
pub fn import_vdi<T, R>(api: &XenApi<T>, runner: &R, request: &ImportRequest) -> Result<ImportedVdi>
where
    T: Transport,
    R: ProcessRunner + ?Sized,
{
    let info = probe_image(runner, &request.options, &request.file)?;

    let credentials = &request.credentials;
    let session = Session::login(api, &credentials.username, &credentials.password)?;

    let sr_ref = api.sr_get_by_uuid(session.id(), &request.sr_uuid)?;
    let record = VdiRecord::new(sr_ref, info.virtual_size);
    let vdi_ref = api.vdi_create(session.id(), &record)?;
    let uuid = api.vdi_get_uuid(session.id(), &vdi_ref)?;
    info!(vdi = %uuid, size = info.virtual_size, "created VDI");

    let command = qemu_img::import_command(
        &request.options,
        &credentials.host,
        &uuid,
        session.id(),
        &request.file,
    );

    info!(command = %command, "running command");
    let outcome = match runner.run(&command) {
        Ok(output) if output.success() => Ok(()),
        Ok(output) => Err(format!("qemu-img exited with {}", output.describe_exit())),
        Err(e) => Err(format!("could not run '{}': {}", command, e)),
    };
    if let Err(reason) = outcome {
        warn!(vdi = %uuid, "transfer failed; the new VDI has been left in place");
        return Err(Error::transfer(format!(
            "importing '{}' into VDI {} failed: {}",
            request.file.display(),
            uuid,
            reason
        )));
    }

    Ok(ImportedVdi {
        vdi_ref,
        uuid,
        virtual_size: info.virtual_size,
    })
}
