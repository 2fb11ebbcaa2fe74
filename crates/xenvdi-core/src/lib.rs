//! xenvdi Core Library
//!
//! Moves virtual disk images into and out of a XenServer pool. The
//! management API (XML-RPC over HTTP) is used only to authenticate and to
//! create VDIs; the bytes themselves are copied by `qemu-img` over NBD,
//! with the session token authorizing the export.
//!
//! # Modules
//!
//! - [`error`] - Error types and Result alias
//! - [`xmlrpc`] - XML-RPC value model and codec
//! - [`xenapi`] - Management API transport and calls
//! - [`session`] - Sessions that log out when dropped
//! - [`vdi`] - VDI records for `VDI.create`
//! - [`qemu_img`] - Conversion tool command construction
//! - [`process`] - External process runner
//! - [`export`] - VDI to local file
//! - [`import`] - Local file to new VDI

pub mod error;
pub mod export;
pub mod import;
pub mod process;
pub mod qemu_img;
pub mod session;
pub mod vdi;
pub mod xenapi;
pub mod xmlrpc;

pub use error::{Error, Result};

pub use export::{export_vdi, ExportRequest};
pub use import::{import_vdi, probe_image, ImportRequest, ImportedVdi};
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use qemu_img::{ImageInfo, NbdExport, TransferOptions, NBD_PORT};
pub use session::{Credentials, Session};
pub use vdi::VdiRecord;
pub use xenapi::{HttpTransport, RpcResult, Transport, XenApi};
pub use xmlrpc::Value;
