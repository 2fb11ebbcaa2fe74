//! Flags and setup shared by the `export-vdi` and `import-vdi` binaries.

use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use xenvdi_core::{Credentials, TransferOptions};

/// How to reach and log in to the pool.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// XenServer host.
    #[arg(long)]
    pub host: String,

    /// Username.
    #[arg(long)]
    pub uname: String,

    /// Password.
    #[arg(long)]
    pub pwd: String,
}

impl ConnectionArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.host, &self.uname, &self.pwd)
    }
}

/// How `qemu-img` should move the data.
#[derive(Debug, Clone, Args)]
pub struct TransferArgs {
    /// Directory with the TLS client certificates to use with NBD.
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Display the NBD messages being sent and received.
    #[arg(short, long)]
    pub verbose: bool,

    /// The qemu-img binary to run.
    #[arg(long, value_name = "PATH", default_value = "qemu-img")]
    pub qemu_img: String,
}

impl TransferArgs {
    pub fn options(&self) -> TransferOptions {
        TransferOptions {
            qemu_img: self.qemu_img.clone(),
            cert_dir: self.cert.clone(),
            verbose: self.verbose,
        }
    }
}

/// Log to stderr, honouring `RUST_LOG` when set.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}
