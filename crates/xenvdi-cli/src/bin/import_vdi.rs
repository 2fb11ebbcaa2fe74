//! import-vdi - Import a disk image into a new VDI.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use xenvdi_cli::{init_logging, ConnectionArgs, TransferArgs};
use xenvdi_core::{import_vdi, HttpTransport, ImportRequest, SystemRunner, XenApi};

/// Import a disk image into a VDI.
#[derive(Debug, Parser)]
#[command(name = "import-vdi")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Image file to import.
    #[arg(long)]
    file: PathBuf,

    /// The UUID of the SR where the VDI should be imported.
    #[arg(long)]
    sr: String,

    #[command(flatten)]
    transfer: TransferArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.transfer.verbose);

    let api = XenApi::new(HttpTransport::new(&cli.connection.host)?);
    let request = ImportRequest {
        credentials: cli.connection.credentials(),
        file: cli.file,
        sr_uuid: cli.sr,
        options: cli.transfer.options(),
    };

    let imported = import_vdi(&api, &SystemRunner, &request)?;
    println!("{}", imported.uuid);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 11] = [
        "import-vdi",
        "--host",
        "xen1",
        "--uname",
        "root",
        "--pwd",
        "secret",
        "--file",
        "/tmp/in.raw",
        "--sr",
        "sr-1",
    ];

    #[test]
    fn test_parse_required_flags() {
        let cli = Cli::try_parse_from(REQUIRED).expect("Flags should parse");
        let credentials = cli.connection.credentials();
        assert_eq!(credentials.host, "xen1");
        assert_eq!(credentials.username, "root");
        assert_eq!(credentials.password, "secret");
        assert_eq!(cli.file, PathBuf::from("/tmp/in.raw"));
        assert_eq!(cli.sr, "sr-1");
    }

    #[test]
    fn test_parse_long_verbose_and_qemu_img() {
        let args = REQUIRED
            .iter()
            .copied()
            .chain(["--verbose", "--qemu-img", "/opt/qemu/bin/qemu-img"]);
        let cli = Cli::try_parse_from(args).expect("Flags should parse");
        let options = cli.transfer.options();
        assert!(options.verbose);
        assert_eq!(options.qemu_img, "/opt/qemu/bin/qemu-img");
        assert!(options.cert_dir.is_none());
    }

    #[test]
    fn test_missing_sr_is_usage_error() {
        let err = Cli::try_parse_from(&REQUIRED[..9]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
