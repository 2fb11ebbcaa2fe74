//! export-vdi - Download a VDI as a disk image.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use xenvdi_cli::{init_logging, ConnectionArgs, TransferArgs};
use xenvdi_core::{export_vdi, ExportRequest, HttpTransport, SystemRunner, XenApi};

/// Download a VDI as a disk image.
#[derive(Debug, Parser)]
#[command(name = "export-vdi")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// VDI UUID.
    #[arg(long)]
    vdi: String,

    /// Output format (e.g. raw, qcow2, vhdx).
    #[arg(long)]
    format: String,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    transfer: TransferArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.transfer.verbose);

    let api = XenApi::new(HttpTransport::new(&cli.connection.host)?);
    let request = ExportRequest {
        credentials: cli.connection.credentials(),
        vdi_uuid: cli.vdi,
        format: cli.format,
        output: cli.out,
        options: cli.transfer.options(),
    };

    export_vdi(&api, &SystemRunner, &request)?;
    println!("{}", result_line(&request));

    Ok(())
}

/// The single line written to stdout on success: the output path.
fn result_line(request: &ExportRequest) -> String {
    request.output.display().to_string()
}
