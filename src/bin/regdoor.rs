// CLASSIFICATION: COMMUNITY
// Filename: regdoor.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-07-21

//! Demo driver: publishes a file-access register block and plays a peer
//! session against it, the way a remote configuration host would.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use regdoor::{
    EngineConfig, OpKind, OpenMode, RegisterBank, RegisterFile, RegisterLayout, TransferEngine,
};

/// File set registered when no config is given: a volatile upload scratch
/// area, a persistent read-write settings file, and a read-only text log.
const DEMO_CONFIG: &str = r#"{
    "files": [
        { "name": "UploadScratch", "kind": "memory", "capacity": 5242880 },
        { "name": "Settings", "kind": "disk", "path": "regdoor-settings.bin",
          "access": "rw", "binary": true },
        { "name": "DeviceLog", "kind": "disk", "path": "regdoor.log",
          "access": "ro" }
    ]
}"#;

#[derive(Parser)]
#[command(about = "Drive a register-mapped file-transfer engine through a scripted peer session")]
struct Args {
    /// Engine configuration (JSON); a built-in demo file set is used when
    /// omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Payload uploaded to the first file during the session
    #[arg(long, default_value = "regdoor demo payload")]
    payload: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::from_str(DEMO_CONFIG).context("parsing built-in demo config")?,
    };

    let engine = config.build().context("building file set")?;
    let layout = engine.layout();
    for (selector, file) in engine.files().iter().enumerate() {
        info!(
            "selector {selector}: {} ({:?})",
            file.meta().name(),
            file.meta().access()
        );
    }

    let mut bank = RegisterBank::new();
    engine.publish(&mut bank).context("publishing registers")?;
    info!("🔥 file-access register block live at {:#010x}", layout.base());

    let mut regs = RegisterFile::new(bank, engine);
    upload(&mut regs, layout, 0, args.payload.as_bytes())?;
    Ok(())
}

/// Peer-side upload sequence: open, stage, fill the buffer, execute,
/// read back, close.
fn upload(
    regs: &mut RegisterFile<TransferEngine>,
    layout: RegisterLayout,
    selector: u32,
    payload: &[u8],
) -> Result<()> {
    regs.host_write(layout.file_selector(), selector)?;
    regs.host_write(layout.open_mode(), OpenMode::Write as u32)?;

    execute(regs, layout, OpKind::Open)?;
    report(regs, layout, OpKind::Open)?;

    regs.host_write(layout.operation_selector(), OpKind::Write as u32)?;
    regs.host_write(layout.access_offset(), 0)?;
    regs.host_write(layout.access_length(), payload.len() as u32)?;
    regs.host_write_block(layout.access_buffer(), payload)?;
    execute(regs, layout, OpKind::Write)?;
    report(regs, layout, OpKind::Write)?;

    let size = regs.host_read(layout.file_size())?;
    info!("file size after upload: {size} bytes");

    execute(regs, layout, OpKind::Close)?;
    report(regs, layout, OpKind::Close)?;
    Ok(())
}

fn execute(
    regs: &mut RegisterFile<TransferEngine>,
    layout: RegisterLayout,
    op: OpKind,
) -> Result<()> {
    regs.host_write(layout.operation_selector(), op as u32)?;
    regs.host_write(layout.operation_execute(), 1)?;
    Ok(())
}

fn report(
    regs: &mut RegisterFile<TransferEngine>,
    layout: RegisterLayout,
    op: OpKind,
) -> Result<()> {
    let status = regs.host_read(layout.operation_status())?;
    let result = regs.host_read(layout.operation_result())?;
    let verdict = if status == 0 { "ok" } else { "FAILED" };
    info!("{op}: {verdict} (result {result})");
    Ok(())
}
