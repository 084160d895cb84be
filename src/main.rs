use std::env;
use std::fs;
use std::path::Path;
use std::process::{self, Command};

use anyhow::{Context, bail};
use tracing::{info, warn};

use ogen::generate_assembly;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("ogen");
    eprintln!("usage: {program} <input.hy>");
    process::exit(1);
  }

  if let Err(err) = run(&args[1]) {
    eprintln!("{err:#}");
    process::exit(1);
  }
}

fn run(input: &str) -> anyhow::Result<()> {
  let source =
    fs::read_to_string(input).with_context(|| format!("reading {input}"))?;

  let asm = match generate_assembly(&source) {
    Ok(asm) => asm,
    Err(err) => bail!("{err}"),
  };

  fs::write("out.asm", &asm).context("writing out.asm")?;
  info!(bytes = asm.len(), "wrote out.asm");

  assemble_and_link(Path::new("out.asm"))
}

/// Turn the emitted assembly into an executable when the toolchain is
/// available; otherwise leave the artifact on disk and say so.
fn assemble_and_link(asm_path: &Path) -> anyhow::Result<()> {
  if which::which("nasm").is_err() || which::which("ld").is_err() {
    warn!("nasm/ld not found on PATH, leaving out.asm unassembled");
    return Ok(());
  }

  let status = Command::new("nasm")
    .args(["-felf64", &asm_path.display().to_string()])
    .status()
    .context("running nasm")?;
  if !status.success() {
    bail!("nasm failed");
  }

  let status = Command::new("ld")
    .args(["-o", "out", "out.o"])
    .status()
    .context("running ld")?;
  if !status.success() {
    bail!("ld failed");
  }

  info!("built ./out");
  Ok(())
}
