mod cli;

use std::io::{self, Write};

use clap::Parser;
use log::info;

use cli::{Cli, Rom};
use display::DISPLAY;
use ucode::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let rom = match &cli.rom {
        Rom::Control => render_plain(&PLAIN_TABLE)?,
        Rom::ControlJump { no_trace } => {
            if !no_trace {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                write_trace(&VARIANTS, &mut out)?;
                out.flush()?;
            }
            render(&VARIANTS)?
        }
        Rom::Display => DISPLAY.clone(),
    };

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.rom.default_output(cli.format));
    rom.save(&path, cli.format)?;
    info!("wrote {} bytes to {} ({})", rom.len(), path.display(), cli.format);

    Ok(())
}
