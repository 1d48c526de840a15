use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::ImageFormat;

#[derive(Parser)]
#[command(name = "romgen")]
#[command(about = "Generates control and display ROM images for the 8-bit breadboard computer", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) rom: Rom,

    /// Output file (defaults to the image's usual name)
    #[arg(short, long, global = true)]
    pub(crate) output: Option<PathBuf>,

    /// Output format: "raw" or "hex"
    #[arg(short, long, global = true, default_value = "raw")]
    pub(crate) format: ImageFormat,
}

#[derive(Subcommand, Debug, PartialEq)]
pub(crate) enum Rom {
    /// Control ROM with unconditional jumps only
    Control,
    /// Control ROM with carry/zero conditional jumps
    ControlJump {
        /// Don't print the address trace
        #[arg(long)]
        no_trace: bool,
    },
    /// Seven-segment display ROM
    Display,
}

impl Rom {
    pub(crate) fn default_output(&self, format: ImageFormat) -> PathBuf {
        let stem = match self {
            Rom::Control => "control",
            Rom::ControlJump { .. } => "controlJump",
            Rom::Display => "display",
        };
        let ext = match format {
            ImageFormat::Raw => "bin",
            ImageFormat::Hex => "hex",
        };
        PathBuf::from(format!("{}.{}", stem, ext))
    }
}
