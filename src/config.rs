// SPDX-License-Identifier: MIT
//
// Command line and config file.
//
// An optional TOML file supplies defaults; flags given on the command line
// win over it. Example file:
//
//   log_file = "/tmp/tessera.log"
//
//   [render]
//   color_mode = "palette"
//   skip_last_cell = true

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tessera_term::{ColorMode, RenderOptions};

/// Interactive demo of the tessera differential renderer.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render with the 16-color palette instead of 24-bit color
    #[arg(long)]
    pub palette: bool,

    /// Never write the bottom-right cell of the screen
    #[arg(long)]
    pub skip_last_cell: bool,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Settings after merging the file and the flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderOptions,
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load the file named by `args` (if any) and apply the flags on top.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file cannot be loaded.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: &Args) {
        if args.palette {
            self.render.color_mode = ColorMode::Palette;
        }
        if args.skip_last_cell {
            self.render.skip_last_cell = true;
        }
        if let Some(path) = &args.log_file {
            self.log_file = Some(path.clone());
        }
    }
}
