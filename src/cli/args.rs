use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct MainArgs {
    /// The path to the config file for the bench computer
    #[clap(long, short)]
    pub config: PathBuf,

    /// The path to a text file containing console commands to run at startup
    #[clap(long, short)]
    pub script: Option<PathBuf>,
}
