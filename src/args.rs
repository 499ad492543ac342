use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = None,
    name = "groupdyn",
)]
pub struct Args {
    /// Path to settings (yaml file).
    #[clap(long)]
    pub settings: String,

    /// Output directory.
    #[clap(long, default_value = "./output")]
    pub outdir: String,

    /// Seed of the random number generator, overrides the settings.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Path to log file.
    #[clap(long, default_value = "groupdyn.log")]
    pub log_file: String,

    /// Increase verbosity of the log file.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Number of threads used for parameter sweeps (requires the `parallel` feature).
    #[clap(long)]
    pub threads: Option<usize>,

    /// Disable the progress bar.
    #[clap(long, default_value_t = false)]
    pub disable_progress_bar: bool,
}
