use anyhow::{Context, Result};

use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io;
use std::path::Path;

use crate::args::Args;
use crate::config::Settings;
use crate::core::Simulation;
use crate::readwrite::{CsvSnapshotWriter, SnapshotWriter, write_histogram_npy, write_summaries};
use crate::sweep::{ParameterGrid, run_sweep_with_progress};

pub struct Runner {
    args: Args,
    settings: Settings,
}

impl Runner {
    pub fn new(args: Args) -> Result<Runner> {
        Self::setup_logger(&args);
        #[cfg(feature = "parallel")]
        Self::setup_rayon(&args);
        if let Some(n_threads) = Self::ignored_threads(&args) {
            log::warn!("Ignoring --threads {n_threads}, built without the parallel feature.");
            eprintln!("Ignoring --threads {n_threads}, built without the parallel feature.");
        }

        let mut settings = Self::load_settings(&args.settings)?;
        if let Some(seed) = args.seed {
            log::info!("Overriding seed {} with {seed}.", settings.seed);
            settings.seed = seed;
        }
        settings.parameters.validate()?;
        settings.sampling.validate()?;

        Ok(Self { args, settings })
    }

    pub fn start(&mut self) -> Result<()> {
        let outdir = Path::new(self.args.outdir.as_str());
        fs::create_dir_all(outdir)
            .with_context(|| format!("Unable to create output directory {outdir:?}"))?;
        self.settings
            .write_to_file(&outdir.join("settings.yaml").to_string_lossy())?;

        match self.settings.sweep.clone() {
            Some(grid) => self.run_sweep(&grid, outdir),
            None => self.run_single(outdir),
        }
    }

    /// Setup logging level and file
    fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logging::log_to_file(args.log_file.as_str(), log_level).unwrap_or_else(|_| {
            eprintln!("Unable to open log file.");
            std::process::exit(1);
        });
    }

    /// Setup rayon thread pool
    #[cfg(feature = "parallel")]
    fn setup_rayon(args: &Args) {
        if let Some(n_threads) = args.threads {
            println!("Setting number of threads to {n_threads}.");
            rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build_global()
                .unwrap_or_else(|_| {
                    eprintln!("Unable to set number of threads.");
                    std::process::exit(1);
                });
        }
    }

    /// Thread count that this build cannot honour
    fn ignored_threads(args: &Args) -> Option<usize> {
        if cfg!(feature = "parallel") {
            None
        } else {
            args.threads
        }
    }

    /// Load settings from file
    fn load_settings(path: &str) -> Result<Settings> {
        let settings = Settings::read_from_file(path)
            .with_context(|| format!("Unable to load settings from {path}"))?;
        log::info!("Loaded settings\n{}", settings);
        Ok(settings)
    }

    fn progress_bar(&self, length: u64) -> Result<Option<ProgressBar>> {
        if self.args.disable_progress_bar {
            return Ok(None);
        }
        let bar = ProgressBar::new(length);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{bar:40}] {pos:>7}/{len:7} [{elapsed_precise} / {duration_precise}] {msg}",
                )?
                .progress_chars("=> "),
        );
        Ok(Some(bar))
    }

    fn run_single(&self, outdir: &Path) -> Result<()> {
        let parameters = self.settings.parameters.clone();
        let sampling = self.settings.sampling;
        println!(
            "Simulating {} groups up to t={}...",
            parameters.total_groups, parameters.t_max
        );
        let bar = self.progress_bar(sampling.n_samples(parameters.t_max))?;

        let mut simulation =
            Simulation::new(parameters, self.settings.seed)?.with_sampling(sampling)?;
        let mut writer = CsvSnapshotWriter::new(outdir)?;

        for snapshot in simulation.snapshot_stream() {
            let snapshot = snapshot?;
            writer.write(&snapshot)?;

            log::info!(
                r###"
        time={}
        total_population={}
        fraction_programmers={:.4}"###,
                snapshot.time,
                snapshot.total_population,
                snapshot.fraction_programmers
            );
            if let Some(bar) = bar.as_ref() {
                bar.inc(1);
                bar.set_message(format!(
                    "t={} fraction={:.3}",
                    snapshot.time, snapshot.fraction_programmers
                ));
            }
        }
        writer.finish()?;

        log::info!("Storing final histogram...");
        let mut histogram_file = io::BufWriter::new(
            fs::File::create(outdir.join("final_histogram.npy"))
                .context("Unable to create histogram file")?,
        );
        write_histogram_npy(simulation.histogram(), &mut histogram_file)?;

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }
        log::info!(
            "Finished simulation with {} events and {} cost departures.",
            simulation.n_events(),
            simulation.cost_departures()
        );
        Ok(())
    }

    fn run_sweep(&self, grid: &ParameterGrid, outdir: &Path) -> Result<()> {
        let jobs = grid.jobs(&self.settings.parameters);
        println!("Running {} jobs...", jobs.len());
        log::info!("Running sweep over {} jobs.", jobs.len());
        let bar = self.progress_bar(jobs.len() as u64)?;

        let summaries = run_sweep_with_progress(&jobs, self.settings.seed, || {
            if let Some(bar) = bar.as_ref() {
                bar.inc(1);
            }
        })?;

        let summary_file = fs::File::create(outdir.join("summaries.csv"))
            .context("Unable to create summary file")?;
        write_summaries(&summaries, io::BufWriter::new(summary_file))?;

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }
        log::info!("Finished sweep.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn threads_need_parallel_feature() {
        let args = Args::parse_from(["groupdyn", "--settings", "settings.yaml", "--threads", "4"]);
        let expected = if cfg!(feature = "parallel") { None } else { Some(4) };
        assert_eq!(Runner::ignored_threads(&args), expected);

        let args = Args::parse_from(["groupdyn", "--settings", "settings.yaml"]);
        assert_eq!(Runner::ignored_threads(&args), None);
    }
}
