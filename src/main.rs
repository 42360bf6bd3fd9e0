use anyhow::{Context, Result, bail};
use log::{LevelFilter, Log, Metadata, Record};
use mlfq_model::{
    CancelToken, ProcessSpec, Sim, SimConfig, Workload,
    render::{TextRenderer, render_summary},
};
use rand::prelude::*;
use std::{fs, io, path::PathBuf};

struct CliOptions {
    config: Option<PathBuf>,
    random: usize,
    seed: u64,
    quiet: bool,
    json: Option<PathBuf>,
    verbosity: u8,
}

fn parse_cli_options() -> Result<CliOptions> {
    let mut opts = CliOptions {
        config: None,
        random: 6,
        seed: 0,
        quiet: false,
        json: None,
        verbosity: 0,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--random" => {
                let n = args.next().context("--random needs a value")?;
                opts.random = n.parse().with_context(|| format!("bad --random value {n:?}"))?;
            }
            "--seed" => {
                let s = args.next().context("--seed needs a value")?;
                opts.seed = s.parse().with_context(|| format!("bad --seed value {s:?}"))?;
            }
            "--json" => opts.json = Some(args.next().context("--json needs a path")?.into()),
            "--quiet" | "-q" => opts.quiet = true,
            "-v" => opts.verbosity += 1,
            "-vv" => opts.verbosity += 2,
            flag if flag.starts_with('-') => bail!("unknown option {flag}"),
            path => opts.config = Some(path.into()),
        }
    }

    Ok(opts)
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbosity: u8) {
    let from_env = std::env::var("MLFQ_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok());
    let level = from_env.unwrap_or(match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> Result<()> {
    let opts = parse_cli_options()?;
    init_logging(opts.verbosity);

    let sim = match &opts.config {
        Some(path) => {
            let config = SimConfig::load(path)?;
            Sim::from_config(&config).with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            let config = SimConfig::default();
            Sim::new(
                random_workload(opts.random, 1, 12, opts.seed)?,
                config.quanta,
                config.promotion_threshold,
            )?
        }
    };

    let mut renderer = TextRenderer::new(io::stdout().lock());
    if opts.quiet {
        renderer = renderer.gantt_only();
    }
    let report = sim.run(&mut renderer, &CancelToken::new())?;
    renderer.finish().context("writing output")?;

    println!();
    print!("{}", render_summary(&report.summary()));

    if let Some(path) = &opts.json {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}

fn random_workload(count: usize, min_burst: u64, max_burst: u64, seed: u64) -> Result<Workload> {
    let mut rng = StdRng::seed_from_u64(seed);
    let specs = (1..=count as u64).map(|id| ProcessSpec::new(id, rng.random_range(min_burst..=max_burst)));
    Ok(Workload::from_specs(specs)?)
}
