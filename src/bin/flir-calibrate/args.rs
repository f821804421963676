use anyhow::Result;
use clap::value_t_or_exit;
use std::{
    env,
    path::{Path, PathBuf},
};
use thermal_uq::{
    args_parser,
    cli::{expand_short_aliases, read_profile},
    config::RunConfig,
    opt, Overrides, ParameterId,
};

pub struct Args;

impl Args {
    pub fn from_cmd_line() -> Result<RunConfig> {
        let matches = args_parser!("flir-calibrate")
            .about("FLIR microbolometer array radiometric to temperature conversion.")
            .arg(
                opt!("output")
                    .short("o")
                    .help("Path to output CSV file"),
            )
            .arg(
                opt!("select output")
                    .short("S")
                    .help("Compute 0-indexed output (default: 0)"),
            )
            .arg(
                opt!("multiple executions")
                    .short("M")
                    .help("Number of Monte Carlo executions (default: 1, native mode)"),
            )
            .arg(
                opt!("time")
                    .short("T")
                    .takes_value(false)
                    .help("Time and print the timing of the kernel execution"),
            )
            .arg(
                opt!("benchmarking")
                    .short("b")
                    .takes_value(false)
                    .help("Generate outputs in format for benchmarking"),
            )
            .arg(
                opt!("json")
                    .short("j")
                    .takes_value(false)
                    .help("Print output in JSON format"),
            )
            .arg(
                opt!("sensor parameter")
                    .alias("sp")
                    .allow_hyphen_values(true)
                    .help("Value used to override the default distribution for `counts`"),
            )
            .arg(
                opt!("set")
                    .multiple(true)
                    .number_of_values(1)
                    .help("Override any parameter with a fixed value: `name=value`"),
            )
            .arg(opt!("profile").help("Calibration profile (json); default is FLIR Ax5"))
            .arg(opt!("seed").help("Seed for the random number generator"))
            .arg(
                opt!("particles")
                    .help("Particles per distribution in native mode (default: 4096)"),
            )
            .arg(
                opt!("parallel")
                    .takes_value(false)
                    .help("Spread Monte Carlo executions over all cores"),
            )
            .arg(
                opt!("progress")
                    .takes_value(false)
                    .help("Show a progress bar for Monte Carlo executions"),
            )
            .arg(
                opt!("nominal")
                    .takes_value(false)
                    .help("Evaluate once with every parameter at its midpoint"),
            )
            .get_matches_from(expand_short_aliases(env::args_os()));

        let mut config = RunConfig::default();

        config.output_path = matches.value_of("output").map(PathBuf::from);
        if matches.is_present("select output") {
            config.output_select = value_t_or_exit!(matches, "select output", usize);
        }
        if matches.is_present("multiple executions") {
            config.iterations = value_t_or_exit!(matches, "multiple executions", usize);
        }
        if matches.is_present("particles") {
            config.particles = value_t_or_exit!(matches, "particles", usize);
        }
        config.seed = matches
            .is_present("seed")
            .then(|| value_t_or_exit!(matches.value_of("seed"), u64));

        config.timing = matches.is_present("time");
        config.benchmarking = matches.is_present("benchmarking");
        config.json = matches.is_present("json");
        config.parallel = matches.is_present("parallel");
        config.progress = matches.is_present("progress");
        config.nominal = matches.is_present("nominal");

        if let Some(path) = matches.value_of("profile") {
            config.profile = read_profile(Path::new(path))?;
        }

        let mut overrides = Overrides::new();
        for assignment in matches.values_of("set").into_iter().flatten() {
            overrides.parse_assignment(assignment)?;
        }
        if let Some(counts) = matches.value_of("sensor parameter") {
            overrides.parse_value(ParameterId::Counts, counts)?;
        }
        config.overrides = overrides;

        Ok(config)
    }
}
