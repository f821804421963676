//! Helpers for the accompanying binaries.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::{ffi::OsString, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
pub use clap::{App, Arg};
use indicatif::{ProgressBar, ProgressStyle};
pub use inflector::Inflector;

use crate::profile::CalibrationProfile;

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Multi-letter single-dash spellings, rewritten to their long
/// form before parsing.
const SHORT_ALIASES: [(&str, &str); 1] = [("-sp", "--sensor-parameter")];

/// Rewrite `-sp` (and `-sp=value`) to `--sensor-parameter`, which
/// clap cannot express as a short flag.
pub fn expand_short_aliases<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str().and_then(expand_alias) {
            Some(expanded) => expanded,
            None => arg,
        })
        .collect()
}

fn expand_alias(arg: &str) -> Option<OsString> {
    SHORT_ALIASES.iter().find_map(|&(short, long)| {
        if arg == short {
            Some(long.into())
        } else {
            arg.strip_prefix(short)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| format!("{}={}", long, value).into())
        }
    })
}

/// Log to stderr; `RUST_LOG` overrides the default `warn`.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

/// Progress bar on stderr, or a hidden one when disabled.
pub fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
    );
    bar
}

pub fn read_profile(path: &Path) -> Result<CalibrationProfile> {
    let file = File::open(path)
        .with_context(|| format!("could not open profile {}", path.display()))?;
    CalibrationProfile::from_json_reader(BufReader::new(file))
        .with_context(|| format!("could not parse profile {}", path.display()))
}
