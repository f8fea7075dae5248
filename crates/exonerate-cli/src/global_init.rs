//! One-time process setup: logging verbosity from `-v`/`-q` flags (spec §6).

use log::LevelFilter;

pub fn global_init(verbosity: i8) {
  let level = match verbosity {
    i8::MIN..=-1 => LevelFilter::Error,
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  env_logger::Builder::new().filter_level(level).format_timestamp(None).init();
}
