use log::LevelFilter;

/// Initializes the logger with the `env_logger` crate.
///
/// `RUST_LOG` takes precedence when set. Otherwise only this crate logs, at
/// `info`, or at `debug` when `verbose` is set. Calling it more than once is
/// harmless.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module(env!("CARGO_CRATE_NAME"), level);
    builder.filter_module("smartmeter_cli", level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}
