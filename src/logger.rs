/// Initialises the process-wide logger on stderr.
///
/// Rendered output goes to stdout, so diagnostics never mix with it.
pub fn init_logger(debug: bool) {
    env_logger::Builder::new()
        .filter_level(if debug { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .format_timestamp(if debug { Some(env_logger::TimestampPrecision::Millis) } else { None })
        .init();
}
