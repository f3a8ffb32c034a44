use env_logger::{Builder, Env};

/// `RUST_LOG` wins, then `TOUCHCROP_LOG`, then `info`.
pub fn init() {
    let env = Env::default()
        .filter_or("TOUCHCROP_LOG", "info")
        .write_style("TOUCHCROP_LOG_STYLE");
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a second init (tests) is harmless
    let _ = builder.try_init();
}
