pub mod api;
pub mod core;

pub fn init_logging() {
    init_logging_with_level(log::LevelFilter::Info);
}

pub fn init_logging_with_level(level: log::LevelFilter) {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(level)
                .with_tag("loop_point_finder"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        // RUST_LOG 优先于传入的默认级别
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
    }
}
