use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    EnvFilter,
};

/// Crates whose logs are on at `info` even without `RUST_LOG`.
const DEFAULT_DIRECTIVES: [&str; 2] = ["reconciliation_service=info", "session_energy=info"];

fn default_filter() -> EnvFilter {
    DEFAULT_DIRECTIVES
        .into_iter()
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(
                directive
                    .parse::<Directive>()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            )
        })
}

/// Logs go to stderr so the CLI binaries can keep stdout for their output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
