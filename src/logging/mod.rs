// Tracing setup shared by the gateway and the chat front-end
//
// RUST_LOG wins when set; otherwise the default filter is used, widened to
// debug when `debug` is requested. Output goes to stderr so it never
// interleaves with streamed replies on stdout.

use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is unset
pub const DEFAULT_FILTER: &str = "adversary=info,tower_http=info";

const DEBUG_FILTER: &str = "adversary=debug,tower_http=debug";

/// Filter directives for the given verbosity
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        DEBUG_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init_tracing(debug: bool) {
    // Route `log` records from dependencies into tracing
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
