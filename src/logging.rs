//! Logging setup and source-location tags

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug`, else `warn`.
/// Calling this twice is harmless.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .try_init();
}

/// Identifier of the current thread, as it appears in command journals
pub fn thread_label() -> String {
    let current = std::thread::current();
    current
        .name()
        .map_or_else(|| format!("{:?}", current.id()), str::to_string)
}

/// `file:line` of the macro invocation, used to tag journal entries
#[macro_export]
macro_rules! here {
    () => {
        concat!(file!(), ":", line!())
    };
}
