/// Intercept messages using the `log` crate and print them to STDERR. The filter defaults to
/// `info`, but `RUST_LOG` overrides it.
///
/// Safe to call more than once; tests call it from many places.
pub fn setup() {
    use env_logger::{Builder, Env};
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .is_test(cfg!(test))
        .try_init();
}
