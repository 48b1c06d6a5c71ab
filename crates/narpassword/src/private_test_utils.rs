use crate::layout::BUFFER_LEN;
use crate::BitBuffer;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes tracing subscriber with EnvFilter for usage in tests. This should be the first call
/// in each test, with the returned value being assigned to a variable to prevent dropping.
/// Output can be configured via RUST_LOG env variable as explained
/// [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/struct.EnvFilter.html)
///
/// ```ignore
/// use narpassword::private_test_utils::init_tracing;
/// fn some_test() {
///     let _guard = init_tracing();
/// }
/// ```
pub fn init_tracing() -> tracing::dispatcher::DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}

/// Buffer of [`BUFFER_LEN`] bytes produced by `next_byte`.
pub fn buffer_from_fn(mut next_byte: impl FnMut() -> u8) -> BitBuffer {
    BitBuffer::new((0..BUFFER_LEN).map(|_| next_byte()).collect())
}

/// Parses a buffer from its hex text form.
pub fn hex_buffer(hex: &str) -> anyhow::Result<BitBuffer> {
    Ok(hex.parse()?)
}
