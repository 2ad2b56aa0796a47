use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine, Engine};
use serde::{Deserialize, Deserializer};

/// Deserializes an integer that the feed may encode either as a JSON number
/// or as a decimal string (heights and result codes come in both shapes).
pub(crate) fn string_or_number<'de, D, T>(
    deserializer: D,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + TryFrom<u64>,
    <T as std::str::FromStr>::Err: std::fmt::Display,
    <T as TryFrom<u64>>::Error: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => {
            T::try_from(value).map_err(serde::de::Error::custom)
        }
        Raw::String(value) => value.parse().map_err(serde::de::Error::custom),
    }
}

/// Decodes feed-supplied base64, tolerating missing padding and trailing
/// bits. Returns `None` on garbage rather than failing the whole message.
pub(crate) fn base64_decode(input: &str) -> Option<Vec<u8>> {
    static BASE64: engine::GeneralPurpose = {
        let config = engine::GeneralPurposeConfig::new()
            .with_decode_allow_trailing_bits(true)
            .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent);
        engine::GeneralPurpose::new(&base64::alphabet::STANDARD, config)
    };
    BASE64
        .decode(input)
        .inspect_err(|err| log::warn!("failed to decode base64: {err}"))
        .ok()
}

/// Generates a process-unique id for outgoing JSON-RPC requests.
pub(crate) fn next_request_id() -> u64 {
    static REQUEST_ID: AtomicU64 = AtomicU64::new(1);
    REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}
