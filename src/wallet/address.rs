//! Address validation and EVM-to-bech32 translation.

use bech32::{FromBase32, ToBase32, Variant};

use crate::errors::ActivationError;

/// Translate a raw EVM address (`0x` + 20 hex bytes) into the chain's
/// canonical bech32 encoding under `hrp`.
///
/// This is the only place raw EVM addresses are accepted; everything
/// downstream (balance checks, grant messages, backend calls) operates on
/// the canonical form returned here.
pub fn translate_evm_address(raw: &str, hrp: &str) -> Result<String, ActivationError> {
    let stripped = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| {
            ActivationError::InvalidAddress(format!("missing 0x prefix: {raw}"))
        })?;

    let bytes = hex::decode(stripped)
        .map_err(|e| ActivationError::InvalidAddress(format!("bad hex in {raw}: {e}")))?;

    if bytes.len() != 20 {
        return Err(ActivationError::InvalidAddress(format!(
            "expected 20 address bytes, got {}",
            bytes.len()
        )));
    }

    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| ActivationError::InvalidAddress(format!("bech32 encode failed: {e}")))
}

/// True when `address` decodes as bech32 with the expected prefix and a
/// 20-byte payload.
pub fn is_valid_native_address(address: &str, hrp: &str) -> bool {
    match bech32::decode(address) {
        Ok((decoded_hrp, data, Variant::Bech32)) => {
            decoded_hrp == hrp
                && Vec::<u8>::from_base32(&data)
                    .map(|bytes| bytes.len() == 20)
                    .unwrap_or(false)
        }
        _ => false,
    }
}

/// True when `address` looks like a raw EVM address.
pub fn is_valid_evm_address(address: &str) -> bool {
    let Some(stripped) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return false;
    };
    stripped.len() == 40 && stripped.chars().all(|c| c.is_ascii_hexdigit())
}
