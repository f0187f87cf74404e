use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Requests older (or newer) than this many seconds are treated as replays.
const MAX_CLOCK_SKEW_SECS: u64 = 60 * 5;

fn signed_mac(
    signing_secret: &str,
    body: &str,
    timestamp: &str,
) -> Result<HmacSha256, Box<dyn std::error::Error + Send + Sync>> {
    let sig_basestring = format!("v0:{}:{}", timestamp, body);

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())?;
    mac.update(sig_basestring.as_bytes());
    Ok(mac)
}

#[cfg(test)]
pub fn compute_signature(
    signing_secret: &str,
    body: &str,
    timestamp: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let mac = signed_mac(signing_secret, body, timestamp)?;
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

pub fn verify_slack_signature(
    signing_secret: &str,
    body: &str,
    timestamp: &str,
    signature: &str,
    now: u64,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let slack_timestamp: u64 = timestamp.parse()?;
    if now.abs_diff(slack_timestamp) > MAX_CLOCK_SKEW_SECS {
        return Ok(false);
    }

    let provided = match signature.strip_prefix("v0=").map(hex::decode) {
        Some(Ok(bytes)) => bytes,
        _ => return Ok(false),
    };

    // verify_slice compares in constant time
    let mac = signed_mac(signing_secret, body, timestamp)?;
    Ok(mac.verify_slice(&provided).is_ok())
}

pub fn unix_now() -> Result<u64, std::time::SystemTimeError> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs())
}
