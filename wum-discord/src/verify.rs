use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Verify an inbound webhook request against the application public key.
///
/// The signed message is the byte-exact concatenation `timestamp || body`.
/// Any malformed hex, wrong-length key or signature, undecodable key, or
/// mismatching signature uniformly yields `false`; callers cannot observe
/// which step failed. This runs before the body is parsed as JSON.
pub fn verify_signature(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> bool {
    let Some(key) = decode_verifying_key(public_key_hex) else {
        return false;
    };
    let Some(signature) = decode_signature(signature_hex) else {
        return false;
    };

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature).is_ok()
}

fn decode_verifying_key(hex: &str) -> Option<VerifyingKey> {
    let bytes = decode_hex(hex)?;
    let bytes: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

fn decode_signature(hex: &str) -> Option<Signature> {
    let bytes = decode_hex(hex)?;
    let bytes: [u8; 64] = bytes.try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}
