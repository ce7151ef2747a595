// libese-rs/libese/src/protocol/checksum.rs

//! Block check character.

/// Compute the Longitudinal Redundancy Check for a T=1 frame.
/// LRC = XOR of every byte from NAD through the last INF byte.
pub fn lrc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}
