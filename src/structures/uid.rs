//! UID encoding for `RESPONSE_UID` (§6.5).
//!
//! Note the two distinct checksums in play (open question #2, §9): this
//! CRC-16/ARC-style checksum with seed `0xA3A3` and polynomial `0xA001` is
//! unrelated to the plain XOR `bcc` used for frame framing. Do not unify.

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNZPQRSTUV";
const CRC_SEED: u16 = 0xA3A3;
const POLYNOMIAL: u16 = 0xA001;

fn crc16(buffer: &[u8]) -> [u8; 2] {
    let mut crc = CRC_SEED;
    for &byte in buffer {
        crc ^= byte as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
        }
    }
    crc.to_le_bytes()
}

/// Encodes `buffer || crc16(buffer)` as a base-32 string using the custom
/// alphabet (`Z` replaces the Latin `O` at position 25), read out MSB-first.
fn base32_encode(buffer: &[u8]) -> String {
    // `buffer` is treated as a little-endian bignum, matching Python's
    // `int.from_bytes(buffer, "little")`; repeatedly peel off the low 5
    // bits and shift right until the whole number is zero.
    let mut digits = buffer.to_vec();
    let mut output = Vec::new();

    while digits.iter().any(|&b| b != 0) {
        let low5 = digits[0] & 0x1F;
        output.push(ALPHABET[low5 as usize]);

        let n = digits.len();
        let mut shifted = vec![0u8; n];
        for i in 0..n {
            let lower = digits[i] >> 5;
            let upper = if i + 1 < n { (digits[i + 1] & 0x1F) << 3 } else { 0 };
            shifted[i] = lower | upper;
        }
        digits = shifted;
    }

    output.reverse();
    String::from_utf8(output).unwrap()
}

/// Decodes a 16-byte UID blob into its base-32 string representation.
pub fn unpack_uid(uid: &[u8]) -> String {
    let checksum = crc16(uid);
    let mut buffer = uid.to_vec();
    buffer.extend_from_slice(&checksum);
    base32_encode(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn reference_vectors() {
        assert_eq!(
            unpack_uid(&from_hex("001600110D383338365539")),
            "D251PAKR3GCPZ1K8G05G0"
        );
        assert_eq!(
            unpack_uid(&from_hex("002500300E191932135831")),
            "CE71HB09J468P1ZZ00980"
        );
    }
}
