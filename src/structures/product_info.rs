//! Product info carried in `RESPONSE_UID` (§6.5) and the module-version
//! record shared with `MESSAGE_SENSOR_DATA` item 14 (§4.2.3).

use serde::Serialize;

use crate::structures::uid::unpack_uid;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductInfo {
    pub r#type: u8,
    pub product: u16,
    pub uid: String,
    pub logo: u16,
    pub image: u16,
    pub model: String,
}

/// Decodes a `RESPONSE_UID` body: `type:u8, product:u16, uid_len:u8,
/// uid:[u8;uid_len], logo:u16, image:u16, model_len:u8, model:[u8;model_len]`.
pub fn decode(message: &[u8]) -> ProductInfo {
    let mut offset = 0;
    let r#type = message[offset];
    offset += 1;
    let product = u16::from_le_bytes([message[offset], message[offset + 1]]);
    offset += 2;
    let uid_len = message[offset] as usize;
    offset += 1;
    let uid = unpack_uid(&message[offset..offset + uid_len]);
    offset += uid_len;
    let logo = u16::from_le_bytes([message[offset], message[offset + 1]]);
    offset += 2;
    let image = u16::from_le_bytes([message[offset], message[offset + 1]]);
    offset += 2;
    let model_len = message[offset] as usize;
    offset += 1;
    let model = canonicalize_model(
        &String::from_utf8_lossy(&message[offset..offset + model_len]),
    );

    ProductInfo {
        r#type,
        product,
        uid,
        logo,
        image,
        model,
    }
}

/// Re-spaces known brand prefixes into their canonical display form, per
/// §6.6 (e.g. `EM360P2-ZF` → `ecoMAX 360P2-ZF`, `ecoMAXX800R3` →
/// `ecoMAXX 800R3`). Longer prefixes are matched first so `ecoMAXX` wins
/// over `ecoMAX`.
pub fn canonicalize_model(raw: &str) -> String {
    const BRANDS: [(&str, &str); 3] = [("ecoMAXX", "ecoMAXX"), ("ecoMAX", "ecoMAX"), ("EM", "ecoMAX")];

    for (prefix, canonical) in BRANDS {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return format!("{canonical} {rest}");
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_known_brands() {
        assert_eq!(canonicalize_model("EM360P2-ZF"), "ecoMAX 360P2-ZF");
        assert_eq!(canonicalize_model("ecoMAXX800R3"), "ecoMAXX 800R3");
        assert_eq!(canonicalize_model("ecoMAX860D3-HB"), "ecoMAX 860D3-HB");
    }

    #[test]
    fn leaves_unknown_brands_untouched() {
        assert_eq!(canonicalize_model("unknown123"), "unknown123");
    }
}
