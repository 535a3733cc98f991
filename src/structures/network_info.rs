//! Network info record carried in the `RESPONSE_DEVICE_AVAILABLE` body
//! (§6.3), and used to answer keep-alive requests.

use std::net::Ipv4Addr;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EthernetParameters {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub status: bool,
}

impl Default for EthernetParameters {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::UNSPECIFIED,
            status: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirelessParameters {
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub status: bool,
    pub ssid: String,
    pub encryption: u8,
    pub signal_quality: u8,
}

impl Default for WirelessParameters {
    fn default() -> Self {
        Self {
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::UNSPECIFIED,
            status: false,
            ssid: String::new(),
            encryption: 0,
            signal_quality: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkInfo {
    pub eth: EthernetParameters,
    pub wlan: WirelessParameters,
    pub server_status: bool,
}

/// Encodes the `RESPONSE_DEVICE_AVAILABLE` (0xB0) body, per §6.3.
pub fn encode(info: &NetworkInfo) -> Vec<u8> {
    let mut message = Vec::new();
    message.push(0x01);
    message.extend_from_slice(&info.eth.ip.octets());
    message.extend_from_slice(&info.eth.netmask.octets());
    message.extend_from_slice(&info.eth.gateway.octets());
    message.push(info.eth.status as u8);
    message.extend_from_slice(&info.wlan.ip.octets());
    message.extend_from_slice(&info.wlan.netmask.octets());
    message.extend_from_slice(&info.wlan.gateway.octets());
    message.push(info.server_status as u8);
    message.push(info.wlan.encryption);
    message.push(info.wlan.signal_quality);
    message.push(info.wlan.status as u8);
    message.extend_from_slice(&[0u8; 4]);
    message.push(info.wlan.ssid.len() as u8);
    message.extend_from_slice(info.wlan.ssid.as_bytes());
    message
}

fn read_ipv4(message: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(message[offset], message[offset + 1], message[offset + 2], message[offset + 3])
}

/// Decodes a `RESPONSE_DEVICE_AVAILABLE` (0xB0) body, the inverse of [`encode`].
pub fn decode(message: &[u8]) -> NetworkInfo {
    let mut offset = 1;
    let eth_ip = read_ipv4(message, offset);
    offset += 4;
    let eth_netmask = read_ipv4(message, offset);
    offset += 4;
    let eth_gateway = read_ipv4(message, offset);
    offset += 4;
    let eth_status = message[offset] != 0;
    offset += 1;

    let wlan_ip = read_ipv4(message, offset);
    offset += 4;
    let wlan_netmask = read_ipv4(message, offset);
    offset += 4;
    let wlan_gateway = read_ipv4(message, offset);
    offset += 4;

    let server_status = message[offset] != 0;
    let wlan_encryption = message[offset + 1];
    let wlan_quality = message[offset + 2];
    let wlan_status = message[offset + 3] != 0;
    offset += 8;

    let ssid_len = message[offset] as usize;
    offset += 1;
    let ssid = String::from_utf8_lossy(&message[offset..offset + ssid_len]).to_string();

    NetworkInfo {
        eth: EthernetParameters { ip: eth_ip, netmask: eth_netmask, gateway: eth_gateway, status: eth_status },
        wlan: WirelessParameters {
            ip: wlan_ip,
            netmask: wlan_netmask,
            gateway: wlan_gateway,
            status: wlan_status,
            ssid,
            encryption: wlan_encryption,
            signal_quality: wlan_quality,
        },
        server_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_default_network_info() {
        let bytes = encode(&NetworkInfo::default());
        assert_eq!(bytes[0], 0x01);
        // ssid length byte is the last non-ssid byte; default ssid is empty.
        assert_eq!(*bytes.last().unwrap(), 0x00);
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let mut info = NetworkInfo::default();
        info.wlan.ssid = "home".to_string();
        info.server_status = true;
        let bytes = encode(&info);
        let decoded = decode(&bytes);
        assert_eq!(decoded.wlan.ssid, "home");
        assert!(decoded.server_status);
    }
}
