//! Firmware version record for the six modules reported in sensor data
//! (§4.2.3 item 14).

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectedModules {
    pub module_a: Option<String>,
    pub module_b: Option<String>,
    pub module_c: Option<String>,
    pub ecolambda: Option<String>,
    pub ecoster: Option<String>,
    pub panel: Option<String>,
}
