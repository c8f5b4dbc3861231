//! VoIP endpoint heuristics
//!
//! A newly attached audio route can indicate a softphone or SIP call that
//! never surfaces through the telephony subsystem. The match is deliberately
//! permissive: a false positive only pauses the recording, which is the
//! safer failure direction.

use super::{AudioDevice, AudioPortType};

/// Port types historically associated with VoIP hardware
const VOIP_PORT_TYPES: &[AudioPortType] = &[
    AudioPortType::UsbAudio,
    AudioPortType::BluetoothHfp,
    AudioPortType::BluetoothA2dp,
    AudioPortType::WiredHeadset,
    AudioPortType::LineIn,
];

/// Name fragments associated with softphone and conferencing products
const VOIP_NAME_KEYWORDS: &[&str] = &[
    "sip",
    "voip",
    "softphone",
    "zoom",
    "teams",
    "webex",
    "jabra",
    "plantronics",
    "poly",
    "linphone",
];

/// Decide whether an audio endpoint looks like a VoIP/SIP device.
///
/// Matches on the port-type allow-list or a case-insensitive keyword in the
/// device name; either alone is sufficient. Pure and deterministic.
pub fn is_voip_device(device: &AudioDevice) -> bool {
    if VOIP_PORT_TYPES.contains(&device.port_type) {
        return true;
    }
    let name = device.name.to_lowercase();
    VOIP_NAME_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}
