//! Notification signature (`VPSSignature`).
//!
//! The gateway signs a notification with an MD5 digest over a fixed sequence
//! of notification values interleaved with the registration's `VPSTxId`,
//! `SecurityKey` and the lower-cased vendor name.

use subtle::ConstantTimeEq;

use crate::domain::{keys, Fields};

/// One element of the signed sequence.
enum Part {
    VpsTxId,
    VendorName,
    SecurityKey,
    Field(&'static str),
}

const SIGNED_PARTS: &[Part] = &[
    Part::VpsTxId,
    Part::Field("VendorTxCode"),
    Part::Field("Status"),
    Part::Field("TxAuthNo"),
    Part::VendorName,
    Part::Field("AVSCV2"),
    Part::SecurityKey,
    Part::Field("AddressResult"),
    Part::Field("PostCodeResult"),
    Part::Field("CV2Result"),
    Part::Field("GiftAid"),
    Part::Field("3DSecureStatus"),
    Part::Field("CAVV"),
    Part::Field("AddressStatus"),
    Part::Field("PayerStatus"),
    Part::Field("CardType"),
    Part::Field("Last4Digits"),
    Part::Field("DeclineCode"),
    Part::Field("ExpiryDate"),
    Part::Field("FraudResponse"),
    Part::Field("BankAuthCode"),
];

/// Expected upper-case hex signature for `notification`.
pub fn notification_signature(
    vps_tx_id: &str,
    security_key: &str,
    vendor_name: &str,
    notification: &Fields,
) -> String {
    let vendor_name = vendor_name.to_lowercase();
    let mut message = String::new();
    for part in SIGNED_PARTS {
        match part {
            Part::VpsTxId => message.push_str(vps_tx_id),
            Part::VendorName => message.push_str(&vendor_name),
            Part::SecurityKey => message.push_str(security_key),
            Part::Field(key) => message.push_str(notification.get_or_empty(key)),
        }
    }

    hex::encode_upper(md5::compute(message.as_bytes()).0)
}

/// Whether the notification's `VPSSignature` matches.
pub fn verify(
    vps_tx_id: &str,
    security_key: &str,
    vendor_name: &str,
    notification: &Fields,
) -> bool {
    let Some(received) = notification.get(keys::VPS_SIGNATURE) else {
        return false;
    };
    if vps_tx_id.is_empty() || security_key.is_empty() {
        return false;
    }

    let expected = notification_signature(vps_tx_id, security_key, vendor_name, notification);
    let received = received.trim().to_ascii_uppercase();
    received.as_bytes().ct_eq(expected.as_bytes()).into()
}
