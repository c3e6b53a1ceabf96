/// An inbound notification exactly as received from the gateway.
///
/// The body must not have been consumed or re-encoded upstream: the
/// signature is computed over the values it carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNotification {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawNotification {
    pub fn new(content_type: Option<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type,
            body: body.into(),
        }
    }

    /// A form-encoded notification body.
    pub fn form(body: impl Into<Vec<u8>>) -> Self {
        Self::new(
            Some("application/x-www-form-urlencoded".to_string()),
            body,
        )
    }
}
