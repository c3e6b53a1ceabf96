//! Completion redirect built from a configured base URL.

use async_trait::async_trait;
use url::Url;

use crate::domain::{keys, RawNotification, Transaction};
use crate::ports::{CompletionUrlResolver, ResolveError};

/// Sends the payer to `base?VendorTxCode=<code>`.
#[derive(Debug, Clone)]
pub struct TemplateCompletionUrl {
    base: Url,
}

impl TemplateCompletionUrl {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base).map(Self::new)
    }
}

#[async_trait]
impl CompletionUrlResolver for TemplateCompletionUrl {
    async fn resolve(
        &self,
        _raw: &RawNotification,
        transaction: &Transaction,
    ) -> Result<String, ResolveError> {
        let vendor_tx_code = transaction.vendor_tx_code();
        if vendor_tx_code.is_empty() {
            return Err(ResolveError("transaction has no VendorTxCode".to_string()));
        }

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(keys::VENDOR_TX_CODE, vendor_tx_code);
        Ok(url.to_string())
    }
}
