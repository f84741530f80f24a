//! Response payloads of the Alibaba Cloud DNS API
//!
//! Only the fields the updater reads are modeled; everything else in the
//! JSON body is ignored.

use ddns_core::traits::DomainRecord;
use serde::Deserialize;

/// Error body, e.g.
///
/// ```json
/// {"RequestId":"...","Code":"InvalidAccessKeyId.NotFound","Message":"Specified access key is not found."}
/// ```
///
/// A response is an error whenever `Message` is present and non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ApiError {
    /// The error message, when the response is an error
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// `DescribeDomainRecords` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDomainRecordsResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub domain_records: DomainRecords,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainRecords {
    #[serde(rename = "Record", default)]
    pub record: Vec<DomainRecord>,
}

/// `UpdateDomainRecord` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainRecordResponse {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}
