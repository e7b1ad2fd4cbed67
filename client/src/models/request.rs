use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::Date;
use validator::Validate;

use super::common::{null_as_default, string_or_number, wire_date, DbId};

/// Placeholder shown for any reference that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Review state of an asset request. Travels as `0 | 1 | 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Approved),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    /// Accepts the numeric code or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u64>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown status code {}", code));
        }
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown status `{}`", s))
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for RequestStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Self::from_code(code)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {}", code))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Asset request as the store returns it.
///
/// The list endpoint already carries some display names next to the foreign
/// keys, but any of them may be missing; see [`crate::resolve::resolve_for_display`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssetRequest {
    #[serde(rename = "assetReqId", alias = "AssetReqId", default)]
    pub request_id: Option<DbId>,
    #[serde(rename = "userId", alias = "UserId", default, deserialize_with = "string_or_number")]
    pub requester_id: String,
    #[serde(rename = "assetId", alias = "AssetId", default)]
    pub asset_id: Option<DbId>,
    #[serde(rename = "categoryId", alias = "CategoryId", default)]
    pub category_id: Option<DbId>,
    #[serde(rename = "subCategoryId", alias = "SubCategoryId", default)]
    pub sub_category_id: Option<DbId>,
    #[serde(rename = "assetReqDate", alias = "AssetReqDate", default, with = "wire_date")]
    pub requested_on: Option<Date>,
    #[serde(
        rename = "assetReqReason",
        alias = "AssetReqReason",
        default,
        deserialize_with = "null_as_default"
    )]
    pub reason: String,
    #[serde(rename = "assetRequest", alias = "AssetRequest", default)]
    pub summary: Option<String>,
    #[serde(
        rename = "requestStatus",
        alias = "RequestStatus",
        default,
        deserialize_with = "null_as_default"
    )]
    pub status: RequestStatus,
    #[serde(rename = "assetName", alias = "AssetName", default)]
    pub asset_name: Option<String>,
    #[serde(rename = "categoryName", alias = "CategoryName", default)]
    pub category_name: Option<String>,
    #[serde(rename = "subCategoryName", alias = "SubCategoryName", default)]
    pub sub_category_name: Option<String>,
    #[serde(rename = "userName", alias = "UserName", default)]
    pub user_name: Option<String>,
}

/// Display projection of an [`AssetRequest`]. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRequest {
    pub request_id: Option<DbId>,
    pub requester_id: String,
    pub asset_id: Option<DbId>,
    pub asset_name: String,
    pub category_id: Option<DbId>,
    pub category_name: String,
    pub sub_category_name: String,
    pub reason: String,
    #[serde(serialize_with = "wire_date::serialize")]
    pub requested_on: Option<Date>,
    pub status: RequestStatus,
}

/// Secret re-entered by the user when confirming an update. Redacted in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Body of a create or update call.
///
/// The store requires the denormalized names alongside the ids, so every
/// name must be resolved before the payload exists.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct SubmissionPayload {
    #[serde(rename = "assetReqId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<DbId>,
    #[serde(rename = "assetRequest", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "userId")]
    pub requester_id: String,
    #[serde(rename = "userName")]
    #[validate(length(min = 1, message = "user name must not be empty"))]
    pub user_name: String,
    #[serde(rename = "assetId")]
    pub asset_id: DbId,
    #[serde(rename = "assetName")]
    #[validate(length(min = 1, message = "asset name must not be empty"))]
    pub asset_name: String,
    #[serde(rename = "categoryId")]
    pub category_id: DbId,
    #[serde(rename = "categoryName")]
    #[validate(length(min = 1, message = "category name must not be empty"))]
    pub category_name: String,
    #[serde(rename = "subCategoryId", skip_serializing_if = "Option::is_none")]
    pub sub_category_id: Option<DbId>,
    #[serde(rename = "assetReqDate", serialize_with = "wire_date::serialize")]
    pub requested_on: Option<Date>,
    #[serde(rename = "assetReqReason")]
    #[validate(length(min = 1, message = "reason must not be empty"))]
    pub reason: String,
    #[serde(rename = "requestStatus")]
    pub status: RequestStatus,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}
