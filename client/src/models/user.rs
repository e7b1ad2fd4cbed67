use serde::Deserialize;

use super::common::string_or_number;

/// Subset of the user record needed for name resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "userId", alias = "UserId", default, deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(rename = "userName", alias = "UserName", default)]
    pub user_name: Option<String>,
}

impl UserSummary {
    /// The display name, if the record carries a non-blank one.
    pub fn display_name(self) -> Option<String> {
        self.user_name.filter(|name| !name.trim().is_empty())
    }
}
