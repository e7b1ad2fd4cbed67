//! In-memory form state for a request being authored or edited.

use std::str::FromStr;

use time::Date;
use validator::{ValidationError, ValidationErrors};

use crate::auth::{is_admin, Claims};
use crate::error::{AppError, Result};
use crate::models::{
    common::{wire_date, DbId},
    request::{AssetRequest, Credential, RequestStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Summary,
    RequesterId,
    AssetId,
    CategoryId,
    SubCategoryId,
    RequestedOn,
    Reason,
    Status,
    Credential,
}

impl DraftField {
    /// Name used in payloads and in field-level errors.
    pub fn wire_name(self) -> &'static str {
        match self {
            DraftField::Summary => "assetRequest",
            DraftField::RequesterId => "userId",
            DraftField::AssetId => "assetId",
            DraftField::CategoryId => "categoryId",
            DraftField::SubCategoryId => "subCategoryId",
            DraftField::RequestedOn => "assetReqDate",
            DraftField::Reason => "assetReqReason",
            DraftField::Status => "requestStatus",
            DraftField::Credential => "password",
        }
    }
}

impl FromStr for DraftField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let field = match s {
            "assetRequest" | "summary" => DraftField::Summary,
            "userId" | "requester" => DraftField::RequesterId,
            "assetId" | "asset" => DraftField::AssetId,
            "categoryId" | "category" => DraftField::CategoryId,
            "subCategoryId" | "subcategory" => DraftField::SubCategoryId,
            "assetReqDate" | "date" => DraftField::RequestedOn,
            "assetReqReason" | "reason" => DraftField::Reason,
            "requestStatus" | "status" => DraftField::Status,
            "password" => DraftField::Credential,
            _ => return Err(AppError::Internal(anyhow::anyhow!("unknown draft field `{}`", s))),
        };
        Ok(field)
    }
}

/// Draft of an [`AssetRequest`].
///
/// A draft without `request_id` submits as a create, one with an id as an
/// update. Numeric references hold either an integer or nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestDraft {
    request_id: Option<DbId>,
    summary: String,
    requester_id: String,
    asset_id: Option<DbId>,
    category_id: Option<DbId>,
    sub_category_id: Option<DbId>,
    requested_on: Option<Date>,
    reason: String,
    status: RequestStatus,
    credential: Option<Credential>,
    status_editable: bool,
}

impl RequestDraft {
    /// Empty, pending, not yet persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of an existing request, ready for editing. The status field is only
    /// editable when `claims` carry the admin role.
    pub fn edit(existing: &AssetRequest, claims: &Claims) -> Self {
        Self {
            request_id: existing.request_id,
            summary: existing.summary.clone().unwrap_or_default(),
            requester_id: existing.requester_id.clone(),
            asset_id: existing.asset_id,
            category_id: existing.category_id,
            sub_category_id: existing.sub_category_id,
            requested_on: existing.requested_on,
            reason: existing.reason.clone(),
            status: existing.status,
            credential: None,
            status_editable: is_admin(claims),
        }
    }

    pub fn is_new(&self) -> bool {
        self.request_id.is_none()
    }

    pub fn request_id(&self) -> Option<DbId> {
        self.request_id
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }

    pub fn asset_id(&self) -> Option<DbId> {
        self.asset_id
    }

    pub fn category_id(&self) -> Option<DbId> {
        self.category_id
    }

    pub fn sub_category_id(&self) -> Option<DbId> {
        self.sub_category_id
    }

    pub fn requested_on(&self) -> Option<Date> {
        self.requested_on
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn status_editable(&self) -> bool {
        self.status_editable
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    /// Set one field from its form text.
    ///
    /// Numeric references parse to an integer, or to unset when blank.
    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<()> {
        let trimmed = value.trim();
        match field {
            DraftField::Summary => self.summary = value.to_string(),
            DraftField::RequesterId => self.requester_id = trimmed.to_string(),
            DraftField::AssetId => self.asset_id = parse_id(field, trimmed)?,
            DraftField::CategoryId => self.category_id = parse_id(field, trimmed)?,
            DraftField::SubCategoryId => self.sub_category_id = parse_id(field, trimmed)?,
            DraftField::RequestedOn => {
                self.requested_on = if trimmed.is_empty() {
                    None
                } else {
                    Some(wire_date::parse(trimmed).ok_or_else(|| {
                        AppError::field(field.wire_name(), "invalid", "must be a date (YYYY-MM-DD)")
                    })?)
                };
            }
            DraftField::Reason => self.reason = value.to_string(),
            DraftField::Status => {
                let status = trimmed.parse::<RequestStatus>().map_err(|_| {
                    AppError::field(
                        field.wire_name(),
                        "invalid",
                        "must be Pending, Approved or Rejected",
                    )
                })?;
                self.set_status(status)?;
            }
            DraftField::Credential => {
                self.credential = Some(Credential::new(value)).filter(|c| !c.expose().is_empty());
            }
        }
        Ok(())
    }

    pub fn set_asset(&mut self, asset_id: Option<DbId>) {
        self.asset_id = asset_id;
    }

    pub fn set_category(&mut self, category_id: Option<DbId>) {
        self.category_id = category_id;
    }

    pub fn set_sub_category(&mut self, sub_category_id: Option<DbId>) {
        self.sub_category_id = sub_category_id;
    }

    pub fn set_requested_on(&mut self, requested_on: Option<Date>) {
        self.requested_on = requested_on;
    }

    /// Only an admin editing an existing request may change its status.
    pub fn set_status(&mut self, status: RequestStatus) -> Result<()> {
        if status == self.status {
            return Ok(());
        }
        if !self.status_editable || self.is_new() {
            return Err(AppError::AuthorizationDisplay("change request status".into()));
        }
        self.status = status;
        Ok(())
    }

    /// Check every required field.
    ///
    /// The reason is always required. Requester, category and asset are only
    /// required for new drafts.
    pub fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in self.missing_fields() {
            let mut error = ValidationError::new("required");
            error.message = Some(required_message(field).into());
            errors.add(field.wire_name(), error);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// First field `validate` would complain about, in form order.
    pub fn first_missing(&self) -> Option<DraftField> {
        self.missing_fields().into_iter().next()
    }

    fn missing_fields(&self) -> Vec<DraftField> {
        let mut missing = Vec::new();
        if self.reason.trim().is_empty() {
            missing.push(DraftField::Reason);
        }
        if self.is_new() {
            if self.requester_id.is_empty() {
                missing.push(DraftField::RequesterId);
            }
            if self.category_id.is_none() {
                missing.push(DraftField::CategoryId);
            }
            if self.asset_id.is_none() {
                missing.push(DraftField::AssetId);
            }
        }
        missing
    }
}

fn parse_id(field: DraftField, value: &str) -> Result<Option<DbId>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<DbId>()
        .map(Some)
        .map_err(|_| AppError::field(field.wire_name(), "invalid", "must be a whole number"))
}

fn required_message(field: DraftField) -> &'static str {
    match field {
        DraftField::Reason => "Reason for request is required",
        DraftField::RequesterId => "User ID is required",
        DraftField::CategoryId => "Category is required",
        DraftField::AssetId => "Asset is required",
        _ => "is required",
    }
}
