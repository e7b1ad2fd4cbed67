//! Foreign-key resolution.
//!
//! Submission needs every reference to resolve and fails naming the first
//! one that doesn't. Display never fails: unresolved names become `"N/A"`.

use std::collections::HashMap;

use time::OffsetDateTime;
use validator::Validate;

use crate::api::UserDirectory;
use crate::draft::{DraftField, RequestDraft};
use crate::error::{AppError, ReferenceKind, Result};
use crate::models::{
    asset::{Asset, Category, SubCategory},
    common::DbId,
    request::{AssetRequest, EnrichedRequest, RequestStatus, SubmissionPayload, NOT_AVAILABLE},
};

/// Snapshot of the reference tables, keyed by id. Replaced wholesale on
/// refresh, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    assets: HashMap<DbId, Asset>,
    categories: HashMap<DbId, Category>,
    sub_categories: HashMap<DbId, SubCategory>,
}

impl LookupTables {
    pub fn new(
        assets: Vec<Asset>,
        categories: Vec<Category>,
        sub_categories: Vec<SubCategory>,
    ) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.asset_id, a)).collect(),
            categories: categories.into_iter().map(|c| (c.category_id, c)).collect(),
            sub_categories: sub_categories
                .into_iter()
                .map(|s| (s.sub_category_id, s))
                .collect(),
        }
    }

    pub fn asset(&self, id: DbId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn category(&self, id: DbId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn sub_category(&self, id: DbId) -> Option<&SubCategory> {
        self.sub_categories.get(&id)
    }

    /// Assets for the request form, ordered by id.
    pub fn asset_choices(&self) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self.assets.values().collect();
        assets.sort_by_key(|a| a.asset_id);
        assets
    }

    /// Categories for the request form, ordered by id.
    pub fn category_choices(&self) -> Vec<&Category> {
        let mut categories: Vec<&Category> = self.categories.values().collect();
        categories.sort_by_key(|c| c.category_id);
        categories
    }
}

pub fn verify_asset(tables: &LookupTables, asset_id: Option<DbId>) -> Result<&Asset> {
    asset_id
        .and_then(|id| tables.asset(id))
        .ok_or_else(|| {
            tracing::warn!("Asset {:?} not found", asset_id);
            AppError::reference(ReferenceKind::Asset)
        })
}

pub fn verify_category(tables: &LookupTables, category_id: Option<DbId>) -> Result<&Category> {
    category_id
        .and_then(|id| tables.category(id))
        .ok_or_else(|| {
            tracing::warn!("Category {:?} not found", category_id);
            AppError::reference(ReferenceKind::Category)
        })
}

/// A chosen sub-category must belong to `category_id`.
///
/// An id missing from the snapshot is only rejected when the snapshot has
/// sub-categories at all; the directory may answer an unfiltered listing
/// with nothing.
pub fn verify_sub_category(
    tables: &LookupTables,
    sub_category_id: Option<DbId>,
    category_id: DbId,
) -> Result<Option<DbId>> {
    let Some(id) = sub_category_id else {
        return Ok(None);
    };
    let field = DraftField::SubCategoryId.wire_name();

    match tables.sub_category(id) {
        Some(sub) if sub.category_id.is_some_and(|owner| owner != category_id) => {
            tracing::warn!("Sub-category {} is not in category {}", id, category_id);
            Err(AppError::field(
                field,
                "mismatch",
                "sub-category does not belong to this category",
            ))
        }
        Some(_) => Ok(Some(id)),
        None if tables.sub_categories.is_empty() => Ok(Some(id)),
        None => {
            tracing::warn!("Sub-category {} not found", id);
            Err(AppError::field(field, "unknown", "unknown sub-category"))
        }
    }
}

/// `Ok(None)` from the directory is a terminal error here.
pub async fn resolve_user_name(users: &dyn UserDirectory, requester_id: &str) -> Result<String> {
    match users.resolve_user_name(requester_id).await? {
        Some(name) => Ok(name),
        None => {
            tracing::warn!("User {:?} not found", requester_id);
            Err(AppError::reference(ReferenceKind::User))
        }
    }
}

/// Build the create/update body for `draft`.
///
/// Local references are checked before the user directory is consulted, so a
/// bad asset, category or sub-category never costs a network call. `existing` is the
/// record being updated; its values fill in anything the draft left blank.
pub async fn resolve_for_submit(
    draft: &RequestDraft,
    tables: &LookupTables,
    users: &dyn UserDirectory,
    existing: Option<&AssetRequest>,
) -> Result<SubmissionPayload> {
    let asset = verify_asset(tables, draft.asset_id())?;
    let category = verify_category(tables, draft.category_id())?;

    if let Some(owner) = asset.category_id {
        if owner != category.category_id {
            return Err(AppError::field(
                DraftField::CategoryId.wire_name(),
                "mismatch",
                "asset does not belong to this category",
            ));
        }
    }

    let sub_category_id =
        verify_sub_category(tables, draft.sub_category_id(), category.category_id)?;

    let requester_id = Some(draft.requester_id())
        .filter(|id| !id.is_empty())
        .or_else(|| existing.map(|e| e.requester_id.as_str()))
        .unwrap_or_default()
        .to_string();
    let user_name = resolve_user_name(users, &requester_id).await?;

    let reason = fallback(draft.reason(), existing.map(|e| e.reason.as_str()));
    let summary = fallback(draft.summary(), existing.and_then(|e| e.summary.as_deref()));

    let payload = SubmissionPayload {
        request_id: draft.request_id(),
        summary: Some(summary).filter(|s| !s.is_empty()),
        requester_id,
        user_name,
        asset_id: asset.asset_id,
        asset_name: asset.name.clone(),
        category_id: category.category_id,
        category_name: category.name.clone(),
        sub_category_id,
        requested_on: draft
            .requested_on()
            .or_else(|| existing.and_then(|e| e.requested_on))
            .or_else(|| Some(OffsetDateTime::now_utc().date())),
        reason,
        status: if draft.is_new() {
            RequestStatus::Pending
        } else {
            draft.status()
        },
        credential: if draft.is_new() {
            None
        } else {
            draft.credential().cloned()
        },
    };

    payload.validate()?;
    Ok(payload)
}

fn fallback(value: &str, existing: Option<&str>) -> String {
    if value.trim().is_empty() {
        existing.unwrap_or_default().to_string()
    } else {
        value.to_string()
    }
}

/// Display projection of `request`. Total: never fails, never leaves a name
/// empty.
///
/// Names come from the lookup tables first, then from whatever the store
/// already put on the record, then `"N/A"`.
pub fn resolve_for_display(request: &AssetRequest, tables: &LookupTables) -> EnrichedRequest {
    let asset_name = request
        .asset_id
        .and_then(|id| tables.asset(id))
        .map(|a| a.name.as_str());
    let category_name = request
        .category_id
        .and_then(|id| tables.category(id))
        .map(|c| c.name.as_str());
    let sub_category_name = request
        .sub_category_id
        .and_then(|id| tables.sub_category(id))
        .map(|s| s.name.as_str());

    EnrichedRequest {
        request_id: request.request_id,
        requester_id: request.requester_id.clone(),
        asset_id: request.asset_id,
        asset_name: display_name(asset_name, request.asset_name.as_deref()),
        category_id: request.category_id,
        category_name: display_name(category_name, request.category_name.as_deref()),
        sub_category_name: display_name(sub_category_name, request.sub_category_name.as_deref()),
        reason: request.reason.clone(),
        requested_on: request.requested_on,
        status: request.status,
    }
}

fn display_name(looked_up: Option<&str>, carried: Option<&str>) -> String {
    [looked_up, carried]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}
