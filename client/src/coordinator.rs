//! Asset-request coordinator: draft, submission protocol and list sync.
//!
//! Every submission runs `Idle -> Validating -> Resolving -> Submitting ->
//! Succeeded | Failed`. Only `Submitting` touches the request store, and a
//! success is always followed by a full reload of the request list.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::api::{AssetDirectory, RequestStore, UserDirectory};
use crate::auth::{is_admin, require_admin, Claims};
use crate::draft::{DraftField, RequestDraft};
use crate::error::{AppError, ReferenceKind, Result};
use crate::models::{
    asset::SubCategory,
    common::{DbId, RequestFilter},
    request::{AssetRequest, EnrichedRequest, RequestStatus},
};
use crate::resolve::{resolve_for_display, resolve_for_submit, verify_asset, LookupTables};
use crate::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Resolving,
    Submitting,
    Succeeded,
    Failed,
}

impl SubmissionState {
    /// While true the UI must not offer the submit action.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            SubmissionState::Validating | SubmissionState::Resolving | SubmissionState::Submitting
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Create,
    Update(DbId),
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub kind: SubmitKind,
    /// The record echoed by the store, when it sent one back.
    pub record: Option<AssetRequest>,
    /// False when the follow-up list reload failed; the write itself stands.
    pub list_synced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BulkReviewOutcome {
    pub updated: Vec<DbId>,
    pub failed: Vec<(DbId, String)>,
    pub list_synced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One entry in the action log.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub at: OffsetDateTime,
}

pub struct Coordinator {
    claims: Arc<Claims>,
    store: Arc<dyn RequestStore>,
    directory: Arc<dyn AssetDirectory>,
    users: Arc<dyn UserDirectory>,
    lookups: Arc<LookupTables>,
    requests: Vec<AssetRequest>,
    filter: RequestFilter,
    draft: RequestDraft,
    sub_category_choices: Vec<SubCategory>,
    state: SubmissionState,
    notices: Vec<Notice>,
}

impl Coordinator {
    pub fn new(
        claims: Arc<Claims>,
        store: Arc<dyn RequestStore>,
        directory: Arc<dyn AssetDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            claims,
            store,
            directory,
            users,
            lookups: Arc::new(LookupTables::default()),
            requests: Vec::new(),
            filter: RequestFilter::All,
            draft: RequestDraft::new(),
            sub_category_choices: Vec::new(),
            state: SubmissionState::Idle,
            notices: Vec::new(),
        }
    }

    /// Coordinator backed by the session's HTTP client for all collaborators.
    pub fn from_session(session: &Session) -> Self {
        let api = Arc::new(session.api.clone());
        Self::new(session.claims.clone(), api.clone(), api.clone(), api)
    }

    // -- Read accessors --

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn is_admin(&self) -> bool {
        is_admin(&self.claims)
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_in_flight()
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    pub fn requests(&self) -> &[AssetRequest] {
        &self.requests
    }

    pub fn filter(&self) -> RequestFilter {
        self.filter
    }

    /// Empty when the selected category has no sub-categories.
    pub fn sub_category_choices(&self) -> &[SubCategory] {
        &self.sub_category_choices
    }

    /// Newest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// The list view, recomputed from the current list and lookup snapshot.
    pub fn enriched(&self) -> Vec<EnrichedRequest> {
        self.requests
            .iter()
            .map(|r| resolve_for_display(r, &self.lookups))
            .collect()
    }

    // -- Reference data and list --

    /// Fetch assets, categories and all sub-categories, then swap the
    /// snapshot. The old snapshot stays if any fetch fails.
    pub async fn refresh_lookups(&mut self) -> Result<()> {
        let (assets, categories, sub_categories) = futures::try_join!(
            self.directory.list_assets(),
            self.directory.list_categories(),
            self.directory.list_sub_categories(None),
        )?;

        tracing::info!(
            "Loaded {} assets, {} categories, {} sub-categories",
            assets.len(),
            categories.len(),
            sub_categories.len()
        );
        self.lookups = Arc::new(LookupTables::new(assets, categories, sub_categories));
        Ok(())
    }

    /// Replace the visible list with the store's current contents under the
    /// active filter.
    pub async fn refresh_requests(&mut self) -> Result<()> {
        let requests = self.store.list_filtered(&self.filter).await?;
        tracing::info!("Loaded {} asset requests", requests.len());
        self.requests = requests;
        Ok(())
    }

    pub async fn apply_filter(&mut self, filter: RequestFilter) -> Result<()> {
        if let RequestFilter::DateRange { from, to } = filter {
            if from > to {
                return Err(AppError::field(
                    "startDate",
                    "range",
                    "start date must not be after end date",
                ));
            }
        }
        if let RequestFilter::MonthYear { month, .. } = filter {
            if !(1..=12).contains(&month) {
                return Err(AppError::field("month", "range", "month must be between 1 and 12"));
            }
        }
        self.filter = filter;
        self.refresh_requests().await
    }

    // -- Draft --

    pub fn start_new_draft(&mut self) {
        self.draft = RequestDraft::new();
        self.sub_category_choices.clear();
        self.state = SubmissionState::Idle;
    }

    pub fn start_edit_draft(&mut self, request_id: DbId) -> Result<()> {
        let existing = self
            .find_request(request_id)
            .ok_or_else(|| AppError::reference(ReferenceKind::Request))?;
        self.draft = RequestDraft::edit(existing, &self.claims);
        self.state = SubmissionState::Idle;
        Ok(())
    }

    pub fn set_field(&mut self, field: DraftField, value: &str) -> Result<()> {
        self.draft.set_field(field, value)
    }

    /// Choose a category and load its sub-categories. A sub-category that is
    /// not among the new choices is cleared.
    ///
    /// Nothing changes if the choices cannot be fetched.
    pub async fn select_category(&mut self, category_id: Option<DbId>) -> Result<()> {
        let choices = self.fetch_sub_category_choices(category_id).await?;

        self.draft.set_category(category_id);
        if let Some(current) = self.draft.sub_category_id() {
            if !choices.iter().any(|s| s.sub_category_id == current) {
                self.draft.set_sub_category(None);
            }
        }
        self.sub_category_choices = choices;
        Ok(())
    }

    /// Start a new draft for one asset, prefilled with its category and
    /// sub-category, the signed-in user and today's date.
    pub async fn start_draft_for_asset(&mut self, asset_id: DbId) -> Result<()> {
        let asset = verify_asset(&self.lookups, Some(asset_id))?.clone();
        let choices = self.fetch_sub_category_choices(asset.category_id).await?;

        let mut draft = RequestDraft::new();
        if let Some(user_id) = self.claims.user_id() {
            draft.set_field(DraftField::RequesterId, user_id)?;
        }
        draft.set_asset(Some(asset.asset_id));
        draft.set_category(asset.category_id);
        draft.set_sub_category(
            asset
                .sub_category_id
                .filter(|id| choices.iter().any(|s| s.sub_category_id == *id)),
        );
        draft.set_requested_on(Some(OffsetDateTime::now_utc().date()));

        self.draft = draft;
        self.sub_category_choices = choices;
        self.state = SubmissionState::Idle;
        Ok(())
    }

    async fn fetch_sub_category_choices(
        &self,
        category_id: Option<DbId>,
    ) -> Result<Vec<SubCategory>> {
        match category_id {
            Some(id) => Ok(self.directory.list_sub_categories(Some(id)).await?),
            None => Ok(Vec::new()),
        }
    }

    // -- Submission --

    /// Submit the current draft: create if it has no id, update otherwise.
    ///
    /// On failure the draft is kept for a retry. The transient credential is
    /// cleared either way.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        self.submit_draft(true).await
    }

    /// Approve or reject one request. The draft being edited is left alone.
    pub async fn review(
        &mut self,
        request_id: DbId,
        status: RequestStatus,
    ) -> Result<SubmitOutcome> {
        require_admin(&self.claims, "review asset requests")?;

        let stashed = std::mem::take(&mut self.draft);
        let result = self.review_one(request_id, status, true).await;
        self.draft = stashed;
        result
    }

    /// Apply one status to several requests, one submission at a time, with a
    /// single list reload at the end.
    pub async fn bulk_review(
        &mut self,
        request_ids: &[DbId],
        status: RequestStatus,
    ) -> Result<BulkReviewOutcome> {
        require_admin(&self.claims, "bulk update asset requests")?;

        let stashed = std::mem::take(&mut self.draft);
        let mut outcome = BulkReviewOutcome::default();
        for &id in request_ids {
            match self.review_one(id, status, false).await {
                Ok(_) => outcome.updated.push(id),
                Err(e) => outcome.failed.push((id, e.user_message())),
            }
        }
        self.draft = stashed;

        outcome.list_synced = match self.refresh_requests().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("List reload after bulk review failed: {}", e);
                false
            }
        };
        Ok(outcome)
    }

    async fn review_one(
        &mut self,
        request_id: DbId,
        status: RequestStatus,
        reload: bool,
    ) -> Result<SubmitOutcome> {
        let prepared = self
            .start_edit_draft(request_id)
            .and_then(|()| self.draft.set_status(status));
        if let Err(e) = prepared {
            return Err(self.fail(e));
        }
        self.submit_draft(reload).await
    }

    async fn submit_draft(&mut self, reload: bool) -> Result<SubmitOutcome> {
        let result = self.run_submission().await;
        self.draft.clear_credential();

        let (kind, record) = match result {
            Ok(done) => done,
            Err(e) => return Err(self.fail(e)),
        };

        self.state = SubmissionState::Succeeded;
        let action = match kind {
            SubmitKind::Create => "Created new asset request".to_string(),
            SubmitKind::Update(id) => format!("Updated asset request {}", id),
        };
        tracing::info!("{}", action);

        let list_synced = if reload {
            match self.refresh_requests().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("List reload after submission failed: {}", e);
                    self.notify(
                        NoticeLevel::Success,
                        format!("{} (list refresh failed: {})", action, e.user_message()),
                    );
                    return Ok(self.finish(kind, record, false));
                }
            }
        } else {
            false
        };

        self.notify(NoticeLevel::Success, action);
        Ok(self.finish(kind, record, list_synced))
    }

    /// Record a failed attempt: one error notice, state `Failed`.
    fn fail(&mut self, e: AppError) -> AppError {
        self.state = SubmissionState::Failed;
        match &e {
            AppError::Remote(_) => tracing::error!("Asset request submission failed: {}", e),
            _ => tracing::warn!("Asset request submission rejected: {}", e),
        }
        self.notify(
            NoticeLevel::Error,
            format!("Failed to submit asset request: {}", e.user_message()),
        );
        e
    }

    fn finish(
        &mut self,
        kind: SubmitKind,
        record: Option<AssetRequest>,
        list_synced: bool,
    ) -> SubmitOutcome {
        self.draft = RequestDraft::new();
        self.sub_category_choices.clear();
        SubmitOutcome {
            kind,
            record,
            list_synced,
        }
    }

    async fn run_submission(&mut self) -> Result<(SubmitKind, Option<AssetRequest>)> {
        self.state = SubmissionState::Validating;
        self.draft.validate()?;

        self.state = SubmissionState::Resolving;
        let existing = match self.draft.request_id() {
            Some(id) => Some(
                self.find_request(id)
                    .cloned()
                    .ok_or_else(|| AppError::reference(ReferenceKind::Request))?,
            ),
            None => None,
        };
        let payload = resolve_for_submit(
            &self.draft,
            &self.lookups,
            self.users.as_ref(),
            existing.as_ref(),
        )
        .await?;

        self.state = SubmissionState::Submitting;
        match self.draft.request_id() {
            Some(id) => {
                let record = self.store.update(id, &payload).await?;
                Ok((SubmitKind::Update(id), record))
            }
            None => {
                let record = self.store.create(&payload).await?;
                Ok((SubmitKind::Create, record))
            }
        }
    }

    fn find_request(&self, request_id: DbId) -> Option<&AssetRequest> {
        self.requests
            .iter()
            .find(|r| r.request_id == Some(request_id))
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.insert(
            0,
            Notice {
                message,
                level,
                at: OffsetDateTime::now_utc(),
            },
        );
    }
}
