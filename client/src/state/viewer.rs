//! Filtered record viewer controller.
//!
//! DESIGN
//! ======
//! `RecordViewer` owns everything the page shows: the active filters, the
//! cached records (authoritative copy for dialogs), the rendered listing and
//! the open dialogs. Loads are split into `begin_load`/`apply_load` so a
//! presentation layer can run fetches concurrently; each ticket carries a
//! sequence number and only the newest one is applied.
//!
//! Edits patch the one affected row in place. An edit that lands while a
//! listing fetch is in flight is re-applied on top of that fetch's page,
//! which may predate the save. Deletes re-load the listing with the current
//! filters instead of patching, so counts and ordering come from the backend.
//! Like edits, deletes are split into `begin_delete`/`finish_delete`.
//!
//! ERROR HANDLING
//! ==============
//! Load failures become an inline banner; edit failures stay inside the edit
//! dialog with the operator's text intact. Every failure is also returned to
//! the caller so it can react, but none of them leaves the viewer unusable.

use records::wire::MutationResponse;
use records::{Filters, Record, summarize};
use tracing::{debug, info, warn};

use super::dialog::{
    DELETE_ALL_FAILED, DELETE_ALL_PROMPT, DELETE_FAILED, DISCARD_PROMPT, EDIT_FAILED, EMPTY_PROCEDURE, EditDialog,
    ViewDialog, delete_prompt,
};
use super::table::Listing;
use crate::net::api::{RecordApi, RecordPage, export_href};
use crate::net::error::ApiError;

#[cfg(test)]
#[path = "viewer_test.rs"]
mod viewer_test;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("erro ao carregar registros: {0}")]
    Api(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("nenhum editor aberto")]
    NoDialog,
    #[error("salvamento já em andamento")]
    InFlight,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("exclusão já em andamento")]
    InFlight,
    #[error("o servidor não emitiu a confirmação de exclusão")]
    MissingConfirmation,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

// =============================================================================
// LOAD TICKETS
// =============================================================================

/// Handle for one listing fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    filters: Filters,
}

impl LoadTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Filters the fetch must use.
    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { rows: usize, skipped: usize },
    /// A newer load was started; this response was discarded.
    Stale,
}

/// Which delete a [`DeleteTicket`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    One(i64),
    All,
}

/// Handle for one confirmed delete; hand it back to `finish_delete` or
/// `abandon_delete`.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct DeleteTicket {
    target: DeleteTarget,
}

impl DeleteTicket {
    #[must_use]
    pub fn target(&self) -> DeleteTarget {
        self.target
    }
}

/// Id, text and summary of a saved edit.
#[derive(Clone, Debug)]
struct ProcedurePatch {
    id: i64,
    text: String,
    summary: String,
}

/// Clears the in-flight flag when dropped, including when the owning
/// future is cancelled mid-request.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn engage(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Id and text of an edit that has been sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSubmission {
    pub id: i64,
    pub text: String,
}

// =============================================================================
// VIEWER
// =============================================================================

pub struct RecordViewer<A> {
    api: A,
    filters: Filters,
    records: Vec<Record>,
    listing: Listing,
    export_href: String,
    latest_seq: u64,
    load_pending: bool,
    /// Edits saved while `load_pending`.
    pending_patches: Vec<ProcedurePatch>,
    skipped: usize,
    view: Option<ViewDialog>,
    edit: Option<EditDialog>,
    deleting: bool,
}

impl<A: RecordApi> RecordViewer<A> {
    #[must_use]
    pub fn new(api: A, filters: Filters) -> Self {
        let export_href = export_href(&filters);
        Self {
            api,
            filters,
            records: Vec::new(),
            listing: Listing::Loading,
            export_href,
            latest_seq: 0,
            load_pending: false,
            pending_patches: Vec::new(),
            skipped: 0,
            view: None,
            edit: None,
            deleting: false,
        }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    #[must_use]
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Export link for the filters of the latest load.
    #[must_use]
    pub fn export_href(&self) -> &str {
        &self.export_href
    }

    /// Shareable page URL carrying the current filters.
    #[must_use]
    pub fn listing_href(&self, page_path: &str) -> String {
        self.filters.apply_to(page_path)
    }

    /// Rows dropped from the latest listing because they did not decode.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn view(&self) -> Option<&ViewDialog> {
        self.view.as_ref()
    }

    #[must_use]
    pub fn edit(&self) -> Option<&EditDialog> {
        self.edit.as_ref()
    }

    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    // -------------------------------------------------------------------------
    // loading
    // -------------------------------------------------------------------------

    /// Start a load: show the loading state, point the export link at the
    /// current filters and supersede any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_seq += 1;
        self.load_pending = true;
        self.listing = Listing::Loading;
        self.export_href = export_href(&self.filters);
        LoadTicket { seq: self.latest_seq, filters: self.filters.clone() }
    }

    /// Apply the response for `ticket`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the fetch failed; the listing then shows
    /// the error banner.
    pub fn apply_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<RecordPage, ApiError>,
    ) -> Result<LoadOutcome, LoadError> {
        if ticket.seq != self.latest_seq {
            debug!(seq = ticket.seq, latest = self.latest_seq, "discarding superseded listing");
            return Ok(LoadOutcome::Stale);
        }
        self.load_pending = false;
        let patches = std::mem::take(&mut self.pending_patches);

        match result {
            Ok(page) => {
                if page.skipped > 0 {
                    warn!(skipped = page.skipped, "listing contained unreadable rows");
                }
                let rows = page.records.len();
                self.skipped = page.skipped;
                self.listing = Listing::from_records(&page.records);
                self.records = page.records;
                for patch in &patches {
                    self.patch_procedure(patch.id, &patch.text, &patch.summary);
                }
                self.reconcile_dialogs();
                Ok(LoadOutcome::Applied { rows, skipped: page.skipped })
            }
            Err(e) => {
                let err = LoadError::from(e);
                warn!(error = %err, "listing failed");
                self.records.clear();
                self.skipped = 0;
                self.listing = Listing::Error(err.to_string());
                self.view = None;
                Err(err)
            }
        }
    }

    /// Fetch and apply the listing for the current filters.
    ///
    /// # Errors
    ///
    /// See [`RecordViewer::apply_load`].
    pub async fn load(&mut self) -> Result<LoadOutcome, LoadError> {
        let ticket = self.begin_load();
        let result = self.api.list(&ticket.filters).await;
        self.apply_load(&ticket, result)
    }

    /// Replace the filters and re-fetch without leaving the page.
    ///
    /// # Errors
    ///
    /// See [`RecordViewer::apply_load`].
    pub async fn set_filters(&mut self, filters: Filters) -> Result<LoadOutcome, LoadError> {
        self.filters = filters;
        self.load().await
    }

    /// Refresh open dialogs from the new cache; close those whose record is gone.
    fn reconcile_dialogs(&mut self) {
        if let Some(id) = self.view.as_ref().map(|v| v.record.id) {
            match self.record(id).cloned() {
                Some(record) => {
                    if let Some(view) = self.view.as_mut() {
                        view.record = record;
                    }
                }
                None => self.view = None,
            }
        }
        let orphaned_edit = self
            .edit
            .as_ref()
            .filter(|d| !d.submitting)
            .map(|d| d.id)
            .filter(|id| self.record(*id).is_none());
        if let Some(id) = orphaned_edit {
            debug!(id, "closing editor for a record no longer listed");
            self.edit = None;
        }
    }

    // -------------------------------------------------------------------------
    // view dialog
    // -------------------------------------------------------------------------

    /// Open the detail dialog for a cached record. Unknown ids do not open.
    pub fn open_view(&mut self, id: i64) -> bool {
        let Some(record) = self.record(id).cloned() else {
            debug!(id, "view requested for unknown record");
            return false;
        };
        self.view = Some(ViewDialog { record, delete_target: id, filters: self.filters.clone() });
        true
    }

    pub fn close_view(&mut self) {
        self.view = None;
    }

    // -------------------------------------------------------------------------
    // edit dialog
    // -------------------------------------------------------------------------

    /// Open the procedure editor. Refused for unknown ids and while another
    /// edit is being saved.
    pub fn open_edit(&mut self, id: i64, current_text: &str) -> bool {
        if self.edit.as_ref().is_some_and(|d| d.submitting) {
            return false;
        }
        if self.record(id).is_none() {
            debug!(id, "edit requested for unknown record");
            return false;
        }
        self.edit = Some(EditDialog::new(id, current_text));
        true
    }

    pub fn edit_input(&mut self, text: &str) {
        if let Some(dialog) = self.edit.as_mut() {
            dialog.input(text);
        }
    }

    /// Close the editor. Unsaved changes are discarded only if `confirm`
    /// agrees. Returns whether the editor is now closed.
    pub fn attempt_close(&mut self, confirm: impl FnOnce(&str) -> bool) -> bool {
        let Some(dialog) = &self.edit else {
            return true;
        };
        if dialog.submitting {
            return false;
        }
        if dialog.dirty && !confirm(DISCARD_PROMPT) {
            return false;
        }
        self.edit = None;
        true
    }

    /// Mark the open edit as in flight and return what to send.
    ///
    /// # Errors
    ///
    /// [`EditError::NoDialog`], [`EditError::InFlight`], or
    /// [`EditError::Rejected`] for blank text.
    pub fn begin_submit(&mut self) -> Result<EditSubmission, EditError> {
        let dialog = self.edit.as_mut().ok_or(EditError::NoDialog)?;
        if dialog.submitting {
            return Err(EditError::InFlight);
        }
        if dialog.current.trim().is_empty() {
            dialog.error = Some(EMPTY_PROCEDURE.to_owned());
            return Err(EditError::Rejected(EMPTY_PROCEDURE.to_owned()));
        }
        dialog.submitting = true;
        dialog.error = None;
        Ok(EditSubmission { id: dialog.id, text: dialog.current.clone() })
    }

    /// Apply the backend's answer to a submitted edit. On success the cached
    /// record and its row are patched and the editor closes; on failure the
    /// editor stays open with the error and the text unchanged.
    ///
    /// # Errors
    ///
    /// [`EditError::Rejected`] with the server's message, or
    /// [`EditError::Api`] for transport failures.
    pub fn finish_submit(
        &mut self,
        submission: EditSubmission,
        result: Result<MutationResponse, ApiError>,
    ) -> Result<String, EditError> {
        let outcome = match result {
            Ok(resp) if resp.success => Ok(resp.novo_resumo),
            Ok(resp) => Err(EditError::Rejected(failure_text(resp.message, EDIT_FAILED))),
            Err(e) => Err(EditError::Api(e)),
        };

        match outcome {
            Ok(novo_resumo) => {
                let summary = novo_resumo.unwrap_or_else(|| summarize(&submission.text));
                self.patch_procedure(submission.id, &submission.text, &summary);
                if self.load_pending {
                    self.pending_patches.push(ProcedurePatch {
                        id: submission.id,
                        text: submission.text.clone(),
                        summary: summary.clone(),
                    });
                }
                if self.edit.as_ref().is_some_and(|d| d.id == submission.id) {
                    self.edit = None;
                }
                info!(id = submission.id, "procedure updated");
                Ok(summary)
            }
            Err(err) => {
                warn!(id = submission.id, error = %err, "procedure update failed");
                if let Some(dialog) = self.edit.as_mut().filter(|d| d.id == submission.id) {
                    dialog.submitting = false;
                    dialog.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Save the open editor's text and return the new summary.
    ///
    /// # Errors
    ///
    /// See [`RecordViewer::begin_submit`] and [`RecordViewer::finish_submit`].
    pub async fn submit_edit(&mut self) -> Result<String, EditError> {
        let submission = self.begin_submit()?;
        let result = self.api.edit_procedure(submission.id, &submission.text).await;
        self.finish_submit(submission, result)
    }

    fn patch_procedure(&mut self, id: i64, text: &str, summary: &str) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
            text.clone_into(&mut record.procedimento);
            record.procedimento_resumo = Some(summary.to_owned());
        }
        if let Some(row) = self.listing.row_mut(id) {
            row.set_procedure(text, Some(summary));
        }
        if let Some(view) = self.view.as_mut().filter(|v| v.record.id == id) {
            text.clone_into(&mut view.record.procedimento);
            view.record.procedimento_resumo = Some(summary.to_owned());
        }
    }

    // -------------------------------------------------------------------------
    // deletes
    // -------------------------------------------------------------------------

    /// Ask `confirm` about `target` and mark a delete as in flight.
    /// Returns `None` when the operator declined.
    ///
    /// # Errors
    ///
    /// [`DeleteError::InFlight`] while another delete is pending.
    pub fn begin_delete(
        &mut self,
        target: DeleteTarget,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Option<DeleteTicket>, DeleteError> {
        if self.deleting {
            return Err(DeleteError::InFlight);
        }
        let prompt = match target {
            DeleteTarget::One(id) => delete_prompt(id),
            DeleteTarget::All => DELETE_ALL_PROMPT.to_owned(),
        };
        if !confirm(&prompt) {
            return Ok(None);
        }
        self.deleting = true;
        Ok(Some(DeleteTicket { target }))
    }

    /// Apply the backend's answer to a delete and return the number of
    /// records removed. The caller re-loads the listing on success.
    ///
    /// # Errors
    ///
    /// Whatever `result` carries.
    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<MutationResponse, DeleteError>,
    ) -> Result<u64, DeleteError> {
        self.deleting = false;
        let resp = result.inspect_err(|e| warn!(delete = ?ticket.target, error = %e, "delete failed"))?;

        match ticket.target {
            DeleteTarget::One(id) => {
                info!(id, "record deleted");
                if self.view.as_ref().is_some_and(|v| v.delete_target == id) {
                    self.view = None;
                }
                Ok(resp.deleted.unwrap_or(1))
            }
            DeleteTarget::All => {
                let deleted = resp.deleted.unwrap_or_default();
                warn!(deleted, "all records deleted");
                self.view = None;
                Ok(deleted)
            }
        }
    }

    /// Release a ticket whose request was dropped without an answer.
    pub fn abandon_delete(&mut self, ticket: DeleteTicket) {
        debug!(delete = ?ticket.target, "delete abandoned");
        self.deleting = false;
    }

    /// Delete one record after `confirm` agrees, then re-load with the
    /// current filters. Returns `false` when the operator declined.
    ///
    /// # Errors
    ///
    /// [`DeleteError::InFlight`], [`DeleteError::Rejected`] or
    /// [`DeleteError::Api`].
    pub async fn delete_record(&mut self, id: i64, confirm: impl FnOnce(&str) -> bool) -> Result<bool, DeleteError> {
        let Some(ticket) = self.begin_delete(DeleteTarget::One(id), confirm)? else {
            return Ok(false);
        };
        let result = self.send_guarded(ticket.target).await;
        self.finish_delete(ticket, result)?;
        self.reload_after_delete().await;
        Ok(true)
    }

    /// Delete every record. After `confirm` agrees, a one-time confirmation
    /// token is requested with the operator's session; without one nothing
    /// is submitted. Returns the number deleted, or `None` when declined.
    ///
    /// # Errors
    ///
    /// [`DeleteError::MissingConfirmation`] when the backend issues no
    /// token, plus the errors of [`RecordViewer::delete_record`].
    pub async fn delete_all(&mut self, confirm: impl FnOnce(&str) -> bool) -> Result<Option<u64>, DeleteError> {
        let Some(ticket) = self.begin_delete(DeleteTarget::All, confirm)? else {
            return Ok(None);
        };
        let result = self.send_guarded(ticket.target).await;
        let deleted = self.finish_delete(ticket, result)?;
        self.reload_after_delete().await;
        Ok(Some(deleted))
    }

    async fn send_guarded(&mut self, target: DeleteTarget) -> Result<MutationResponse, DeleteError> {
        let _in_flight = InFlight::engage(&mut self.deleting);
        send_delete(&self.api, target).await
    }

    async fn reload_after_delete(&mut self) {
        if let Err(e) = self.load().await {
            warn!(error = %e, "reload after delete failed");
        }
    }
}

/// Send the request a [`DeleteTicket`] stands for. Bulk deletes first fetch
/// a confirmation token and stop if the backend issues none.
///
/// # Errors
///
/// [`DeleteError::MissingConfirmation`], [`DeleteError::Rejected`] or
/// [`DeleteError::Api`].
pub async fn send_delete<A: RecordApi>(api: &A, target: DeleteTarget) -> Result<MutationResponse, DeleteError> {
    match target {
        DeleteTarget::One(id) => check_mutation(api.delete_record(id).await, DELETE_FAILED),
        DeleteTarget::All => {
            let confirmation = api.confirmation_token().await?;
            if confirmation.token.trim().is_empty() {
                warn!("bulk delete aborted: no confirmation token issued");
                return Err(DeleteError::MissingConfirmation);
            }
            check_mutation(api.delete_all(&confirmation.token).await, DELETE_ALL_FAILED)
        }
    }
}

fn failure_text(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

fn check_mutation(result: Result<MutationResponse, ApiError>, fallback: &str) -> Result<MutationResponse, DeleteError> {
    match result? {
        resp if resp.success => Ok(resp),
        resp => Err(DeleteError::Rejected(failure_text(resp.message, fallback))),
    }
}
