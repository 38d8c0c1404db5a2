use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use records::wire::ConfirmationToken;
use records::{RESUMO_MAX_CARACTERES, SimNao};

use super::*;

// =========================================================================
// MockApi
// =========================================================================

#[derive(Default)]
struct MockApi {
    pages: Mutex<VecDeque<Result<RecordPage, ApiError>>>,
    mutations: Mutex<VecDeque<Result<MutationResponse, ApiError>>>,
    tokens: Mutex<VecDeque<Result<ConfirmationToken, ApiError>>>,
    calls: Mutex<Vec<String>>,
    /// Number of upcoming deletes that never answer.
    stalled_deletes: Mutex<usize>,
}

impl MockApi {
    fn page(self, records: Vec<Record>) -> Self {
        self.pages.lock().unwrap().push_back(Ok(RecordPage { records, skipped: 0 }));
        self
    }

    fn failing_page(self, err: ApiError) -> Self {
        self.pages.lock().unwrap().push_back(Err(err));
        self
    }

    fn mutation(self, resp: Result<MutationResponse, ApiError>) -> Self {
        self.mutations.lock().unwrap().push_back(resp);
        self
    }

    fn token(self, token: &str) -> Self {
        self.tokens.lock().unwrap().push_back(Ok(ConfirmationToken { token: token.into() }));
        self
    }

    fn stall_deletes(self, count: usize) -> Self {
        *self.stalled_deletes.lock().unwrap() = count;
        self
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordApi for MockApi {
    async fn list(&self, filters: &Filters) -> Result<RecordPage, ApiError> {
        self.record_call(format!("list?{}", filters.to_query()));
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| Ok(RecordPage::default()))
    }

    async fn edit_procedure(&self, id: i64, text: &str) -> Result<MutationResponse, ApiError> {
        self.record_call(format!("edit {id} {text}"));
        self.mutations.lock().unwrap().pop_front().unwrap_or_else(|| Ok(MutationResponse::ok()))
    }

    async fn delete_record(&self, id: i64) -> Result<MutationResponse, ApiError> {
        self.record_call(format!("delete {id}"));
        let stall = {
            let mut stalled = self.stalled_deletes.lock().unwrap();
            let stall = *stalled > 0;
            *stalled = stalled.saturating_sub(1);
            stall
        };
        if stall {
            std::future::pending::<()>().await;
        }
        self.mutations.lock().unwrap().pop_front().unwrap_or_else(|| Ok(MutationResponse::ok()))
    }

    async fn confirmation_token(&self) -> Result<ConfirmationToken, ApiError> {
        self.record_call("token".into());
        self.tokens.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ConfirmationToken { token: String::new() }))
    }

    async fn delete_all(&self, confirmation_token: &str) -> Result<MutationResponse, ApiError> {
        self.record_call(format!("delete-all {confirmation_token}"));
        self.mutations.lock().unwrap().pop_front().unwrap_or_else(|| Ok(MutationResponse::ok()))
    }
}

fn record(id: i64, text: &str) -> Record {
    Record {
        id,
        posto: "Itu".into(),
        data: "2024-01-10".into(),
        hora_inicio: "08:00".into(),
        procedimento: text.into(),
        ..Record::default()
    }
}

fn three() -> Vec<Record> {
    vec![record(3, "terceiro"), record(2, "segundo"), record(1, "primeiro")]
}

async fn loaded(api: MockApi) -> RecordViewer<MockApi> {
    let mut viewer = RecordViewer::new(api, Filters::default());
    viewer.load().await.unwrap();
    viewer
}

// =========================================================================
// load
// =========================================================================

#[tokio::test]
async fn load_renders_rows_in_server_order() {
    let viewer = loaded(MockApi::default().page(three())).await;
    let ids: Vec<i64> = viewer.listing().rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert!(viewer.listing().table_visible());
    assert!(!viewer.listing().empty_visible());
    assert_eq!(viewer.records().len(), 3);
}

#[tokio::test]
async fn load_with_no_records_shows_empty_indicator() {
    let viewer = loaded(MockApi::default().page(vec![])).await;
    assert!(viewer.listing().empty_visible());
    assert!(!viewer.listing().table_visible());
}

#[tokio::test]
async fn load_failure_shows_banner() {
    let mut viewer = RecordViewer::new(MockApi::default().failing_page(ApiError::Timeout), Filters::default());
    let err = viewer.load().await.unwrap_err();
    assert!(matches!(err, LoadError::Api(ApiError::Timeout)));
    let banner = viewer.listing().banner().unwrap();
    assert!(banner.contains("tempo de resposta esgotado"));
    assert!(!viewer.listing().table_visible());
    assert!(viewer.records().is_empty());
}

#[tokio::test]
async fn load_reports_skipped_rows() {
    let api = MockApi::default();
    api.pages.lock().unwrap().push_back(Ok(RecordPage { records: three(), skipped: 2 }));
    let mut viewer = RecordViewer::new(api, Filters::default());
    let outcome = viewer.load().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Applied { rows: 3, skipped: 2 });
    assert_eq!(viewer.skipped_rows(), 2);
}

#[test]
fn superseded_load_is_discarded() {
    let mut viewer = RecordViewer::new(MockApi::default(), Filters::default());
    let first = viewer.begin_load();
    let second = viewer.begin_load();
    assert!(second.seq() > first.seq());

    let stale = viewer.apply_load(&first, Ok(RecordPage { records: three(), skipped: 0 }));
    assert_eq!(stale.unwrap(), LoadOutcome::Stale);
    assert!(viewer.listing().is_loading());

    let fresh = viewer.apply_load(&second, Ok(RecordPage { records: vec![record(9, "novo")], skipped: 0 }));
    assert_eq!(fresh.unwrap(), LoadOutcome::Applied { rows: 1, skipped: 0 });
    assert_eq!(viewer.listing().rows()[0].id, 9);
}

#[tokio::test]
async fn edit_saved_during_a_load_survives_the_older_page() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let ticket = viewer.begin_load();

    assert!(viewer.open_edit(2, "segundo"));
    viewer.edit_input("revisado");
    let submission = viewer.begin_submit().unwrap();
    viewer.finish_submit(submission, Ok(MutationResponse::ok())).unwrap();

    let outcome = viewer.apply_load(&ticket, Ok(RecordPage { records: three(), skipped: 0 }));
    assert_eq!(outcome.unwrap(), LoadOutcome::Applied { rows: 3, skipped: 0 });
    assert_eq!(viewer.record(2).unwrap().procedimento, "revisado");
    assert_eq!(viewer.listing().rows()[1].full_text, "revisado");

    let next = viewer.begin_load();
    viewer.apply_load(&next, Ok(RecordPage { records: three(), skipped: 0 })).unwrap();
    assert_eq!(viewer.record(2).unwrap().procedimento, "segundo");
}

#[test]
fn stale_failure_does_not_replace_listing() {
    let mut viewer = RecordViewer::new(MockApi::default(), Filters::default());
    let first = viewer.begin_load();
    let second = viewer.begin_load();
    viewer.apply_load(&second, Ok(RecordPage { records: three(), skipped: 0 })).unwrap();

    let outcome = viewer.apply_load(&first, Err(ApiError::Network("reset".into())));
    assert_eq!(outcome.unwrap(), LoadOutcome::Stale);
    assert!(viewer.listing().table_visible());
}

#[tokio::test]
async fn set_filters_refetches_and_updates_links() {
    let mut viewer = loaded(MockApi::default().page(three()).page(vec![record(2, "segundo")])).await;
    assert_eq!(viewer.export_href(), "/api/registros/export.xlsx");

    let filters = Filters::from_controls("Posto 3", "2024-01-10", "SIM");
    viewer.set_filters(filters.clone()).await.unwrap();

    assert_eq!(viewer.filters(), &filters);
    assert_eq!(
        viewer.api().calls(),
        vec!["list?".to_owned(), "list?posto=Posto+3&data=2024-01-10&coleta=SIM".to_owned()]
    );
    assert_eq!(viewer.export_href(), "/api/registros/export.xlsx?posto=Posto+3&data=2024-01-10&coleta=SIM");
    assert_eq!(viewer.listing_href("/consultar"), "/consultar?posto=Posto+3&data=2024-01-10&coleta=SIM");
    assert_eq!(viewer.listing().rows().len(), 1);
}

#[tokio::test]
async fn collection_row_example() {
    let rec = Record {
        id: 7,
        coleta_imagem: SimNao::Sim,
        numero_mesa: Some("4".into()),
        retaguarda_sim_nao: SimNao::Nao,
        ..Record::default()
    };
    let viewer = loaded(MockApi::default().page(vec![rec])).await;
    let row = viewer.listing().row(7).unwrap();
    assert_eq!(row.location, "4 - Coleta de imagem");
    assert_eq!(row.routing, "NÃO");
}

// =========================================================================
// view dialog
// =========================================================================

#[tokio::test]
async fn open_view_uses_cached_record() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    assert!(viewer.open_view(2));
    let view = viewer.view().unwrap();
    assert_eq!(view.record.procedimento, "segundo");
    assert_eq!(view.delete_target, 2);
    assert_eq!(view.filters, Filters::default());
}

#[tokio::test]
async fn open_view_unknown_id_does_nothing() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    assert!(!viewer.open_view(99));
    assert!(viewer.view().is_none());
}

// =========================================================================
// edit dialog
// =========================================================================

#[tokio::test]
async fn successful_edit_changes_exactly_one_row() {
    let resp = MutationResponse { novo_resumo: Some("texto revisado".into()), ..MutationResponse::ok() };
    let mut viewer = loaded(MockApi::default().page(three()).mutation(Ok(resp))).await;
    let before = viewer.listing().rows().to_vec();

    assert!(viewer.open_edit(2, "segundo"));
    viewer.edit_input("texto\n revisado");
    assert!(viewer.edit().unwrap().dirty);

    let summary = viewer.submit_edit().await.unwrap();
    assert_eq!(summary, "texto revisado");
    assert!(viewer.edit().is_none());

    let after = viewer.listing().rows();
    let changed: Vec<i64> = before
        .iter()
        .zip(after)
        .filter(|(b, a)| b != a)
        .map(|(b, _)| b.id)
        .collect();
    assert_eq!(changed, vec![2]);
    assert_eq!(after[1].summary, "texto revisado");
    assert_eq!(after[1].full_text, "texto\n revisado");
    assert_eq!(viewer.record(2).unwrap().procedimento, "texto\n revisado");
    assert_eq!(viewer.api().calls()[1], "edit 2 texto\n revisado");
}

#[tokio::test]
async fn edit_without_server_summary_is_summarized_locally() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let long = "palavra ".repeat(40);
    viewer.open_edit(1, "primeiro");
    viewer.edit_input(&long);
    let summary = viewer.submit_edit().await.unwrap();
    assert_eq!(summary.chars().count(), RESUMO_MAX_CARACTERES + 3);
    assert_eq!(viewer.listing().row(1).unwrap().summary, summary);
}

#[tokio::test]
async fn rejected_edit_keeps_dialog_and_text() {
    let resp = MutationResponse::failure("Registro 2 não encontrado.");
    let mut viewer = loaded(MockApi::default().page(three()).mutation(Ok(resp))).await;
    viewer.open_edit(2, "segundo");
    viewer.edit_input("alterado");

    let err = viewer.submit_edit().await.unwrap_err();
    assert!(matches!(&err, EditError::Rejected(m) if m == "Registro 2 não encontrado."));

    let dialog = viewer.edit().unwrap();
    assert_eq!(dialog.current, "alterado");
    assert!(!dialog.submitting);
    assert_eq!(dialog.error.as_deref(), Some("Registro 2 não encontrado."));
    assert_eq!(viewer.listing().row(2).unwrap().full_text, "segundo");
}

#[tokio::test]
async fn rejected_edit_without_message_uses_generic_text() {
    let resp = MutationResponse { success: false, ..MutationResponse::default() };
    let mut viewer = loaded(MockApi::default().page(three()).mutation(Ok(resp))).await;
    viewer.open_edit(2, "segundo");
    viewer.edit_input("alterado");
    let err = viewer.submit_edit().await.unwrap_err();
    assert_eq!(err.to_string(), EDIT_FAILED);
}

#[tokio::test]
async fn timed_out_edit_keeps_dialog_open() {
    let mut viewer = loaded(MockApi::default().page(three()).mutation(Err(ApiError::Timeout))).await;
    viewer.open_edit(3, "terceiro");
    viewer.edit_input("novo");
    let err = viewer.submit_edit().await.unwrap_err();
    assert!(matches!(err, EditError::Api(ApiError::Timeout)));
    assert_eq!(viewer.edit().unwrap().current, "novo");
    assert_eq!(viewer.listing().row(3).unwrap().full_text, "terceiro");
}

#[tokio::test]
async fn second_submit_while_in_flight_is_refused() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_edit(1, "primeiro");
    viewer.edit_input("outro");

    let submission = viewer.begin_submit().unwrap();
    assert!(viewer.edit().unwrap().submitting);
    assert!(matches!(viewer.begin_submit(), Err(EditError::InFlight)));
    assert!(!viewer.attempt_close(|_| true));
    assert!(!viewer.open_edit(2, "segundo"));

    viewer.finish_submit(submission, Ok(MutationResponse::ok())).unwrap();
    assert!(viewer.edit().is_none());
}

#[test]
fn submit_without_dialog_fails() {
    let mut viewer = RecordViewer::new(MockApi::default(), Filters::default());
    assert!(matches!(viewer.begin_submit(), Err(EditError::NoDialog)));
}

#[tokio::test]
async fn blank_edit_is_rejected_before_sending() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_edit(1, "primeiro");
    viewer.edit_input("   ");
    assert!(matches!(viewer.submit_edit().await, Err(EditError::Rejected(_))));
    assert_eq!(viewer.api().calls().len(), 1);
    assert_eq!(viewer.edit().unwrap().error.as_deref(), Some(EMPTY_PROCEDURE));
}

#[tokio::test]
async fn open_edit_unknown_id_is_refused() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    assert!(!viewer.open_edit(42, "x"));
    assert!(viewer.edit().is_none());
}

#[tokio::test]
async fn closing_clean_editor_skips_confirmation() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_edit(1, "primeiro");
    let asked = RefCell::new(false);
    assert!(viewer.attempt_close(|_| {
        *asked.borrow_mut() = true;
        false
    }));
    assert!(!*asked.borrow());
    assert!(viewer.edit().is_none());
}

#[tokio::test]
async fn closing_dirty_editor_respects_confirmation() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_edit(1, "primeiro");
    viewer.edit_input("mudou");

    assert!(!viewer.attempt_close(|prompt| {
        assert_eq!(prompt, DISCARD_PROMPT);
        false
    }));
    assert_eq!(viewer.edit().unwrap().current, "mudou");

    assert!(viewer.attempt_close(|_| true));
    assert!(viewer.edit().is_none());
}

#[tokio::test]
async fn edit_updates_open_view() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_view(2);
    viewer.open_edit(2, "segundo");
    viewer.edit_input("revisto");
    viewer.submit_edit().await.unwrap();
    assert_eq!(viewer.view().unwrap().record.procedimento, "revisto");
}

// =========================================================================
// delete
// =========================================================================

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let deleted = viewer
        .delete_record(2, |prompt| {
            assert!(prompt.contains('2'));
            false
        })
        .await
        .unwrap();
    assert!(!deleted);
    assert_eq!(viewer.api().calls(), vec!["list?".to_owned()]);
}

#[tokio::test]
async fn delete_reloads_with_current_filters() {
    let filters = Filters::from_controls("Itu", "", "Todos");
    let api = MockApi::default()
        .page(three())
        .page(vec![record(3, "terceiro"), record(1, "primeiro")]);
    let mut viewer = RecordViewer::new(api, filters);
    viewer.load().await.unwrap();
    viewer.open_view(2);

    assert!(viewer.delete_record(2, |_| true).await.unwrap());
    assert_eq!(
        viewer.api().calls(),
        vec!["list?posto=Itu".to_owned(), "delete 2".to_owned(), "list?posto=Itu".to_owned()]
    );
    assert_eq!(viewer.listing().rows().len(), 2);
    assert!(viewer.view().is_none());
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn failed_delete_surfaces_message_and_keeps_listing() {
    let api = MockApi::default()
        .page(three())
        .mutation(Err(ApiError::Status { status: 404, message: "Registro 2 não encontrado.".into() }));
    let mut viewer = loaded(api).await;
    let err = viewer.delete_record(2, |_| true).await.unwrap_err();
    assert_eq!(err.to_string(), "Registro 2 não encontrado.");
    assert_eq!(viewer.listing().rows().len(), 3);
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn delete_while_in_flight_is_refused() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let ticket = viewer.begin_delete(DeleteTarget::One(2), |_| true).unwrap().unwrap();
    assert!(viewer.is_deleting());
    assert!(matches!(viewer.delete_record(1, |_| true).await, Err(DeleteError::InFlight)));
    assert!(matches!(viewer.delete_all(|_| true).await, Err(DeleteError::InFlight)));

    viewer.finish_delete(ticket, Ok(MutationResponse::ok())).unwrap();
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn split_delete_closes_view_and_releases_guard() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    viewer.open_view(2);
    let ticket = viewer.begin_delete(DeleteTarget::One(2), |_| true).unwrap().unwrap();
    assert_eq!(ticket.target(), DeleteTarget::One(2));

    let result = send_delete(viewer.api(), ticket.target()).await;
    assert_eq!(viewer.finish_delete(ticket, result).unwrap(), 1);
    assert!(viewer.view().is_none());
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn declined_begin_delete_leaves_guard_clear() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    assert_eq!(viewer.begin_delete(DeleteTarget::All, |_| false).unwrap(), None);
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn abandoned_delete_allows_another() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let ticket = viewer.begin_delete(DeleteTarget::One(1), |_| true).unwrap().unwrap();
    viewer.abandon_delete(ticket);
    assert!(!viewer.is_deleting());
    assert!(viewer.begin_delete(DeleteTarget::One(1), |_| true).unwrap().is_some());
}

#[tokio::test]
async fn cancelled_delete_does_not_block_later_deletes() {
    let api = MockApi::default().page(three()).stall_deletes(1).page(vec![record(3, "terceiro")]);
    let mut viewer = loaded(api).await;

    let first = tokio::time::timeout(Duration::from_millis(20), viewer.delete_record(1, |_| true)).await;
    assert!(first.is_err());
    assert!(!viewer.is_deleting());

    assert!(viewer.delete_record(2, |_| true).await.unwrap());
    assert_eq!(viewer.listing().rows().len(), 1);
    assert!(!viewer.is_deleting());
}

#[tokio::test]
async fn delete_all_requires_server_confirmation() {
    let mut viewer = loaded(MockApi::default().page(three()).token("  ")).await;
    let err = viewer.delete_all(|_| true).await.unwrap_err();
    assert!(matches!(err, DeleteError::MissingConfirmation));
    assert_eq!(viewer.api().calls(), vec!["list?".to_owned(), "token".to_owned()]);
    assert_eq!(viewer.listing().rows().len(), 3);
}

#[tokio::test]
async fn delete_all_declined_sends_nothing() {
    let mut viewer = loaded(MockApi::default().page(three())).await;
    let result = viewer
        .delete_all(|prompt| {
            assert_eq!(prompt, DELETE_ALL_PROMPT);
            false
        })
        .await
        .unwrap();
    assert_eq!(result, None);
    assert_eq!(viewer.api().calls().len(), 1);
}

#[tokio::test]
async fn delete_all_submits_token_and_reloads() {
    let resp = MutationResponse { deleted: Some(3), ..MutationResponse::ok() };
    let api = MockApi::default().page(three()).token("abc123").mutation(Ok(resp)).page(vec![]);
    let mut viewer = loaded(api).await;

    assert_eq!(viewer.delete_all(|_| true).await.unwrap(), Some(3));
    assert_eq!(
        viewer.api().calls(),
        vec!["list?".to_owned(), "token".to_owned(), "delete-all abc123".to_owned(), "list?".to_owned()]
    );
    assert!(viewer.listing().empty_visible());
}

#[tokio::test]
async fn delete_all_without_session_surfaces_status() {
    let api = MockApi::default().page(three());
    api.tokens
        .lock()
        .unwrap()
        .push_back(Err(ApiError::Status { status: 401, message: "erro HTTP 401".into() }));
    let mut viewer = loaded(api).await;
    let err = viewer.delete_all(|_| true).await.unwrap_err();
    assert!(matches!(err, DeleteError::Api(ApiError::Status { status: 401, .. })));
    assert_eq!(viewer.api().calls().len(), 2);
}
