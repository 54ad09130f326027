use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use roster_core::entities::DetailSource;
use roster_core::format::{self, ExportFormat};
use roster_core::{RawRecord, RecordId, Report};
use roster_ops::{Action, ActionContext, Actionable, Mutation, RemoteActions};
use roster_search::{derive_clamped, select, total_pages, Debounce, ViewState, VisibleSlice};
use roster_store::{Collection, LoadReport, LoadSequencer, SnapshotHandle, SnapshotPublisher};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::{
    DataSource, Notifier, RecordUpdate, RosterConfig, RosterError, RosterResult, SelectionMirror, REPORT_DATE_KEY,
    REPORT_TYPE_KEY,
};

/// Issued by [`Coordinator::begin_load`]; only the most recent one commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

impl LoadTicket {
    pub fn seq(&self) -> u64 { self.seq }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    /// A newer load was issued meanwhile; the result was dropped.
    Stale,
    /// The collection was emptied and a failure notice sent.
    Failed(RosterError),
}

/// An accepted action awaiting its round trip. The local effect is recomputed
/// against the record as it stands at commit time.
#[derive(Debug, Clone)]
pub struct ActionTicket<E> {
    id: RecordId,
    action: Action,
    ctx: ActionContext,
    _kind: PhantomData<fn() -> E>,
}

impl<E> ActionTicket<E> {
    pub fn id(&self) -> &str { &self.id }
    pub fn action(&self) -> &Action { &self.action }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Committed,
    /// Target id not present; nothing happened.
    NoOp,
    /// Collection left unchanged; a failure notice was sent.
    Failed(RosterError),
}

/// Owns one collection and the view over it.
pub struct Coordinator<E: Actionable> {
    collection: Collection<E>,
    view: ViewState,
    sequencer: LoadSequencer,
    loading: bool,
    actions_in_flight: usize,
    selected: Option<RecordId>,
    search_debounce: Debounce<String>,
    cache: Option<(u64, u64, VisibleSlice<E>)>,
    publisher: SnapshotPublisher<E>,
    notifier: Arc<dyn Notifier>,
    mirror: Option<Arc<dyn SelectionMirror>>,
}

impl<E: Actionable> Coordinator<E> {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self { Self::with_config(&RosterConfig::default(), notifier) }

    pub fn with_config(cfg: &RosterConfig, notifier: Arc<dyn Notifier>) -> Self {
        let mut view = ViewState::for_entity::<E>();
        if let Some(n) = cfg.page_size {
            view = view.with_page_size(n);
        }
        Self {
            collection: Collection::new(),
            view,
            sequencer: LoadSequencer::new(),
            loading: false,
            actions_in_flight: 0,
            selected: None,
            search_debounce: Debounce::new(cfg.debounce_ms),
            cache: None,
            publisher: SnapshotPublisher::new(),
            notifier,
            mirror: None,
        }
    }

    pub fn with_selection_mirror(mut self, mirror: Arc<dyn SelectionMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn collection(&self) -> &Collection<E> { &self.collection }
    pub fn view(&self) -> &ViewState { &self.view }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn is_action_pending(&self) -> bool { self.actions_in_flight > 0 }
    pub fn snapshots(&self) -> SnapshotHandle<E> { self.publisher.handle() }

    /// The current page. Recomputed only when the collection or the view changed.
    pub fn visible(&mut self) -> VisibleSlice<E> {
        if let Some((epoch, rev, slice)) = &self.cache {
            if *epoch == self.collection.epoch() && *rev == self.view.revision() {
                return slice.clone();
            }
        }
        let slice = derive_clamped(self.collection.items(), &mut self.view);
        self.cache = Some((self.collection.epoch(), self.view.revision(), slice.clone()));
        slice
    }

    // ----------------- view setters -----------------

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_debounce.flush();
        self.view.set_search(term);
    }

    /// Search-as-you-type: the term is applied by [`tick`](Self::tick) once typing pauses.
    pub fn type_search(&mut self, term: impl Into<String>, now: Instant) { self.search_debounce.push(term.into(), now) }

    /// Apply a debounced search term if it is due. Returns whether the view changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.search_debounce.poll(now) {
            Some(term) => {
                self.view.set_search(term);
                true
            }
            None => false,
        }
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) { self.view.set_filter(key, value) }
    pub fn clear_filter(&mut self, key: &str) { self.view.clear_filter(key) }
    pub fn set_sort(&mut self, key: impl Into<String>) { self.view.set_sort(key) }
    pub fn set_page(&mut self, n: usize) {
        let (order, _) = select(self.collection.items(), &self.view);
        self.view.set_page_within(n, total_pages(order.len(), self.view.page_size()));
    }

    // ----------------- selection -----------------

    pub fn selected(&self) -> Option<&E> { self.selected.as_deref().and_then(|id| self.collection.get(id)) }
    pub fn selected_id(&self) -> Option<&str> { self.selected.as_deref() }

    pub fn select(&mut self, id: &str) -> RosterResult<()> {
        if !self.collection.contains(id) {
            return Err(RosterError::NotFound(format!("{} {id}", E::KIND)));
        }
        self.selected = Some(id.to_string());
        self.mirror_selection(Some(id));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.mirror_selection(None);
    }

    fn mirror_selection(&self, id: Option<&str>) {
        if let Some(m) = &self.mirror {
            m.set(E::KIND.selection_key(), id);
        }
    }

    fn restore_selection(&mut self) {
        let Some(m) = &self.mirror else {
            if self.selected.as_deref().is_some_and(|id| !self.collection.contains(id)) {
                self.selected = None;
            }
            return;
        };
        match m.get(E::KIND.selection_key()) {
            Some(id) if self.collection.contains(&id) => {
                debug!(kind = %E::KIND, id = %id, "selection restored from mirror");
                self.selected = Some(id);
            }
            _ => self.selected = None,
        }
    }

    // ----------------- loading -----------------

    pub fn begin_load(&mut self) -> LoadTicket {
        self.loading = true;
        LoadTicket { seq: self.sequencer.next() }
    }

    pub fn complete_load(&mut self, ticket: LoadTicket, result: anyhow::Result<Vec<RawRecord>>) -> LoadOutcome {
        if !self.sequencer.is_latest(ticket.seq) {
            debug!(kind = %E::KIND, seq = ticket.seq, latest = self.sequencer.latest(), "discarding stale load");
            metrics::counter!("roster_load_stale_total", 1u64, "kind" => E::KIND.as_str());
            return LoadOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(raws) => {
                let report = self.collection.load(&raws);
                self.restore_selection();
                self.publisher.publish(&self.collection);
                metrics::counter!("roster_load_total", 1u64, "kind" => E::KIND.as_str(), "outcome" => "ok");
                info!(kind = %E::KIND, accepted = report.accepted, rejected = report.rejected, duplicates = report.duplicates, "load applied");
                LoadOutcome::Applied(report)
            }
            Err(e) => {
                self.collection.clear();
                self.selected = None;
                self.publisher.publish(&self.collection);
                metrics::counter!("roster_load_total", 1u64, "kind" => E::KIND.as_str(), "outcome" => "error");
                warn!(kind = %E::KIND, error = %e, "load failed");
                self.notifier.failure(&format!("Failed to load {}s", E::KIND));
                LoadOutcome::Failed(RosterError::Load(e.to_string()))
            }
        }
    }

    pub async fn load(&mut self, source: &dyn DataSource) -> LoadOutcome {
        let t0 = Instant::now();
        let ticket = self.begin_load();
        let result = source.fetch(E::KIND).await;
        let out = self.complete_load(ticket, result);
        debug!(kind = %E::KIND, took_ms = %t0.elapsed().as_millis(), "load round trip");
        out
    }

    // ----------------- actions -----------------

    /// Compute the local effect of `action` on record `id`.
    ///
    /// `Ok(None)` when the record does not exist. Validation and transition
    /// errors are reported to the notifier before being returned.
    pub fn begin_action(&mut self, id: &str, action: Action) -> RosterResult<Option<ActionTicket<E>>> {
        self.begin_action_with(id, action, &ActionContext::now())
    }

    pub fn begin_action_with(&mut self, id: &str, action: Action, ctx: &ActionContext) -> RosterResult<Option<ActionTicket<E>>> {
        if let Err(e) = action.validate() {
            return Err(self.reject(&action, e.into()));
        }
        let Some(current) = self.collection.get(id) else {
            debug!(kind = %E::KIND, id, action = action.name(), "action target missing; ignoring");
            return Ok(None);
        };
        if let Err(e) = current.transition(&action, ctx) {
            return Err(self.reject(&action, e.into()));
        }
        self.actions_in_flight += 1;
        Ok(Some(ActionTicket { id: id.to_string(), action, ctx: ctx.clone(), _kind: PhantomData }))
    }

    fn reject(&self, action: &Action, err: RosterError) -> RosterError {
        metrics::counter!("roster_action_total", 1u64, "action" => action.name(), "outcome" => "rejected");
        warn!(kind = %E::KIND, action = action.name(), error = %err, "action rejected");
        self.notifier.failure(&err.to_string());
        err
    }

    /// Commit on success, leave the collection untouched on failure.
    pub fn complete_action(&mut self, ticket: ActionTicket<E>, result: anyhow::Result<()>) -> ActionOutcome {
        self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
        let name = ticket.action.name();
        if let Err(e) = result {
            metrics::counter!("roster_action_total", 1u64, "action" => name, "outcome" => "failed");
            warn!(kind = %E::KIND, id = %ticket.id, action = name, error = %e, "action failed");
            self.notifier.failure(&format!("Failed to {name} {} {}", E::KIND, ticket.id));
            return ActionOutcome::Failed(RosterError::Action(e.to_string()));
        }
        let Some(current) = self.collection.get(&ticket.id) else {
            debug!(kind = %E::KIND, id = %ticket.id, action = name, "record vanished before commit");
            return ActionOutcome::NoOp;
        };
        let mutation = match current.transition(&ticket.action, &ticket.ctx) {
            Ok(m) => m,
            Err(e) => {
                let err = RosterError::from(e);
                metrics::counter!("roster_action_total", 1u64, "action" => name, "outcome" => "failed");
                warn!(kind = %E::KIND, id = %ticket.id, action = name, error = %err, "action no longer applies");
                self.notifier.failure(&err.to_string());
                return ActionOutcome::Failed(err);
            }
        };
        let applied = match mutation {
            Mutation::Replace(next) => self.collection.replace(next),
            Mutation::Remove => {
                let removed = self.collection.remove(&ticket.id).is_some();
                if removed && self.selected.as_deref() == Some(ticket.id.as_str()) {
                    self.clear_selection();
                }
                removed
            }
        };
        if !applied {
            debug!(kind = %E::KIND, id = %ticket.id, action = name, "record vanished before commit");
            return ActionOutcome::NoOp;
        }
        self.publisher.publish(&self.collection);
        metrics::counter!("roster_action_total", 1u64, "action" => name, "outcome" => "ok");
        info!(kind = %E::KIND, id = %ticket.id, action = name, "action committed");
        self.notifier.success(&format!("{} {}: {name} done", E::KIND, ticket.id));
        ActionOutcome::Committed
    }

    pub async fn act(&mut self, remote: &dyn RemoteActions, id: &str, action: Action) -> ActionOutcome {
        let ticket = match self.begin_action(id, action) {
            Ok(Some(t)) => t,
            Ok(None) => return ActionOutcome::NoOp,
            Err(e) => return ActionOutcome::Failed(e),
        };
        let result = remote.submit(E::KIND, &ticket.id, &ticket.action).await;
        self.complete_action(ticket, result)
    }

    // ----------------- external updates -----------------

    /// Replace the record with the same id as `raw`; unknown ids are ignored.
    pub fn apply_update(&mut self, raw: &RawRecord) -> bool {
        let rec = E::normalize(raw);
        let applied = self.collection.replace(rec);
        if applied {
            self.publisher.publish(&self.collection);
        }
        applied
    }

    /// Apply every queued update for this entity kind. Returns how many were applied.
    pub fn drain_updates(&mut self, rx: &mut broadcast::Receiver<RecordUpdate>) -> usize {
        let mut applied = 0;
        loop {
            match rx.try_recv() {
                Ok(u) if u.kind == E::KIND => applied += usize::from(self.apply_update(&u.raw)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(n)) => warn!(kind = %E::KIND, skipped = n, "update bus lagged"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        applied
    }

    // ----------------- export -----------------

    pub fn export(&self, id: &str, fmt: ExportFormat) -> RosterResult<String> {
        let rec = self.collection.get(id).ok_or_else(|| RosterError::NotFound(format!("{} {id}", E::KIND)))?;
        Ok(format::export(rec, fmt)?)
    }

    pub fn export_visible(&mut self, fmt: ExportFormat) -> RosterResult<String> {
        let slice = self.visible();
        Ok(format::export_all(&slice.items, fmt)?)
    }
}

impl Coordinator<Report> {
    /// Open the drill-down list behind `metric` of report `id`, mirroring it as
    /// `reportType` / `reportDate`.
    pub fn open_detail(&mut self, id: &str, metric: &str) -> RosterResult<DetailSource> {
        let report = self.collection.get(id).ok_or_else(|| RosterError::NotFound(format!("report {id}")))?;
        let detail = Report::detail_source(metric).ok_or_else(|| RosterError::Validation(format!("unknown metric {metric}")))?;
        if !report.is_drillable(metric) {
            return Err(RosterError::Validation(format!("no {metric} on {}", report.date)));
        }
        let date = report.date.clone();
        self.select(id)?;
        if let Some(m) = &self.mirror {
            m.set(REPORT_TYPE_KEY, Some(detail.metric));
            m.set(REPORT_DATE_KEY, Some(&date));
        }
        Ok(detail)
    }

    pub fn close_detail(&mut self) {
        if let Some(m) = &self.mirror {
            m.set(REPORT_TYPE_KEY, None);
            m.set(REPORT_DATE_KEY, None);
        }
        self.clear_selection();
    }

    /// Drill-down requested by the mirror (e.g. after navigation), if it names a known metric.
    pub fn mirrored_detail(&self) -> Option<(DetailSource, String)> {
        let m = self.mirror.as_ref()?;
        let detail = Report::detail_source(&m.get(REPORT_TYPE_KEY)?)?;
        Some((detail, m.get(REPORT_DATE_KEY)?))
    }
}
