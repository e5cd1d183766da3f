//! Interactive cross-reference resolution.
//!
//! # Responsibility
//! - Answer focus events with related sentences grouped by document.
//! - Own the debounced clear that follows an unfocus event.
//! - Translate "select related sentence" into a navigation request.
//!
//! # Invariants
//! - At most one pending clear exists per resolver.
//! - `on_focus` cancels any pending clear before doing anything else.
//! - Time only advances through the `now` values callers pass in; the
//!   resolver never spawns threads or timers of its own.
//! - Repeated `on_focus` calls against the same graph return equal views.

use crate::alignment::graph::AlignmentGraph;
use crate::model::document::{DocumentId, DocumentRole, Sentence, SentenceId};
use crate::registry::sentence_registry::SentenceRegistry;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Delay between an unfocus event and clearing the derived state.
pub const DEFAULT_UNFOCUS_DELAY: Duration = Duration::from_millis(200);

pub type ResolverResult<T> = Result<T, ResolverError>;

/// Resolver failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Focused or selected sentence is not in the registry.
    UnknownSentence(SentenceId),
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSentence(id) => write!(f, "cannot focus unknown sentence: {id}"),
        }
    }
}

impl Error for ResolverError {}

/// Resolver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub unfocus_delay: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            unfocus_delay: DEFAULT_UNFOCUS_DELAY,
        }
    }
}

/// Single cancellable deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfocusTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl UnfocusTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the timer at `now + delay`, replacing any pending deadline.
    pub fn schedule(&mut self, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Disarms the timer. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns `true` once `now` has reached the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Related sentences for one focused sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusView {
    pub sentence_id: SentenceId,
    pub side: DocumentRole,
    /// Related ids on the opposite side, in graph order.
    pub related_ids: Vec<SentenceId>,
    /// Owning document id -> related sentences, in `related_ids` order.
    pub grouped: BTreeMap<DocumentId, Vec<Sentence>>,
}

/// "Make this document active and focus this sentence" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub doc_id: DocumentId,
    pub sentence_id: SentenceId,
}

/// Result of selecting a related sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRelatedOutcome {
    pub navigation: NavigationRequest,
    pub view: FocusView,
}

/// Focus state machine over one registry and the active graph.
#[derive(Debug)]
pub struct CrossReferenceResolver {
    registry: Arc<SentenceRegistry>,
    graph: Arc<AlignmentGraph>,
    timer: UnfocusTimer,
    focus: Option<FocusView>,
    highlighted: BTreeSet<SentenceId>,
}

impl CrossReferenceResolver {
    pub fn new(
        registry: Arc<SentenceRegistry>,
        graph: Arc<AlignmentGraph>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            registry,
            graph,
            timer: UnfocusTimer::new(config.unfocus_delay),
            focus: None,
            highlighted: BTreeSet::new(),
        }
    }

    /// Focuses `sentence_id`, seen from `side`.
    ///
    /// # Errors
    /// - `UnknownSentence` when the id is not registered; derived state is
    ///   left untouched apart from the cancelled pending clear.
    pub fn on_focus(&mut self, sentence_id: &str, side: DocumentRole) -> ResolverResult<FocusView> {
        self.cancel_pending_unfocus();

        if !self.registry.contains(sentence_id) {
            return Err(ResolverError::UnknownSentence(sentence_id.to_string()));
        }

        let related_ids = self.graph.query(sentence_id, side).to_vec();
        let mut grouped: BTreeMap<DocumentId, Vec<Sentence>> = BTreeMap::new();
        for related_id in &related_ids {
            if let Some(sentence) = self.registry.get(related_id) {
                grouped
                    .entry(sentence.doc_id.clone())
                    .or_default()
                    .push(sentence.clone());
            }
        }

        self.highlighted = std::iter::once(sentence_id.to_string())
            .chain(related_ids.iter().cloned())
            .collect();

        let view = FocusView {
            sentence_id: sentence_id.to_string(),
            side,
            related_ids,
            grouped,
        };
        debug!(
            "event=focus module=resolver status=ok side={} related={} documents={}",
            side.as_str(),
            view.related_ids.len(),
            view.grouped.len()
        );
        self.focus = Some(view.clone());
        Ok(view)
    }

    /// Schedules clearing the derived state after the configured delay.
    pub fn on_unfocus(&mut self, now: Instant) -> Instant {
        self.schedule_unfocus(now)
    }

    pub fn schedule_unfocus(&mut self, now: Instant) -> Instant {
        self.timer.schedule(now)
    }

    /// Returns whether a pending clear was cancelled.
    pub fn cancel_pending_unfocus(&mut self) -> bool {
        let cancelled = self.timer.cancel();
        if cancelled {
            debug!("event=unfocus_cancel module=resolver status=ok");
        }
        cancelled
    }

    pub fn has_pending_unfocus(&self) -> bool {
        self.timer.is_pending()
    }

    /// Applies a due clear. Returns `true` when state was cleared.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.timer.fire_if_due(now) {
            return false;
        }
        self.clear();
        debug!("event=unfocus_clear module=resolver status=ok");
        true
    }

    /// Navigates to the owning document of `related_id` and focuses it there.
    pub fn on_select_related(&mut self, related_id: &str) -> ResolverResult<SelectRelatedOutcome> {
        let document = self
            .registry
            .owning_document(related_id)
            .map_err(|_| ResolverError::UnknownSentence(related_id.to_string()))?;
        let navigation = NavigationRequest {
            doc_id: document.doc_id.clone(),
            sentence_id: related_id.to_string(),
        };
        let side = document.role;

        let view = self.on_focus(related_id, side)?;
        Ok(SelectRelatedOutcome { navigation, view })
    }

    /// Rebinds to a newly activated graph and drops all derived state.
    pub fn replace_graph(&mut self, graph: Arc<AlignmentGraph>) {
        self.graph = graph;
        self.timer.cancel();
        self.clear();
    }

    pub fn focused(&self) -> Option<&FocusView> {
        self.focus.as_ref()
    }

    /// Focused sentence plus its related sentences.
    pub fn highlighted_ids(&self) -> &BTreeSet<SentenceId> {
        &self.highlighted
    }

    pub fn is_highlighted(&self, sentence_id: &str) -> bool {
        self.highlighted.contains(sentence_id)
    }

    fn clear(&mut self) {
        self.focus = None;
        self.highlighted.clear();
    }
}
