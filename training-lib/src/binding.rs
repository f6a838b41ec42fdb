//! Debounced existence validation of a single field.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::checker::CheckOutcome;
use crate::checker::ExistenceChecker;
use crate::config::ValidatorConfig;
use crate::error::CheckError;
use crate::error::Error;
use crate::form::FieldValues;
use crate::form::Form;
use crate::form::ListenerId;
use crate::view::ConflictView;

const UNKNOWN_ANSWER: &str = "Availability check returned an unexpected answer.";

/// Attaches debounced "already in use" checks to form fields.
///
/// All bindings created by one validator share its checker and view but
/// nothing else.
///
/// # Example
///
/// ```ignore
/// let form = Form::new();
/// let view = Arc::new(MemoryView::new());
/// let validator = Validator::new(Arc::new(HttpChecker::new("http://localhost:8000")?), view.clone());
///
/// let _bindings = validator.attach_all(&form, &config::default_bindings())?;
/// form.set_value("id_username", "alice");
/// ```
#[derive(Clone)]
pub struct Validator {
    checker: Arc<dyn ExistenceChecker>,
    view: Arc<dyn ConflictView>,
}

impl Validator {
    /// Creates a validator from a checker and the view showing its results.
    pub fn new(checker: Arc<dyn ExistenceChecker>, view: Arc<dyn ConflictView>) -> Self {
        Self { checker, view }
    }

    /// Starts validating `element_id` on every input event of `form`.
    ///
    /// The binding stays attached while the returned handle is alive; dropping
    /// the last handle removes its listener from the form.
    /// Attaching the same element twice registers two independent listeners.
    pub fn attach(
        &self,
        form: &Form,
        element_id: impl Into<String>,
        config: ValidatorConfig,
    ) -> Result<Arc<ValidatorBinding>, Error> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let element_id = element_id.into();
        config.validate(&element_id).map_err(Error::Config)?;

        let binding = Arc::new_cyclic(|weak: &Weak<ValidatorBinding>| {
            let weak = weak.clone();
            let listener = form.on_input(
                element_id.clone(),
                Arc::new(move |value: &str| {
                    if let Some(binding) = weak.upgrade() {
                        binding.on_input(value);
                    }
                }),
            );
            ValidatorBinding {
                element_id,
                config,
                checker: Arc::clone(&self.checker),
                view: Arc::clone(&self.view),
                form: form.clone(),
                listener,
                runtime,
                state: Mutex::new(BindingState::default()),
            }
        });

        Ok(binding)
    }

    /// Attaches one binding per entry of `bindings` (element id → config).
    pub fn attach_all(
        &self,
        form: &Form,
        bindings: &BTreeMap<String, ValidatorConfig>,
    ) -> Result<Vec<Arc<ValidatorBinding>>, Error> {
        bindings
            .iter()
            .map(|(element_id, config)| self.attach(form, element_id.clone(), config.clone()))
            .collect()
    }
}

#[derive(Default)]
struct BindingState {
    /// The scheduled check, if one is waiting out the debounce interval.
    pending: Option<JoinHandle<()>>,
    /// Incremented on every schedule; a timer only fires if it is current.
    timer: u64,
    /// Sequence number of the last request sent.
    issued: u64,
    /// Responses at or below this sequence number are stale.
    applied: u64,
}

/// One validated field and its check state.
pub struct ValidatorBinding {
    element_id: String,
    config: ValidatorConfig,
    checker: Arc<dyn ExistenceChecker>,
    view: Arc<dyn ConflictView>,
    form: Form,
    listener: ListenerId,
    runtime: Handle,
    state: Mutex<BindingState>,
}

impl ValidatorBinding {
    /// Id of the validated element.
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// The binding's configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check if a check is waiting out the debounce interval.
    pub fn has_pending(&self) -> bool {
        self.state.lock().map(|state| state.pending.is_some()).unwrap_or(false)
    }

    /// Number of requests sent so far.
    pub fn requests_sent(&self) -> u64 {
        self.state.lock().map(|state| state.issued).unwrap_or(0)
    }

    /// Check if nothing is scheduled and every sent request has been answered
    /// or superseded.
    pub fn is_settled(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.pending.is_none() && state.applied >= state.issued)
            .unwrap_or(true)
    }

    /// Handles an input event carrying the element's new value.
    pub fn on_input(self: &Arc<Self>, value: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.timer += 1;

        if value.is_empty() {
            // Nothing sent so far may annotate the now empty field.
            state.applied = state.issued;
            self.view.clear_conflict(&self.element_id);
            return;
        }

        let timer = state.timer;
        let delay = self.config.debounce_interval;
        let binding = Arc::clone(self);
        log::debug!("{}: check scheduled in {:?}", self.element_id, delay);

        state.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            binding.fire(timer).await;
        }));
    }

    async fn fire(&self, timer: u64) {
        let seq = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.timer != timer {
                return;
            }
            state.pending = None;
            state.issued += 1;
            state.issued
        };

        let params: Vec<(String, String)> = self
            .config
            .field_sources
            .iter()
            .map(|(param, source_id)| (param.clone(), self.form.value(source_id)))
            .collect();

        log::debug!("{}: sending check #{} to {}", self.element_id, seq, self.config.endpoint_url);
        let result = self.checker.check(&self.config.endpoint_url, &params).await;
        self.apply(seq, result);
    }

    fn apply(&self, seq: u64, result: Result<CheckOutcome, CheckError>) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if seq <= state.applied {
            log::debug!("{}: discarding stale response to check #{}", self.element_id, seq);
            return;
        }
        state.applied = seq;

        // The lock is held so an older response cannot land in between.
        match result {
            Ok(CheckOutcome::Taken) => self.view.show_conflict(&self.element_id, &self.config.conflict_message),
            Ok(CheckOutcome::Available) => self.view.clear_conflict(&self.element_id),
            Ok(CheckOutcome::Unknown) => {
                log::warn!("{}: response to check #{} has no boolean 'exists'", self.element_id, seq);
                self.view.show_unavailable(&self.element_id, UNKNOWN_ANSWER);
            }
            Err(e) => {
                log::warn!("{}: check #{} failed: {}", self.element_id, seq, e);
                self.view.show_unavailable(&self.element_id, e.reason());
            }
        }
    }
}

impl Drop for ValidatorBinding {
    fn drop(&mut self) {
        self.form.remove_listener(&self.element_id, self.listener);
    }
}

impl std::fmt::Debug for ValidatorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorBinding")
            .field("element_id", &self.element_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
