//! Test doubles shared by the unit tests of this crate.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use vas_bus::{handler, EventsBroker};
use vas_license::LicenseLimitationsService;
use vas_types::{ChangeNotifier, Property, ViewModel};

use crate::config::RuntimeConfig;
use crate::context::AppContext;
use crate::controller::{Controller, ControllerBase};
use crate::errors::BuildStage;
use crate::panel::{Panel, PanelHost};
use crate::screen_state::{Controllers, ScreenState};
use crate::state_controller::StateController;

pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().clone()
}

/// Index of `entry` in `log`; panics if absent.
pub(crate) fn position(log: &[String], entry: &str) -> usize {
    log.iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("`{entry}` not in {log:?}"))
}

pub(crate) fn context(config: RuntimeConfig) -> AppContext {
    let broker = EventsBroker::new();
    let licensing = Arc::new(LicenseLimitationsService::new(broker.clone()));
    AppContext::new(broker, config, licensing)
}

pub(crate) fn harness() -> (Arc<StateController>, Journal) {
    (
        StateController::new(context(RuntimeConfig::default()), None),
        Journal::default(),
    )
}

pub(crate) fn harness_with_history(max_history: usize) -> (Arc<StateController>, Journal) {
    let config = RuntimeConfig {
        max_history,
        ..RuntimeConfig::default()
    };
    (StateController::new(context(config), None), Journal::default())
}

pub(crate) fn harness_with_host(host: Arc<dyn PanelHost>) -> (Arc<StateController>, Journal) {
    (
        StateController::new(context(RuntimeConfig::default()), Some(host)),
        Journal::default(),
    )
}

#[derive(Debug, Clone)]
pub(crate) struct Ping;

pub(crate) struct PageViewModel {
    notifier: ChangeNotifier,
    pub(crate) title: Property<String>,
}

impl ViewModel for PageViewModel {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

/// Records `start`/`stop`/`ping` with its label.
pub(crate) struct RecordingController {
    base: ControllerBase<PageViewModel>,
    label: String,
    journal: Journal,
    refuse_restart: bool,
    starts: usize,
}

#[async_trait]
impl Controller<PageViewModel> for RecordingController {
    fn base(&self) -> &ControllerBase<PageViewModel> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase<PageViewModel> {
        &mut self.base
    }

    async fn connect_events(&mut self) -> anyhow::Result<()> {
        if self.refuse_restart && self.starts > 0 {
            anyhow::bail!("{} refused to restart", self.label);
        }
        self.starts += 1;
        self.journal.lock().push(format!("start {}", self.label));
        let label = self.label.clone();
        let journal = Arc::clone(&self.journal);
        self.base.subscribe(handler(move |_: &Ping| {
            journal.lock().push(format!("ping {label}"));
            Ok(())
        }))?;
        Ok(())
    }

    async fn disconnect_events(&mut self) -> anyhow::Result<()> {
        self.journal.lock().push(format!("stop {}", self.label));
        Ok(())
    }
}

pub(crate) struct RecordingPanel {
    title: String,
    journal: Journal,
}

impl Panel for RecordingPanel {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn on_load(&self) {
        self.journal.lock().push(format!("panel load {}", self.title));
    }

    fn on_unload(&self) {
        self.journal.lock().push(format!("panel unload {}", self.title));
    }
}

#[derive(Default)]
pub(crate) struct RecordingHost {
    calls: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, verb: &str, panel: &dyn Panel, is_modal: bool) {
        let modal = if is_modal { "modal " } else { "" };
        self.calls
            .lock()
            .push(format!("{verb} {modal}{}", panel.title()));
    }
}

impl PanelHost for RecordingHost {
    fn present(&self, panel: Arc<dyn Panel>, is_modal: bool) {
        self.record("present", panel.as_ref(), is_modal);
    }

    fn dismiss(&self, panel: Arc<dyn Panel>, is_modal: bool) {
        self.record("dismiss", panel.as_ref(), is_modal);
    }
}

/// How a [`PageState`] misbehaves.
#[derive(Clone, Default)]
pub(crate) struct Script {
    fail_at: Option<BuildStage>,
    refuse_restart: bool,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl Script {
    pub(crate) fn failing(stage: BuildStage) -> Self {
        Self {
            fail_at: Some(stage),
            ..Self::default()
        }
    }

    /// Controllers start once, then fail every later `connect_events`.
    pub(crate) fn refusing_restart() -> Self {
        Self {
            refuse_restart: true,
            ..Self::default()
        }
    }

    /// `load_data` signals `entered` and waits for `release`.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some((Arc::new(Notify::new()), Arc::new(Notify::new()))),
            ..Self::default()
        }
    }

    pub(crate) fn entered(&self) -> Arc<Notify> {
        self.gate
            .as_ref()
            .map(|(entered, _)| Arc::clone(entered))
            .unwrap_or_default()
    }

    pub(crate) fn release(&self) -> Arc<Notify> {
        self.gate
            .as_ref()
            .map(|(_, release)| Arc::clone(release))
            .unwrap_or_default()
    }

    fn check(&self, stage: BuildStage, label: &str) -> anyhow::Result<()> {
        if self.fail_at == Some(stage) {
            anyhow::bail!("{label} refused {stage}");
        }
        Ok(())
    }
}

/// Screen with two recording controllers and a recording panel.
pub(crate) struct PageState {
    label: String,
    script: Script,
    journal: Journal,
    broker: EventsBroker,
    panel: Arc<RecordingPanel>,
}

#[async_trait]
impl ScreenState for PageState {
    type ViewModel = PageViewModel;
    type Data = ();

    fn create_view_model(&mut self, _data: &()) -> anyhow::Result<Arc<PageViewModel>> {
        self.journal
            .lock()
            .push(format!("create_view_model {}", self.label));
        self.script.check(BuildStage::CreateViewModel, &self.label)?;
        Ok(Arc::new(PageViewModel {
            notifier: ChangeNotifier::new(),
            title: Property::new("title", self.label.clone()),
        }))
    }

    fn create_controllers(&mut self, _data: &()) -> anyhow::Result<Controllers<PageViewModel>> {
        self.journal
            .lock()
            .push(format!("create_controllers {}", self.label));
        self.script.check(BuildStage::CreateControllers, &self.label)?;

        let controllers: Controllers<PageViewModel> = ["a", "b"]
            .into_iter()
            .map(|suffix| {
                let label = format!("{}.{suffix}", self.label);
                Box::new(RecordingController {
                    base: ControllerBase::new(label.clone(), self.broker.clone()),
                    label,
                    journal: Arc::clone(&self.journal),
                    refuse_restart: self.script.refuse_restart,
                    starts: 0,
                }) as Box<dyn Controller<PageViewModel>>
            })
            .collect();
        Ok(controllers)
    }

    async fn load_data(&mut self, view_model: &Arc<PageViewModel>, _data: &()) -> anyhow::Result<()> {
        self.journal
            .lock()
            .push(format!("load {}", view_model.title.get()));
        if let Some((entered, release)) = &self.script.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.script.check(BuildStage::LoadState, &self.label)
    }

    fn panel(&self) -> Option<Arc<dyn Panel>> {
        Some(Arc::clone(&self.panel) as Arc<dyn Panel>)
    }
}

/// Factory for a [`PageState`] labelled `label`.
pub(crate) fn page(
    label: &str,
    script: Script,
    journal: &Journal,
) -> impl Fn(&AppContext) -> PageState + Send + Sync + 'static {
    let label = label.to_string();
    let journal = Arc::clone(journal);
    move |context: &AppContext| PageState {
        label: label.clone(),
        script: script.clone(),
        journal: Arc::clone(&journal),
        broker: context.broker().clone(),
        panel: Arc::new(RecordingPanel {
            title: label.clone(),
            journal: Arc::clone(&journal),
        }),
    }
}
