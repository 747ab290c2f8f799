//! # VAS Demo
//!
//! Headless session driving the runtime end to end: a project list home
//! screen, an editor screen with a bound title field, license limits coming
//! in through the broker, and a clean shutdown.
//!
//! ## Script
//!
//! 1. Start services and show `home`
//! 2. Apply a license allowing two projects
//! 3. Create projects until the limit stops us
//! 4. Open `editor`, rename the project from the (headless) widget
//! 5. Go back home, then shut down
//!
//! Ctrl+C interrupts the script and still shuts down cleanly.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};
use vas_binding::{BindingSet, HeadlessWidget, PropertyAccessor, PropertyBinding, Widget};
use vas_bus::{handler, EventsBroker, NavigationEvent};
use vas_license::{LicenseChangeEvent, LicenseLimitation, LicenseLimitationsService};
use vas_runtime::{
    AppContext, AppRuntime, Controller, ControllerBase, Controllers, Panel, RuntimeConfig,
    ScreenState,
};
use vas_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use vas_types::{ChangeNotifier, Property, ViewModel};

// =============================================================================
// Events
// =============================================================================

/// The user asked for a new project.
#[derive(Debug, Clone)]
struct CreateProject;

// =============================================================================
// Home screen
// =============================================================================

struct ProjectsViewModel {
    notifier: ChangeNotifier,
    projects: Property<u32>,
    status: Property<String>,
}

impl ViewModel for ProjectsViewModel {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

struct ProjectsController {
    base: ControllerBase<ProjectsViewModel>,
    licensing: Arc<LicenseLimitationsService>,
}

#[async_trait]
impl Controller<ProjectsViewModel> for ProjectsController {
    fn base(&self) -> &ControllerBase<ProjectsViewModel> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase<ProjectsViewModel> {
        &mut self.base
    }

    async fn connect_events(&mut self) -> Result<()> {
        let view_model = self.base.view_model()?;
        let licensing = Arc::clone(&self.licensing);

        self.base.subscribe(handler(move |_: &CreateProject| {
            let count = view_model.projects.get();
            if licensing.can_execute("projects", count) {
                view_model.projects.set(count + 1, &view_model.notifier);
                view_model
                    .status
                    .set(format!("{} project(s)", count + 1), &view_model.notifier);
            } else {
                view_model
                    .status
                    .set("Project limit reached".to_string(), &view_model.notifier);
            }
            Ok(())
        }))?;

        let view_model = self.base.view_model()?;
        self.base.watch_view_model(move |change| {
            if change.affects("status") {
                info!(status = %view_model.status.get(), "Home status changed");
            }
        })?;
        Ok(())
    }
}

struct HomeState {
    broker: EventsBroker,
    licensing: Arc<LicenseLimitationsService>,
}

#[async_trait]
impl ScreenState for HomeState {
    type ViewModel = ProjectsViewModel;
    type Data = ();

    fn create_view_model(&mut self, _data: &()) -> Result<Arc<ProjectsViewModel>> {
        Ok(Arc::new(ProjectsViewModel {
            notifier: ChangeNotifier::new(),
            projects: Property::new("projects", 0),
            status: Property::new("status", "No projects".to_string()),
        }))
    }

    fn create_controllers(&mut self, _data: &()) -> Result<Controllers<ProjectsViewModel>> {
        let projects = ProjectsController {
            base: ControllerBase::new("projects", self.broker.clone()),
            licensing: Arc::clone(&self.licensing),
        };
        Ok(vec![Box::new(projects) as Box<dyn Controller<ProjectsViewModel>>])
    }
}

// =============================================================================
// Editor screen
// =============================================================================

struct EditorViewModel {
    notifier: ChangeNotifier,
    title: Property<String>,
}

impl ViewModel for EditorViewModel {
    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

struct EditorController {
    base: ControllerBase<EditorViewModel>,
}

#[async_trait]
impl Controller<EditorViewModel> for EditorController {
    fn base(&self) -> &ControllerBase<EditorViewModel> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ControllerBase<EditorViewModel> {
        &mut self.base
    }

    async fn connect_events(&mut self) -> Result<()> {
        let view_model = self.base.view_model()?;
        self.base.watch_view_model(move |change| {
            if change.affects("title") {
                info!(title = %view_model.title.get(), "Project renamed");
            }
        })?;
        Ok(())
    }
}

/// Title field bound to the editor view model while shown.
struct EditorPanel {
    bindings: BindingSet,
}

impl Panel for EditorPanel {
    fn title(&self) -> String {
        "Editor".to_string()
    }

    fn on_load(&self) {
        if let Err(e) = self.bindings.bind_all() {
            warn!(error = %e, "Editor bindings failed");
        }
    }

    fn on_unload(&self) {
        self.bindings.unbind_all();
    }
}

struct EditorState {
    broker: EventsBroker,
    title_field: Arc<HeadlessWidget<String>>,
    panel: Option<Arc<EditorPanel>>,
}

#[async_trait]
impl ScreenState for EditorState {
    type ViewModel = EditorViewModel;
    /// Project name
    type Data = String;

    fn create_view_model(&mut self, project: &String) -> Result<Arc<EditorViewModel>> {
        let view_model = Arc::new(EditorViewModel {
            notifier: ChangeNotifier::new(),
            title: Property::new("title", project.clone()),
        });

        let title = PropertyBinding::new(
            Arc::clone(&view_model),
            PropertyAccessor::new(
                "title",
                |vm: &EditorViewModel| vm.title.get(),
                |vm: &EditorViewModel, value| {
                    vm.title.set(value, &vm.notifier);
                },
            ),
            Arc::clone(&self.title_field),
        );
        let mut bindings = BindingSet::new();
        bindings.add(title);
        self.panel = Some(Arc::new(EditorPanel { bindings }));

        Ok(view_model)
    }

    fn create_controllers(&mut self, _project: &String) -> Result<Controllers<EditorViewModel>> {
        let editor = EditorController {
            base: ControllerBase::new("editor", self.broker.clone()),
        };
        Ok(vec![Box::new(editor) as Box<dyn Controller<EditorViewModel>>])
    }

    fn panel(&self) -> Option<Arc<dyn Panel>> {
        self.panel
            .as_ref()
            .map(|panel| Arc::clone(panel) as Arc<dyn Panel>)
    }
}

// =============================================================================
// Session
// =============================================================================

fn register_screens(runtime: &AppRuntime, title_field: &Arc<HeadlessWidget<String>>) -> Result<()> {
    let navigator = runtime.navigator();

    navigator.register("home", |context: &AppContext| HomeState {
        broker: context.broker().clone(),
        licensing: Arc::clone(context.licensing()),
    })?;

    let title_field = Arc::clone(title_field);
    navigator.register("editor", move |context: &AppContext| EditorState {
        broker: context.broker().clone(),
        title_field: Arc::clone(&title_field),
        panel: None,
    })?;

    Ok(())
}

async fn run_script(runtime: &AppRuntime, title_field: &HeadlessWidget<String>) -> Result<()> {
    let broker = runtime.context().broker();
    let navigator = runtime.navigator();

    broker
        .publish_all(LicenseChangeEvent {
            limitations: vec![LicenseLimitation::count("projects", 2)],
        })
        .await?;

    for _ in 0..3 {
        broker.publish(&CreateProject);
    }

    navigator
        .move_to("editor", "Holiday cut".to_string())
        .await
        .context("failed to open the editor")?;
    info!(title = %title_field.value(), "Editor shows project");

    title_field.edit("Holiday cut (final)".to_string());

    navigator.move_back().await?;
    info!(history = ?navigator.history(), "Back home");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry)?;

    let config = RuntimeConfig::from_env()?;
    let runtime = AppRuntime::new(config)?;

    let title_field = Arc::new(HeadlessWidget::new(String::new()));
    register_screens(&runtime, &title_field)?;

    let mut navigations = runtime.context().broker().stream::<NavigationEvent>();
    tokio::spawn(async move {
        while let Some(event) = navigations.recv().await {
            info!(screen = ?event.name, modal = event.is_modal, "Screen changed");
        }
    });

    runtime.start().await?;

    tokio::select! {
        result = run_script(&runtime, &title_field) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    runtime.shutdown().await?;

    if let Ok(metrics) = encode_metrics() {
        info!("Metrics:\n{}", metrics);
    }
    Ok(())
}
