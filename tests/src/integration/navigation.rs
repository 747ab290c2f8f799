//! # Navigation Scenarios
//!
//! Drives `StateController` through `AppRuntime` with real controllers
//! subscribed to the broker.
//!
//! ## Flows Tested
//!
//! 1. Home → Editor where the editor's controllers cannot be created:
//!    the error is reported and Home stays current and live.
//! 2. Home → Editor → back: controllers of the hidden screen never see
//!    events, the resumed screen does.
//! 3. Typed routes carry per-screen data into the view model.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use vas_bus::{handler, EventsBroker, NavigationEvent};
    use vas_runtime::{
        AppContext, AppRuntime, BuildStage, Controller, ControllerBase, Controllers,
        NavigationError, RuntimeConfig, ScreenState, StateError,
    };
    use vas_types::{ChangeNotifier, Property, ViewModel};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    type Log = Arc<Mutex<Vec<String>>>;

    /// Toolbar button pressed in the view layer.
    #[derive(Debug, Clone)]
    struct Play;

    struct ScreenViewModel {
        notifier: ChangeNotifier,
        label: Property<String>,
        plays: Property<u32>,
    }

    impl ViewModel for ScreenViewModel {
        fn notifier(&self) -> &ChangeNotifier {
            &self.notifier
        }
    }

    struct PlaybackController {
        base: ControllerBase<ScreenViewModel>,
        log: Log,
    }

    #[async_trait]
    impl Controller<ScreenViewModel> for PlaybackController {
        fn base(&self) -> &ControllerBase<ScreenViewModel> {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ControllerBase<ScreenViewModel> {
            &mut self.base
        }

        async fn connect_events(&mut self) -> anyhow::Result<()> {
            let view_model = self.base.view_model()?;
            let log = Arc::clone(&self.log);
            self.base.subscribe(handler(move |_: &Play| {
                let plays = view_model.plays.get() + 1;
                view_model.plays.set(plays, &view_model.notifier);
                log.lock().push(format!("play {}", view_model.label.get()));
                Ok(())
            }))?;
            self.log.lock().push(format!("start {}", self.base.name()));
            Ok(())
        }

        async fn disconnect_events(&mut self) -> anyhow::Result<()> {
            self.log.lock().push(format!("stop {}", self.base.name()));
            Ok(())
        }
    }

    /// Screen whose data is the label shown in its view model.
    struct LabelledScreen {
        name: String,
        broker: EventsBroker,
        log: Log,
        refuse_controllers: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ScreenState for LabelledScreen {
        type ViewModel = ScreenViewModel;
        type Data = String;

        fn create_view_model(&mut self, label: &String) -> anyhow::Result<Arc<ScreenViewModel>> {
            self.log.lock().push(format!("build {}", self.name));
            Ok(Arc::new(ScreenViewModel {
                notifier: ChangeNotifier::new(),
                label: Property::new("label", label.clone()),
                plays: Property::new("plays", 0),
            }))
        }

        fn create_controllers(&mut self, _label: &String) -> anyhow::Result<Controllers<ScreenViewModel>> {
            if self.refuse_controllers.load(Ordering::SeqCst) {
                anyhow::bail!("codec missing");
            }
            let controller = PlaybackController {
                base: ControllerBase::new(self.name.clone(), self.broker.clone()),
                log: Arc::clone(&self.log),
            };
            Ok(vec![Box::new(controller) as Box<dyn Controller<ScreenViewModel>>])
        }
    }

    fn screen(
        name: &str,
        log: &Log,
        refuse_controllers: &Arc<AtomicBool>,
    ) -> impl Fn(&AppContext) -> LabelledScreen + Send + Sync + 'static {
        let name = name.to_string();
        let log = Arc::clone(log);
        let refuse_controllers = Arc::clone(refuse_controllers);
        move |context: &AppContext| LabelledScreen {
            name: name.clone(),
            broker: context.broker().clone(),
            log: Arc::clone(&log),
            refuse_controllers: Arc::clone(&refuse_controllers),
        }
    }

    struct Fixture {
        runtime: AppRuntime,
        log: Log,
        editor_broken: Arc<AtomicBool>,
    }

    async fn started_at_home() -> Fixture {
        let runtime = AppRuntime::new(RuntimeConfig::default()).unwrap();
        let log = Log::default();
        let editor_broken = Arc::new(AtomicBool::new(false));
        let healthy = Arc::new(AtomicBool::new(false));

        let navigator = runtime.navigator();
        navigator.register("home", screen("home", &log, &healthy)).unwrap();
        navigator
            .register("editor", screen("editor", &log, &editor_broken))
            .unwrap();
        navigator.set_home("home", "Projects".to_string()).unwrap();

        runtime.start().await.unwrap();
        Fixture {
            runtime,
            log,
            editor_broken,
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().clone()
    }

    // =========================================================================
    // INTEGRATION TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_failed_editor_keeps_home_current() {
        let fixture = started_at_home().await;
        fixture.editor_broken.store(true, Ordering::SeqCst);
        let navigator = fixture.runtime.navigator();

        let err = navigator
            .move_to("editor", "Holiday cut".to_string())
            .await
            .unwrap_err();

        match err {
            NavigationError::StateLoadError { state, source } => {
                assert_eq!(state, "editor");
                assert!(matches!(
                    source,
                    StateError::Hook {
                        stage: BuildStage::CreateControllers,
                        ..
                    }
                ));
                assert!(source.to_string().contains("codec missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(navigator.current().as_deref(), Some("home"));

        // Home listens again
        fixture.runtime.context().broker().publish(&Play);
        assert_eq!(entries(&fixture.log).last().map(String::as_str), Some("play Projects"));
    }

    #[tokio::test]
    async fn test_hidden_screen_does_not_receive_events() {
        let fixture = started_at_home().await;
        let navigator = fixture.runtime.navigator();
        let broker = fixture.runtime.context().broker();

        navigator
            .move_to("editor", "Holiday cut".to_string())
            .await
            .unwrap();
        broker.publish(&Play);
        navigator.move_back().await.unwrap();
        broker.publish(&Play);

        assert_eq!(
            entries(&fixture.log),
            vec![
                "build home",
                "start home",
                "stop home",
                "build editor",
                "start editor",
                "play Holiday cut",
                "stop editor",
                "start home",
                "play Projects",
            ]
        );
    }

    #[tokio::test]
    async fn test_typed_route_and_navigation_events() {
        let runtime = AppRuntime::new(RuntimeConfig::default()).unwrap();
        let log = Log::default();
        let healthy = Arc::new(AtomicBool::new(false));
        let editor = runtime
            .navigator()
            .register("editor", screen("editor", &log, &healthy))
            .unwrap();
        let mut events = runtime.context().broker().stream::<NavigationEvent>();

        runtime.start().await.unwrap();
        assert_eq!(runtime.navigator().current(), None);

        runtime
            .navigator()
            .move_to_route(&editor, "Wedding".to_string())
            .await
            .unwrap();
        runtime.context().broker().publish(&Play);

        assert_eq!(events.try_recv(), Some(NavigationEvent::to("editor")));
        assert!(entries(&log).contains(&"play Wedding".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_leaves_no_subscriptions() {
        let fixture = started_at_home().await;
        fixture
            .runtime
            .navigator()
            .move_to("editor", "Holiday cut".to_string())
            .await
            .unwrap();

        fixture.runtime.shutdown().await.unwrap();

        let broker = fixture.runtime.context().broker();
        assert_eq!(broker.subscriber_count::<Play>(), 0);
        assert!(fixture.runtime.navigator().history().is_empty());
    }
}
