//! # Licensing Scenarios
//!
//! License records arrive as JSON from the licensing backend, are published
//! on the broker and gate an action taken by a controller.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use vas_bus::{handler, EventsBroker};
    use vas_license::{LicenseChangeEvent, LicenseLimitation, LicenseLimitations, LicenseLimitationsService};
    use vas_runtime::{
        AppContext, AppRuntime, Controller, ControllerBase, Controllers, RuntimeConfig, ScreenState,
    };
    use vas_types::{ChangeNotifier, Property, Service, ServiceStatus, ViewModel};

    const LICENSE_JSON: &str = r#"{
        "limitations": [
            { "name": "dashboards", "enabled": true, "maximum": 5, "kind": "count" },
            { "name": "dashboards", "enabled": true, "maximum": 2, "kind": "count" },
            { "name": "export",     "enabled": true, "maximum": 0, "kind": "feature" }
        ]
    }"#;

    #[derive(Debug, Clone)]
    struct AddDashboard;

    struct DashboardsViewModel {
        notifier: ChangeNotifier,
        dashboards: Property<u32>,
        upgrade_prompts: Property<u32>,
    }

    impl ViewModel for DashboardsViewModel {
        fn notifier(&self) -> &ChangeNotifier {
            &self.notifier
        }
    }

    struct DashboardsController {
        base: ControllerBase<DashboardsViewModel>,
        licensing: Arc<LicenseLimitationsService>,
    }

    #[async_trait]
    impl Controller<DashboardsViewModel> for DashboardsController {
        fn base(&self) -> &ControllerBase<DashboardsViewModel> {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ControllerBase<DashboardsViewModel> {
            &mut self.base
        }

        async fn connect_events(&mut self) -> anyhow::Result<()> {
            let view_model = self.base.view_model()?;
            let licensing = Arc::clone(&self.licensing);
            self.base.subscribe(handler(move |_: &AddDashboard| {
                let count = view_model.dashboards.get();
                if licensing.can_execute("dashboards", count) {
                    view_model.dashboards.set(count + 1, &view_model.notifier);
                } else {
                    let prompts = view_model.upgrade_prompts.get() + 1;
                    view_model.upgrade_prompts.set(prompts, &view_model.notifier);
                }
                Ok(())
            }))?;
            Ok(())
        }
    }

    struct DashboardsScreen {
        broker: EventsBroker,
        licensing: Arc<LicenseLimitationsService>,
        view_model: Arc<DashboardsViewModel>,
    }

    #[async_trait]
    impl ScreenState for DashboardsScreen {
        type ViewModel = DashboardsViewModel;
        type Data = ();

        fn create_view_model(&mut self, _data: &()) -> anyhow::Result<Arc<DashboardsViewModel>> {
            Ok(Arc::clone(&self.view_model))
        }

        fn create_controllers(&mut self, _data: &()) -> anyhow::Result<Controllers<DashboardsViewModel>> {
            let controller = DashboardsController {
                base: ControllerBase::new("dashboards", self.broker.clone()),
                licensing: Arc::clone(&self.licensing),
            };
            Ok(vec![Box::new(controller) as Box<dyn Controller<DashboardsViewModel>>])
        }
    }

    #[tokio::test]
    async fn test_license_from_json_gates_controller_action() {
        let runtime = AppRuntime::new(RuntimeConfig::default()).unwrap();
        let view_model = Arc::new(DashboardsViewModel {
            notifier: ChangeNotifier::new(),
            dashboards: Property::new("dashboards", 0),
            upgrade_prompts: Property::new("upgrade_prompts", 0),
        });

        let shared = Arc::clone(&view_model);
        runtime
            .navigator()
            .register("home", move |context: &AppContext| DashboardsScreen {
                broker: context.broker().clone(),
                licensing: Arc::clone(context.licensing()),
                view_model: Arc::clone(&shared),
            })
            .unwrap();
        runtime.start().await.unwrap();

        let license: LicenseChangeEvent = serde_json::from_str(LICENSE_JSON).unwrap();
        runtime.context().broker().publish_all(license).await.unwrap();

        let broker = runtime.context().broker();
        for _ in 0..4 {
            broker.publish(&AddDashboard);
        }

        // The stricter of the two dashboard records wins
        assert_eq!(view_model.dashboards.get(), 2);
        assert_eq!(view_model.upgrade_prompts.get(), 2);
        assert!(!runtime.licensing().can_execute("export", 0));
        assert_eq!(runtime.licensing().limitations(Some("dashboards")).len(), 2);
    }

    #[tokio::test]
    async fn test_stopped_service_ignores_license_changes() {
        let broker = EventsBroker::new();
        let service = LicenseLimitationsService::new(broker.clone());
        service.start().await.unwrap();
        broker.publish(&LicenseChangeEvent {
            limitations: vec![LicenseLimitation::count("projects", 1)],
        });
        assert!(!service.can_execute("projects", 1));

        service.stop().await.unwrap();
        broker.publish(&LicenseChangeEvent {
            limitations: vec![LicenseLimitation::count("projects", 10)],
        });

        assert!(!service.can_execute("projects", 1));
        assert_eq!(broker.subscriber_count::<LicenseChangeEvent>(), 0);
    }

    #[tokio::test]
    async fn test_runtime_tracks_service_status() {
        let runtime = AppRuntime::new(RuntimeConfig::default()).unwrap();
        assert_eq!(
            runtime.services().status("License limitations"),
            Some(ServiceStatus::Registered)
        );

        runtime.start().await.unwrap();
        runtime.shutdown().await.unwrap();

        assert_eq!(
            runtime.services().status("License limitations"),
            Some(ServiceStatus::Stopped)
        );
    }

    #[test]
    fn test_registry_keeps_tier_order() {
        let registry: LicenseLimitations<LicenseLimitation> = [
            LicenseLimitation::count("A", 10),
            LicenseLimitation::count("A", 20),
            LicenseLimitation::count("B", 5),
        ]
        .into_iter()
        .collect();

        let maxima: Vec<u32> = registry
            .get_limitations(Some("A"))
            .into_iter()
            .map(|l| l.maximum)
            .collect();
        assert_eq!(maxima, vec![10, 20]);
        assert_eq!(registry.get_limitations(None).len(), 3);
        assert!(registry.get_limitations(Some("C")).is_empty());
    }
}
