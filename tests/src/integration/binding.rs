//! # Binding Scenarios
//!
//! `PropertyBinding` between live view models and headless widgets, with
//! the view model driven both by broker events and by widget edits.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vas_binding::{
        converter, BindingError, BindingSet, ConversionError, Converter, HeadlessWidget, PropertyAccessor,
        PropertyBinding, Widget,
    };
    use vas_bus::{handler, EventsBroker};
    use vas_types::{ChangeNotifier, Property, ViewModel};

    struct TrackViewModel {
        notifier: ChangeNotifier,
        name: Property<String>,
        /// Playback position in milliseconds
        position: Property<u64>,
    }

    impl TrackViewModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                notifier: ChangeNotifier::new(),
                name: Property::new("name", "Intro".to_string()),
                position: Property::new("position", 0),
            })
        }
    }

    impl ViewModel for TrackViewModel {
        fn notifier(&self) -> &ChangeNotifier {
            &self.notifier
        }
    }

    #[derive(Debug, Clone)]
    struct Seek(u64);

    fn name_accessor() -> PropertyAccessor<TrackViewModel, String> {
        PropertyAccessor::new(
            "name",
            |vm: &TrackViewModel| vm.name.get(),
            |vm: &TrackViewModel, value| {
                vm.name.set(value, &vm.notifier);
            },
        )
    }

    fn position_accessor() -> PropertyAccessor<TrackViewModel, u64> {
        PropertyAccessor::new(
            "position",
            |vm: &TrackViewModel| vm.position.get(),
            |vm: &TrackViewModel, value| {
                vm.position.set(value, &vm.notifier);
            },
        )
    }

    /// Milliseconds shown as `m:ss` in a text field.
    fn timecode() -> impl Converter<u64, String> + 'static {
        converter(
            |ms: u64| format!("{}:{:02}", ms / 60_000, (ms / 1000) % 60),
            |text: String| -> Result<u64, ConversionError> {
                let (minutes, seconds) = text
                    .split_once(':')
                    .ok_or_else(|| ConversionError::new("expected m:ss"))?;
                let minutes: u64 = minutes.parse().map_err(|_| ConversionError::new("bad minutes"))?;
                let seconds: u64 = seconds.parse().map_err(|_| ConversionError::new("bad seconds"))?;
                Ok((minutes * 60 + seconds) * 1000)
            },
        )
    }

    #[tokio::test]
    async fn test_broker_event_reaches_widget_through_view_model() {
        let broker = EventsBroker::new();
        let view_model = TrackViewModel::new();
        let field = Arc::new(HeadlessWidget::new(String::new()));

        let target = Arc::clone(&view_model);
        broker.subscribe(handler(move |seek: &Seek| {
            target.position.set(seek.0, &target.notifier);
            Ok(())
        }));

        let binding = PropertyBinding::with_converter(
            Arc::clone(&view_model),
            position_accessor(),
            Arc::clone(&field),
            timecode(),
        );
        binding.bind().unwrap();
        assert_eq!(field.value(), "0:00");

        broker.publish(&Seek(75_000));
        assert_eq!(field.value(), "1:15");

        field.edit("2:05".to_string());
        assert_eq!(view_model.position.get(), 125_000);

        // Unparsable input is ignored
        field.edit("soon".to_string());
        assert_eq!(view_model.position.get(), 125_000);
    }

    #[test]
    fn test_two_fields_on_one_property_stay_in_sync() {
        let view_model = TrackViewModel::new();
        let first = Arc::new(HeadlessWidget::new(String::new()));
        let second = Arc::new(HeadlessWidget::new(String::new()));

        let mut set = BindingSet::new();
        set.add(PropertyBinding::new(
            Arc::clone(&view_model),
            name_accessor(),
            Arc::clone(&first),
        ))
        .add(PropertyBinding::new(
            Arc::clone(&view_model),
            name_accessor(),
            Arc::clone(&second),
        ));
        set.bind_all().unwrap();

        first.edit("Chorus".to_string());

        assert_eq!(view_model.name.get(), "Chorus");
        assert_eq!(second.value(), "Chorus");
        // One write per change, no ping-pong
        assert_eq!(second.writes(), 2);

        set.unbind_all();
        view_model.name.set("Outro".to_string(), &view_model.notifier);
        assert_eq!(first.value(), "Chorus");
        assert_eq!(second.value(), "Chorus");
    }

    #[test]
    fn test_mismatched_types_fail_at_bind() {
        let view_model = TrackViewModel::new();
        let field = Arc::new(HeadlessWidget::new(String::new()));

        let binding: PropertyBinding<TrackViewModel, u64, String> =
            PropertyBinding::new(Arc::clone(&view_model), position_accessor(), Arc::clone(&field));

        assert!(matches!(
            binding.bind(),
            Err(BindingError::IncompatibleBindingTypes {
                property: "position",
                ..
            })
        ));
        assert_eq!(field.writes(), 0);
        assert_eq!(view_model.notifier().listener_count(), 0);
    }
}
