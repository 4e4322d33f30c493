/// Control Dispatch Tests
///
/// Notification button actions travel through the fake broadcast transport
/// into the registered listener.

#[cfg(test)]
mod control_dispatch_tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::control::ControlSignal;
    use crate::events::{ServiceEvent, ServiceEvents};
    use crate::tests::test_helpers::*;

    #[test]
    fn test_double_registration_delivers_each_signal_once() {
        let platform = TestPlatform::new();
        let listener = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&listener);

        binder.register_control_receiver().unwrap();
        binder.register_control_receiver().unwrap();
        assert_eq!(platform.transport.subscription_count(), 1);

        platform.transport.raise_signal(ControlSignal::Next);

        assert_eq!(listener.signals(), vec![ControlSignal::Next]);
    }

    #[test]
    fn test_signal_without_listener_is_dropped() {
        let platform = TestPlatform::new();
        let binder = platform.binder();
        binder.register_control_receiver().unwrap();

        platform.transport.raise_signal(ControlSignal::PlayPause);
        platform.transport.raise_signal(ControlSignal::Stop);

        let listener = RecordingListener::new();
        binder.attach(Some(&as_listener(&listener)));
        platform.host.connect_latest();

        let events = listener.events();
        assert_eq!(events.len(), 1, "earlier signals must not be queued");
        assert!(matches!(events[0], ServiceEvent::Binder(_)));
    }

    #[test]
    fn test_signals_arrive_in_order() {
        let platform = TestPlatform::new();
        let listener = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&listener);
        binder.register_control_receiver().unwrap();

        for signal in ControlSignal::ALL {
            platform.transport.raise_signal(signal);
        }
        platform.transport.raise_signal(ControlSignal::Next);

        let mut expected = ControlSignal::ALL.to_vec();
        expected.push(ControlSignal::Next);
        assert_eq!(listener.signals(), expected);
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        let platform = TestPlatform::new();
        let listener = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&listener);
        binder.register_control_receiver().unwrap();

        let handler_actions = ControlSignal::actions();
        assert!(!handler_actions.contains(&"audio_manager.action.SHUFFLE"));

        platform.transport.deliver_unfiltered("audio_manager.action.SHUFFLE");
        platform.transport.deliver_unfiltered(ControlSignal::Stop.action());

        assert_eq!(listener.signals(), vec![ControlSignal::Stop]);
    }

    #[test]
    fn test_no_delivery_after_detach() {
        let platform = TestPlatform::new();
        let listener = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&listener);
        binder.register_control_receiver().unwrap();

        binder.detach();
        platform.transport.raise_signal(ControlSignal::Next);

        assert!(listener.signals().is_empty());
        assert!(!binder.control_bus().has_listener());
    }

    #[test]
    fn test_failed_registration_can_be_retried() {
        let platform = TestPlatform::new();
        platform.transport.fail_subscribe.store(true, Ordering::SeqCst);
        let listener = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&listener);

        assert!(binder.register_control_receiver().is_err());
        assert_eq!(platform.transport.subscription_count(), 0);

        platform.transport.fail_subscribe.store(false, Ordering::SeqCst);
        binder.register_control_receiver().unwrap();
        platform.transport.raise_signal(ControlSignal::Previous);

        assert_eq!(listener.signals(), vec![ControlSignal::Previous]);
    }

    #[test]
    fn test_listener_can_detach_from_its_own_callback() {
        let platform = TestPlatform::new();
        let recorder = RecordingListener::new();
        let (binder, session) = platform.connected_binder(&recorder);
        binder.register_control_receiver().unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        let stopper: Arc<dyn ServiceEvents> = {
            let binder = binder.clone();
            let received = received.clone();
            Arc::new(move |event: ServiceEvent| {
                if event.signal().is_some() {
                    received.fetch_add(1, Ordering::SeqCst);
                }
                if matches!(event, ServiceEvent::Stop) {
                    binder.detach();
                }
            })
        };
        binder.attach(Some(&stopper));

        platform.transport.raise_signal(ControlSignal::Stop);
        assert!(!binder.is_connected());
        assert!(!session.is_active());

        platform.transport.raise_signal(ControlSignal::Next);
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detach_waits_for_in_flight_delivery() {
        let platform = TestPlatform::new();
        let recorder = RecordingListener::new();
        let (binder, _) = platform.connected_binder(&recorder);
        binder.register_control_receiver().unwrap();

        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let slow: Arc<dyn ServiceEvents> = {
            let started = started.clone();
            let finished = finished.clone();
            Arc::new(move |event: ServiceEvent| {
                if matches!(event, ServiceEvent::Next) {
                    started.store(true, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(200));
                    finished.store(true, Ordering::SeqCst);
                }
            })
        };
        binder.attach(Some(&slow));

        let transport = platform.transport.clone();
        let raiser = std::thread::spawn(move || transport.raise_signal(ControlSignal::Next));

        while !started.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        binder.detach();

        assert!(
            finished.load(Ordering::SeqCst),
            "detach returned while the listener was still running"
        );
        raiser.join().unwrap();
    }
}
