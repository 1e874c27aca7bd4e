mod common;

#[cfg(test)]
mod client_tests {
    use std::time::{Duration, Instant};

    use super::common::{report, Behavior, MockBackend};
    use headset_battery::hid::status::BATTERY_REQUEST;
    use headset_battery::hid::{BatteryClient, BatteryStatus, DeviceIdentity, ProtocolVariant};

    const VID: u16 = 0x0951;
    const PID: u16 = 0x16c4;

    fn client(backend: MockBackend, variant: ProtocolVariant) -> BatteryClient<MockBackend> {
        BatteryClient::new(backend, vec![DeviceIdentity::new(VID, PID)], variant)
            .with_read_timeout(Duration::from_millis(50))
    }

    #[test]
    fn test_short_circuits_on_first_valid_reading() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::Report(report(0x0e, 100)))
            .with_device(VID, PID, 1, Behavior::Report(report(0x0f, 130)));
        let calls = backend.calls();

        let status = client(backend, ProtocolVariant::A).poll();

        assert_eq!(status.percentage(), Some(15));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.opened, vec![0]);
        assert_eq!(calls.written, vec![0]);
        assert_eq!(calls.read, vec![0]);
        assert_eq!(calls.closed, vec![0]);
    }

    #[test]
    fn test_read_failure_does_not_abort_scan() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::FailRead)
            .with_device(VID, PID, 1, Behavior::Report(report(0x0f, 60)));
        let calls = backend.calls();

        let status = client(backend, ProtocolVariant::A).poll();

        assert_eq!(status.percentage(), Some(80));
        assert_eq!(calls.lock().unwrap().opened, vec![0, 1]);
    }

    #[test]
    fn test_read_failure_on_last_candidate_is_inactive() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::Report(vec![0; 8]))
            .with_device(VID, PID, 1, Behavior::FailRead);

        let status = client(backend, ProtocolVariant::A).poll();
        assert_eq!(status, BatteryStatus::inactive());
    }

    #[test]
    fn test_all_zero_report_is_no_data() {
        for variant in [ProtocolVariant::A, ProtocolVariant::B] {
            let backend = MockBackend::new()
                .with_device(VID, PID, 0, Behavior::Report(vec![0; 8]));
            let status = client(backend, variant).poll();
            assert_eq!(status, BatteryStatus::inactive(), "{:?}", variant);
        }
    }

    #[test]
    fn test_open_and_write_failures_are_skipped() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::FailOpen)
            .with_device(VID, PID, 1, Behavior::FailWrite)
            .with_device(VID, PID, 2, Behavior::ShortWrite)
            .with_device(VID, PID, 3, Behavior::Report(report(0x0e, 250)));
        let calls = backend.calls();

        let status = client(backend, ProtocolVariant::A).poll();

        assert_eq!(status.percentage(), Some(65));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.opened, vec![0, 1, 2, 3]);
        // short write never reaches the read
        assert_eq!(calls.read, vec![3]);
    }

    #[test]
    fn test_every_opened_session_is_closed() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::FailRead)
            .with_device(VID, PID, 1, Behavior::Report(vec![0; 8]))
            .with_device(VID, PID, 2, Behavior::Report(report(0x22, 1)))
            .with_device(VID, PID, 3, Behavior::Silent);
        let calls = backend.calls();

        let status = client(backend, ProtocolVariant::B).poll();

        assert_eq!(status, BatteryStatus::inactive());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.opened, vec![0, 1, 2, 3]);
        assert_eq!(calls.closed, calls.opened);
    }

    #[test]
    fn test_silent_device_bounded_by_timeout() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::Silent);
        let started = Instant::now();

        let status = client(backend, ProtocolVariant::A).poll();

        assert_eq!(status, BatteryStatus::inactive());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_whole_cycle_bounded_by_cycle_timeout() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::Silent)
            .with_device(VID, PID, 1, Behavior::Silent)
            .with_device(VID, PID, 2, Behavior::Silent)
            .with_device(VID, PID, 3, Behavior::Silent);
        let calls = backend.calls();
        let mut client = client(backend, ProtocolVariant::A)
            .with_read_timeout(Duration::from_millis(200))
            .with_cycle_timeout(Duration::from_millis(300));

        let started = Instant::now();
        let status = client.poll();

        assert_eq!(status, BatteryStatus::inactive());
        assert!(started.elapsed() < Duration::from_millis(700));
        let calls = calls.lock().unwrap();
        // the second read is cut short by the cycle budget, the rest never start
        assert_eq!(calls.opened, vec![0, 1]);
        assert_eq!(calls.closed, vec![0, 1]);
    }

    #[test]
    fn test_error_keeps_hid_source() {
        use std::error::Error as _;

        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::FailRead);
        let mut client = client(backend, ProtocolVariant::A);
        let candidates = client.candidates();

        let err = client.raw_exchange(&candidates[0]).unwrap_err();
        let source = err.source().expect("HID error kept as source");
        assert!(source.to_string().contains("read failed"));
    }

    #[test]
    fn test_devices_outside_allow_list_are_ignored() {
        let backend = MockBackend::new()
            .with_device(0x046D, 0xC52B, 0, Behavior::Report(report(0x0e, 100)))
            .with_device(VID, 0x1723, 1, Behavior::Report(report(0x0e, 100)));
        let calls = backend.calls();

        let status = client(backend, ProtocolVariant::A).poll();

        assert_eq!(status, BatteryStatus::inactive());
        assert!(calls.lock().unwrap().opened.is_empty());
    }

    #[test]
    fn test_enumeration_failure_is_inactive() {
        let status = client(MockBackend::failing(), ProtocolVariant::A).poll();
        assert_eq!(status, BatteryStatus::inactive());
    }

    #[test]
    fn test_single_exchange_returns_raw_report() {
        let backend = MockBackend::new()
            .with_device(VID, PID, 0, Behavior::Report(report(0x10, 7)));
        let mut client = client(backend, ProtocolVariant::B);

        let candidates = client.candidates();
        let raw = client.raw_exchange(&candidates[0]).unwrap();
        assert_eq!(raw, Some([0x21, 0, 0, 0x10, 7, 0, 0, 0]));
    }

    #[test]
    fn test_default_request_packet() {
        assert_eq!(BATTERY_REQUEST.len(), 20);
        assert_eq!(&BATTERY_REQUEST[..3], &[0x21, 0xFF, 0x05]);
        assert!(BATTERY_REQUEST[3..].iter().all(|&b| b == 0));
    }
}
