//! # Session Flows
//!
//! Client sessions against a shared hub:
//!
//! 1. **Late join**: a session connecting after publishes sees the cache at once
//! 2. **Dead subscriber isolation**: a broken client never starves healthy ones
//! 3. **Schema drift**: old and new firmware render to the same canonical view
//! 4. **Runtime**: the middleware process end to end

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use hmi_hub::{
        CallbackHandle, HubConnection, LocalConnection, SessionState, SubscriberSession,
        TransportError,
    };
    use hmi_runtime::{MiddlewareRuntime, RuntimeConfig};
    use hmi_schema::Resolution;
    use hmi_types::{CandidateEnvelope, DIAGNOSTIC_TYPE_ID, UNRESOLVED_DISPLAY};
    use parking_lot::Mutex;

    use crate::integration::{default_hub, recording_handle};

    fn open_session(
        hub: &Arc<hmi_hub::DistributionHub>,
        interests: Vec<i32>,
    ) -> SubscriberSession {
        let connection: Arc<dyn HubConnection> = Arc::new(LocalConnection::new(Arc::clone(hub)));
        SubscriberSession::new(connection, hub.schema(), interests)
    }

    #[test]
    fn test_late_join_sees_cache_before_next_push() {
        let hub = default_hub();
        hub.publish(CandidateEnvelope::new(785).with_field("BATTERY_SOC", "81"))
            .unwrap();
        hub.publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", "1500"))
            .unwrap();

        let session = open_session(&hub, vec![785, 800, 832]);
        session.connect().unwrap();

        assert_eq!(session.resolve(785, "SOC"), Resolution::Value("81".into()));
        assert_eq!(session.resolve(800, "RPM"), Resolution::Value("1500".into()));
        assert_eq!(session.resolve(832, "ARM_STATE"), Resolution::Unresolved);
        assert_eq!(session.deliveries(), 0);
    }

    #[test]
    fn test_dead_session_isolated_from_healthy() {
        let hub = default_hub();
        let healthy = open_session(&hub, vec![]);
        healthy.connect().unwrap();

        let dead = CallbackHandle::from_fn(|_| Err(TransportError::Disconnected));
        let dead_id = dead.id();
        hub.register(dead);
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(CandidateEnvelope::new(774).with_field("Key_On_Off", "1"))
            .unwrap();
        assert_eq!(healthy.resolve(774, "KEY_STATE"), Resolution::Value("1".into()));
        assert!(!hub.is_registered(&dead_id));

        hub.publish(CandidateEnvelope::new(774).with_field("Key_On_Off", "0"))
            .unwrap();
        assert_eq!(healthy.deliveries(), 2);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn test_firmware_eras_render_identically() {
        let hub = default_hub();
        let session = open_session(&hub, vec![]);
        session.connect().unwrap();

        hub.publish(CandidateEnvelope::new(784).with_field("rpm", "900"))
            .unwrap();
        hub.publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", "900"))
            .unwrap();

        let legacy = session.render(784);
        let current = session.render(800);
        assert_eq!(legacy.get("RPM"), current.get("RPM"));
        assert_eq!(legacy.get("MOTOR_TEMP").map(String::as_str), Some(UNRESOLVED_DISPLAY));
        assert_eq!(legacy.keys().collect::<Vec<_>>(), current.keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_client_over_the_wire() {
        let hub = default_hub();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        // Stands in for a client process: every push crosses the codec.
        let remote = CallbackHandle::from_fn(move |envelope| {
            let bytes = hmi_wire::encode(envelope)
                .map_err(|e| TransportError::Remote(e.to_string()))?;
            let decoded =
                hmi_wire::decode(&bytes).map_err(|e| TransportError::Remote(e.to_string()))?;
            sink.lock().push(decoded);
            Ok(())
        });
        hub.register(remote);

        let sent = hub.inject(CandidateEnvelope::diagnostic()).unwrap();
        assert_eq!(received.lock().as_slice(), &[sent]);
    }

    #[test]
    fn test_reload_through_session_visible_to_all() {
        let hub = default_hub();
        let a = open_session(&hub, vec![]);
        let b = open_session(&hub, vec![]);
        a.connect().unwrap();
        b.connect().unwrap();

        hub.publish(CandidateEnvelope::new(832).with_field("ARM_STATE_FLAG", "1"))
            .unwrap();
        a.reload_schema("category vehicle_flags 832\nalias vehicle_flags ARMED ARM_STATE_FLAG\n")
            .unwrap();

        assert_eq!(b.resolve(832, "ARMED"), Resolution::Value("1".into()));
        assert_eq!(
            b.reload_schema("category broken").unwrap_err().to_string(),
            "Rule parse failed at line 1: category 'broken' has no type ids"
        );
        assert_eq!(hub.schema().generation_number(), 2);
    }

    #[test]
    fn test_recorder_and_session_see_same_ids() {
        let hub = default_hub();
        let (recorder, seen) = recording_handle();
        hub.register(recorder);
        let session = open_session(&hub, vec![]);
        session.connect().unwrap();

        for rpm in ["1", "2", "3"] {
            hub.publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", rpm))
                .unwrap();
        }

        let last = seen.lock().last().cloned();
        assert_eq!(session.latest(800), last);
        assert_eq!(session.deliveries(), 3);
    }

    #[tokio::test]
    async fn test_runtime_end_to_end() {
        let config = RuntimeConfig {
            producer_interval: Duration::from_millis(5),
            ..RuntimeConfig::default()
        };
        let mut runtime = MiddlewareRuntime::new(config).unwrap();
        runtime.start().await.unwrap();
        let hub = runtime.hub();
        let dashboard = runtime.session();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(dashboard.state(), SessionState::Registered);
        assert_eq!(
            dashboard.resolve(DIAGNOSTIC_TYPE_ID, "DUMMY_KEY"),
            Resolution::Value("ACTIVE".into())
        );
        assert!(dashboard.resolve(774, "KEY_STATE").is_resolved());

        runtime.shutdown().await;
        assert_eq!(hub.subscriber_count(), 0);
        assert!(hub.envelopes_published() >= 5);
    }
}
