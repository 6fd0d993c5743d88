//! # Concurrency
//!
//! Reload atomicity under concurrent readers and publish ordering under
//! concurrent producers, using plain threads against one hub.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use hmi_hub::{CallbackHandle, TransportError};
    use hmi_schema::{Resolution, SchemaRegistry};
    use hmi_types::{CandidateEnvelope, Envelope};

    use crate::integration::{default_hub, recording_handle};

    const RULES_A: &str = "category m 800\nalias m RPM A_RPM\nalias m POWER A_POWER\n";
    const RULES_B: &str = "category m 800\nalias m RPM B_RPM\nalias m POWER B_POWER\n";

    /// Each rule document maps every canonical name into its own key family,
    /// so a mixed generation would resolve RPM and POWER from different ones.
    #[test]
    fn test_reload_is_atomic_for_readers() {
        let registry = Arc::new(SchemaRegistry::from_rules(RULES_A).unwrap());
        let fields = CandidateEnvelope::new(800)
            .with_fields([("A_RPM", "a"), ("A_POWER", "a"), ("B_RPM", "b"), ("B_POWER", "b")])
            .fields;
        let fields = Arc::new(fields);
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let fields = Arc::clone(&fields);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut checks = 0u64;
                    while !done.load(Ordering::Acquire) {
                        let generation = registry.current();
                        let rpm = generation.resolve(800, &fields, "RPM");
                        let power = generation.resolve(800, &fields, "POWER");
                        assert_eq!(rpm, power, "mixed generation observed");
                        assert!(matches!(rpm, Resolution::Value(_)));

                        let all = registry.resolve_all(800, &fields);
                        assert_eq!(all.get("RPM"), all.get("POWER"));
                        checks += 1;
                    }
                    checks
                })
            })
            .collect();

        for i in 0..300 {
            let source = if i % 2 == 0 { RULES_B } else { RULES_A };
            registry.reload(source).unwrap();
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
        assert_eq!(registry.generation_number(), 301);
    }

    #[test]
    fn test_concurrent_publishers_deliver_in_id_order() {
        let hub = default_hub();
        let (handle, seen) = recording_handle();
        hub.register(handle);

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let hub = Arc::clone(&hub);
                thread::spawn(move || {
                    for i in 0..100 {
                        hub.publish(
                            CandidateEnvelope::new(700 + p).with_field("i", i.to_string()),
                        )
                        .unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let ids: Vec<_> = seen.lock().iter().map(Envelope::sequence_id).collect();
        assert_eq!(ids.len(), 400);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(hub.envelopes_published(), 400);
    }

    #[test]
    fn test_reload_during_publish_keeps_cache() {
        let hub = default_hub();
        let writer = {
            let hub = Arc::clone(&hub);
            thread::spawn(move || {
                for i in 0..200 {
                    hub.publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", i.to_string()))
                        .unwrap();
                }
            })
        };

        for i in 0..50 {
            let source = if i % 2 == 0 { RULES_A } else { RULES_B };
            hub.reload_schema(source).unwrap();
        }
        writer.join().unwrap();

        assert_eq!(hub.get_latest(800).unwrap().field("MOTOR_RPM"), Some("199"));
        assert_eq!(hub.schema().generation_number(), 51);
    }

    #[test]
    fn test_failing_subscriber_under_load() {
        let hub = default_hub();
        let (healthy, seen) = recording_handle();
        let flaky_calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let flaky = {
            let calls = Arc::clone(&flaky_calls);
            CallbackHandle::from_fn(move |_| {
                if calls.fetch_add(1, Ordering::SeqCst) >= 3 {
                    Err(TransportError::Remote("broken pipe".into()))
                } else {
                    Ok(())
                }
            })
        };
        hub.register(flaky.clone());
        hub.register(healthy);

        let producers: Vec<_> = (0..2)
            .map(|_| {
                let hub = Arc::clone(&hub);
                thread::spawn(move || {
                    for _ in 0..50 {
                        hub.publish(CandidateEnvelope::new(774)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(seen.lock().len(), 100);
        assert_eq!(flaky_calls.load(Ordering::SeqCst), 4);
        assert!(!hub.is_registered(&flaky.id()));
    }
}
