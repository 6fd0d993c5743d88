//! # Exchange Properties
//!
//! The observable guarantees of the exchange, checked across codec, schema
//! and hub together:
//!
//! - wire round-trip and truncation detection on hub-accepted envelopes
//! - latest-value cache correctness
//! - alias shadowing, newest key first
//! - idempotent (un)registration
//! - the 775 `Arm_state` scenario

#[cfg(test)]
mod tests {
    use proptest::collection::btree_map;
    use proptest::prelude::*;

    use hmi_schema::{Resolution, SchemaRegistry};
    use hmi_types::{CandidateEnvelope, Envelope};
    use hmi_wire::DecodeError;

    use crate::integration::{default_hub, recording_handle};

    fn arb_candidate() -> impl Strategy<Value = CandidateEnvelope> {
        (
            any::<i32>(),
            ".{0,24}",
            any::<i64>(),
            btree_map("[A-Za-z_]{1,12}", "[ -~]{0,8}", 0..6),
        )
            .prop_map(|(type_id, payload, timestamp, fields)| {
                CandidateEnvelope::new(type_id)
                    .with_payload(payload)
                    .with_timestamp(timestamp)
                    .with_fields(fields)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn accepted_envelopes_survive_the_wire(candidate in arb_candidate()) {
            let hub = default_hub();
            let accepted = hub.publish(candidate).unwrap();

            let bytes = hmi_wire::encode(&accepted).unwrap();
            prop_assert_eq!(hmi_wire::decode(&bytes).unwrap(), accepted);
        }

        #[test]
        fn truncated_messages_never_decode(candidate in arb_candidate(), cut in 0usize..512) {
            let envelope = Envelope::accepted(candidate, 7);
            let bytes = hmi_wire::encode(&envelope).unwrap();
            let cut = cut % bytes.len();

            let is_truncated = matches!(
                hmi_wire::decode(&bytes[..cut]),
                Err(DecodeError::Truncated { .. })
            );
            prop_assert!(is_truncated);
        }
    }

    #[test]
    fn test_latest_value_wins() {
        let hub = default_hub();
        let e1 = hub
            .publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", "1000"))
            .unwrap();
        let e2 = hub
            .publish(CandidateEnvelope::new(800).with_field("MOTOR_RPM", "2000"))
            .unwrap();

        assert_ne!(hub.get_latest(800), Some(e1));
        assert_eq!(hub.get_latest(800), Some(e2));
    }

    #[test]
    fn test_never_published_type_is_absent() {
        let hub = default_hub();
        hub.publish(CandidateEnvelope::new(800)).unwrap();
        assert_eq!(hub.get_latest(801), None);
    }

    #[test]
    fn test_alias_shadowing() {
        let registry =
            SchemaRegistry::from_rules("category c 1\nalias c NEW_KEY NEW_KEY OLD_KEY\n").unwrap();

        let old_only = CandidateEnvelope::new(1).with_field("OLD_KEY", "5").fields;
        assert_eq!(
            registry.resolve(1, &old_only, "NEW_KEY"),
            Resolution::Value("5".into())
        );

        let both = CandidateEnvelope::new(1)
            .with_field("OLD_KEY", "5")
            .with_field("NEW_KEY", "7")
            .fields;
        assert_eq!(
            registry.resolve(1, &both, "NEW_KEY"),
            Resolution::Value("7".into())
        );

        let neither = CandidateEnvelope::new(1).with_field("OTHER", "1").fields;
        assert_eq!(registry.resolve(1, &neither, "NEW_KEY").display(), "N/A");
    }

    #[test]
    fn test_register_twice_unregister_once() {
        let hub = default_hub();
        let (handle, seen) = recording_handle();

        hub.register(handle.clone());
        hub.register(handle.clone());
        hub.publish(CandidateEnvelope::new(774)).unwrap();
        assert_eq!(seen.lock().len(), 1);

        hub.unregister(&handle.id());
        hub.publish(CandidateEnvelope::new(774)).unwrap();
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_arm_state_scenario() {
        let hub = default_hub();
        let (handle, seen) = recording_handle();
        hub.register(handle);

        hub.publish(CandidateEnvelope::new(775).with_field("Arm_state", "1"))
            .unwrap();

        let pushed = seen.lock()[0].clone();
        let schema = hub.schema();
        assert_eq!(
            schema.resolve(pushed.type_id(), pushed.fields(), "ARM_STATE"),
            Resolution::Value("1".into())
        );
        assert_eq!(
            schema
                .current()
                .category("vehicle_flags")
                .and_then(|c| c.aliases("ARM_STATE"))
                .map(<[String]>::to_vec),
            Some(vec!["ARM_STATE_FLAG".to_string(), "Arm_state".to_string()])
        );
    }

    #[test]
    fn test_sequence_ids_strictly_increase_across_origins() {
        let hub = default_hub();
        let (handle, seen) = recording_handle();
        hub.register(handle);

        hub.publish(CandidateEnvelope::new(785)).unwrap();
        hub.inject(CandidateEnvelope::diagnostic()).unwrap();
        let bytes = hmi_wire::encode(&Envelope::accepted(CandidateEnvelope::new(800), 0)).unwrap();
        hub.accept_encoded(&bytes).unwrap();

        let ids: Vec<_> = seen.lock().iter().map(Envelope::sequence_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
