//! Simulated vehicle-bus producer.
//!
//! Alternates between two firmware eras so both the old and the new type
//! ids and signal names reach the hub, the way a mixed fleet would.

use std::sync::Arc;
use std::time::Duration;

use hmi_hub::DistributionHub;
use hmi_types::{CandidateEnvelope, Envelope, TypeId, UNASSIGNED_SEQUENCE_ID};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Firmware revision a batch is shaped after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareEra {
    /// Battery on 769, vehicle flags on 775, motor on 784.
    Legacy,
    /// Battery on 785, vehicle flags on 832, motor on 800.
    Current,
}

impl FirmwareEra {
    #[must_use]
    pub fn battery_type_id(self) -> TypeId {
        match self {
            Self::Legacy => 769,
            Self::Current => 785,
        }
    }

    #[must_use]
    pub fn vehicle_type_id(self) -> TypeId {
        match self {
            Self::Legacy => 775,
            Self::Current => 832,
        }
    }

    #[must_use]
    pub fn motor_type_id(self) -> TypeId {
        match self {
            Self::Legacy => 784,
            Self::Current => 800,
        }
    }
}

/// Ignition kept its id across revisions.
pub const IGNITION_TYPE_ID: TypeId = 774;

/// Deterministic signal generator, one batch per tick.
#[derive(Debug, Default)]
pub struct SimulatedProducer {
    tick: u64,
}

impl SimulatedProducer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Era the next batch will use.
    #[must_use]
    pub fn era(&self) -> FirmwareEra {
        if self.tick % 2 == 0 {
            FirmwareEra::Current
        } else {
            FirmwareEra::Legacy
        }
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// One envelope per category, shaped after the current era.
    pub fn next_batch(&mut self) -> Vec<CandidateEnvelope> {
        let era = self.era();
        let t = self.tick;
        self.tick += 1;

        let soc = 100 - (t % 100);
        let rpm = 800 + (t * 37) % 3200;
        let ignition = u64::from(t % 20 != 19);
        let armed = t % 2;

        let battery = match era {
            FirmwareEra::Current => Self::candidate(era.battery_type_id(), t).with_fields([
                ("BATTERY_SOC", soc.to_string()),
                ("batterySoh", "97".to_string()),
                ("batteryPower", format!("{:.1}", rpm as f64 * 0.012)),
                ("batteryTempNtc1", (30 + t % 8).to_string()),
            ]),
            FirmwareEra::Legacy => Self::candidate(era.battery_type_id(), t).with_fields([
                ("BATTERY_SOC", soc.to_string()),
                ("BATTERY_CAPACITY", "52".to_string()),
            ]),
        };

        let vehicle = match era {
            FirmwareEra::Current => Self::candidate(era.vehicle_type_id(), t).with_fields([
                ("MCU_IGNITION", ignition.to_string()),
                ("ARM_STATE_FLAG", armed.to_string()),
                ("KILL_SWITCH", "0".to_string()),
            ]),
            FirmwareEra::Legacy => Self::candidate(era.vehicle_type_id(), t).with_fields([
                ("Key_On_Off", ignition.to_string()),
                ("Arm_state", armed.to_string()),
                ("Kill_switch", "0".to_string()),
                ("imuAngleX", format!("{:.2}", (t % 10) as f64 * 0.5)),
                ("imuAngleY", "0.00".to_string()),
            ]),
        };

        let motor = match era {
            FirmwareEra::Current => Self::candidate(era.motor_type_id(), t).with_fields([
                ("MOTOR_RPM", rpm.to_string()),
                ("MOTOR_POWER", format!("{:.1}", rpm as f64 * 0.011)),
                ("motorTemp", (45 + t % 15).to_string()),
                ("phaseCurrent", (rpm / 40).to_string()),
            ]),
            FirmwareEra::Legacy => Self::candidate(era.motor_type_id(), t).with_fields([
                ("rpm", rpm.to_string()),
                ("power", format!("{:.1}", rpm as f64 * 0.011)),
                ("mcuTemp", (40 + t % 10).to_string()),
            ]),
        };

        let ignition = Self::candidate(IGNITION_TYPE_ID, t)
            .with_field("Key_On_Off", ignition.to_string());

        vec![battery, ignition, vehicle, motor]
    }

    fn candidate(type_id: TypeId, tick: u64) -> CandidateEnvelope {
        CandidateEnvelope::now(type_id).with_payload(format!("{type_id:03X}#{tick:016X}"))
    }

    /// Encode the next batch and feed it through the hub's inbound path.
    ///
    /// Returns how many envelopes the hub accepted.
    pub fn emit(&mut self, hub: &DistributionHub) -> usize {
        let era = self.era();
        let mut accepted = 0;

        for candidate in self.next_batch() {
            let envelope = Envelope::accepted(candidate, UNASSIGNED_SEQUENCE_ID);
            match hmi_wire::encode(&envelope) {
                Ok(bytes) => {
                    if hub.accept_encoded(&bytes).is_some() {
                        accepted += 1;
                    }
                }
                Err(e) => warn!(type_id = envelope.type_id(), error = %e, "Encode failed"),
            }
        }

        debug!(?era, accepted, tick = self.tick, "Producer batch emitted");
        accepted
    }

    /// Emit a batch every `interval` until `shutdown` flips.
    pub async fn run(
        mut self,
        hub: Arc<DistributionHub>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        info!(interval_ms = interval.as_millis() as u64, "Simulated producer started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.emit(&hub);
                }
                _ = shutdown.changed() => {
                    info!(ticks = self.tick, "Simulated producer stopping");
                    break;
                }
            }
        }
    }
}
