//! Rule set the middleware starts with.
//!
//! Covers the firmware revisions seen in the field so far: battery moved
//! 769 → 785, vehicle/flags 775 → 832 and motor 784 → 800, while ignition
//! kept 774. IMU angles were only ever carried on 775.
//!
//! Bench keys such as `TEST_KEY_STATE` are not listed; a rule file loaded at
//! runtime can put them ahead of the production keys.

/// Default rule document, parsed at startup.
pub const DEFAULT_RULES: &str = "\
# Battery pack
category battery 769 785
alias battery SOC BATTERY_SOC
alias battery SOH batterySoh
alias battery POWER batteryPower
alias battery CAPACITY BATTERY_CAPACITY
alias battery TEMP_NTC1 batteryTempNtc1

# Ignition
category ignition 774
alias ignition KEY_STATE Key_On_Off

# Vehicle data and flags
category vehicle_flags 775 832
alias vehicle_flags KEY_STATE MCU_IGNITION Key_On_Off
alias vehicle_flags ARM_STATE ARM_STATE_FLAG Arm_state
alias vehicle_flags KILL_SWITCH KILL_SWITCH Kill_switch
alias vehicle_flags IMU_ANGLE_X imuAngleX
alias vehicle_flags IMU_ANGLE_Y imuAngleY

# Motor controller
category motor 784 800
alias motor RPM MOTOR_RPM rpm
alias motor POWER MOTOR_POWER power
alias motor PHASE_CURRENT phaseCurrent
alias motor MOTOR_TEMP motorTemp
alias motor MCU_TEMP mcuTemp

# Client-injected diagnostics
category diagnostic 9999
alias diagnostic DUMMY_KEY dummy_key
";
