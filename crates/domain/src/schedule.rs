//! Schedule records — the persisted, declarative "switch this plug at HH:MM" rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceRef};
use crate::error::{PlugSchedError, TimeField, ValidationError};
use crate::id::ScheduleId;
use crate::time::TimeOfDay;

/// Rule adjusting or suppressing a schedule's base time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Fire at the literal base time.
    #[default]
    None,
    /// Fire a fixed lead before sunrise/sunset, clamped into a window.
    SunsetClamp,
    /// Only switch on when a household member is expected home today.
    OccupancyGate,
}

impl fmt::Display for OverridePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::SunsetClamp => f.write_str("sunset_clamp"),
            Self::OccupancyGate => f.write_str("occupancy_gate"),
        }
    }
}

impl FromStr for OverridePolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "sunset_clamp" => Ok(Self::SunsetClamp),
            "occupancy_gate" => Ok(Self::OccupancyGate),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Returned when parsing an unrecognised override policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown override policy {0:?}")]
pub struct UnknownPolicy(pub String);

/// A persisted schedule.
///
/// `hour` and `minute` are optional because stored rows may lack them; such a
/// record is a configuration error and is skipped at rebuild time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: ScheduleId,
    pub name: String,
    pub device_ref: DeviceRef,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub desired_power: bool,
    pub active: bool,
    pub override_policy: OverridePolicy,
}

impl ScheduleRecord {
    /// Create a builder for constructing a [`ScheduleRecord`].
    #[must_use]
    pub fn builder() -> ScheduleRecordBuilder {
        ScheduleRecordBuilder::default()
    }

    /// The configured base fire time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingTime`] when hour or minute is absent,
    /// or a range error when either is out of bounds.
    pub fn base_time(&self) -> Result<TimeOfDay, ValidationError> {
        let hour = self
            .hour
            .ok_or(ValidationError::MissingTime(TimeField::Hour))?;
        let minute = self
            .minute
            .ok_or(ValidationError::MissingTime(TimeField::Minute))?;
        TimeOfDay::new(hour, minute)
    }

    /// Check domain invariants enforced on write.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] when the name is empty or a
    /// present hour/minute is out of range.
    pub fn validate(&self) -> Result<(), PlugSchedError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(hour) = self.hour
            && hour > 23
        {
            return Err(ValidationError::HourOutOfRange(hour).into());
        }
        if let Some(minute) = self.minute
            && minute > 59
        {
            return Err(ValidationError::MinuteOutOfRange(minute).into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`ScheduleRecord`].
#[derive(Debug, Default)]
pub struct ScheduleRecordBuilder {
    id: Option<ScheduleId>,
    name: Option<String>,
    device_ref: Option<DeviceRef>,
    hour: Option<u32>,
    minute: Option<u32>,
    desired_power: Option<bool>,
    active: Option<bool>,
    override_policy: OverridePolicy,
}

impl ScheduleRecordBuilder {
    #[must_use]
    pub fn id(mut self, id: ScheduleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_ref(mut self, device_ref: DeviceRef) -> Self {
        self.device_ref = Some(device_ref);
        self
    }

    #[must_use]
    pub fn at(mut self, hour: u32, minute: u32) -> Self {
        self.hour = Some(hour);
        self.minute = Some(minute);
        self
    }

    #[must_use]
    pub fn desired_power(mut self, on: bool) -> Self {
        self.desired_power = Some(on);
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    #[must_use]
    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    /// Consume the builder, validate, and return a [`ScheduleRecord`].
    ///
    /// Defaults: new id, power on, active.
    ///
    /// # Errors
    ///
    /// Returns [`PlugSchedError::Validation`] if required fields are missing
    /// or out of range.
    pub fn build(self) -> Result<ScheduleRecord, PlugSchedError> {
        let device_ref = self
            .device_ref
            .ok_or_else(|| ValidationError::MalformedDeviceRef(String::new()))?;
        let record = ScheduleRecord {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            device_ref,
            hour: self.hour,
            minute: self.minute,
            desired_power: self.desired_power.unwrap_or(true),
            active: self.active.unwrap_or(true),
            override_policy: self.override_policy,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Partial update of a [`ScheduleRecord`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub device_ref: Option<DeviceRef>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub desired_power: Option<bool>,
    pub active: Option<bool>,
    pub override_policy: Option<OverridePolicy>,
}

impl SchedulePatch {
    /// Whether applying this patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay the present fields onto `record`.
    #[must_use]
    pub fn apply(self, mut record: ScheduleRecord) -> ScheduleRecord {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(device_ref) = self.device_ref {
            record.device_ref = device_ref;
        }
        if let Some(hour) = self.hour {
            record.hour = Some(hour);
        }
        if let Some(minute) = self.minute {
            record.minute = Some(minute);
        }
        if let Some(on) = self.desired_power {
            record.desired_power = on;
        }
        if let Some(active) = self.active {
            record.active = active;
        }
        if let Some(policy) = self.override_policy {
            record.override_policy = policy;
        }
        record
    }
}

/// An active schedule joined with its registered device, if any.
#[derive(Debug, Clone)]
pub struct ActiveSchedule {
    pub record: ScheduleRecord,
    pub device: Option<Device>,
}

impl ActiveSchedule {
    /// Room of the joined device, used for occupancy gating.
    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.device.as_ref().and_then(|d| d.room.as_deref())
    }

    /// Fallback address of the joined device.
    #[must_use]
    pub fn fallback_address(&self) -> Option<&str> {
        self.device
            .as_ref()
            .and_then(|d| d.fallback_address.as_deref())
    }
}

/// A stored schedule that could not be read back into a [`ScheduleRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schedule {id} is malformed: {reason}")]
pub struct MalformedSchedule {
    /// Raw stored key; may itself be the malformed part.
    pub id: String,
    pub reason: String,
}

/// One row of the active listing, decoded or not.
pub type StoredSchedule = Result<ActiveSchedule, MalformedSchedule>;

#[cfg(test)]
mod tests {
    use super::*;

    fn plug() -> DeviceRef {
        DeviceRef::Address("192.168.1.20".to_string())
    }

    fn valid_record() -> ScheduleRecord {
        ScheduleRecord::builder()
            .name("Christmas tree morning lights on")
            .device_ref(plug())
            .at(6, 30)
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_valid_record_with_defaults() {
        let record = valid_record();
        assert!(record.active);
        assert!(record.desired_power);
        assert_eq!(record.override_policy, OverridePolicy::None);
        assert_eq!(record.base_time().unwrap().to_string(), "06:30");
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = ScheduleRecord::builder().device_ref(plug()).at(6, 30).build();
        assert!(matches!(
            result,
            Err(PlugSchedError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_out_of_range_hour_on_write() {
        let result = ScheduleRecord::builder()
            .name("bad")
            .device_ref(plug())
            .at(25, 0)
            .build();
        assert!(matches!(
            result,
            Err(PlugSchedError::Validation(ValidationError::HourOutOfRange(25)))
        ));
    }

    #[test]
    fn should_report_missing_minute_as_configuration_error() {
        let mut record = valid_record();
        record.minute = None;
        assert_eq!(
            record.base_time(),
            Err(ValidationError::MissingTime(TimeField::Minute))
        );
    }

    #[test]
    fn should_report_missing_hour_as_configuration_error() {
        let mut record = valid_record();
        record.hour = None;
        assert_eq!(
            record.base_time(),
            Err(ValidationError::MissingTime(TimeField::Hour))
        );
    }

    #[test]
    fn should_apply_only_present_patch_fields() {
        let record = valid_record();
        let patch = SchedulePatch {
            hour: Some(7),
            active: Some(false),
            ..SchedulePatch::default()
        };
        let updated = patch.apply(record.clone());
        assert_eq!(updated.hour, Some(7));
        assert_eq!(updated.minute, record.minute);
        assert!(!updated.active);
        assert_eq!(updated.name, record.name);
    }

    #[test]
    fn should_detect_empty_patch() {
        assert!(SchedulePatch::default().is_empty());
        let patch = SchedulePatch {
            name: Some("x".to_string()),
            ..SchedulePatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn should_parse_and_display_policy_names() {
        for policy in [
            OverridePolicy::None,
            OverridePolicy::SunsetClamp,
            OverridePolicy::OccupancyGate,
        ] {
            assert_eq!(policy.to_string().parse::<OverridePolicy>(), Ok(policy));
        }
        assert!("sunrise".parse::<OverridePolicy>().is_err());
    }

    #[test]
    fn should_expose_room_of_joined_device() {
        let device = Device::builder()
            .device_ref(plug())
            .name("Lamp")
            .room("kids")
            .build()
            .unwrap();
        let active = ActiveSchedule {
            record: valid_record(),
            device: Some(device),
        };
        assert_eq!(active.room(), Some("kids"));
        assert_eq!(active.fallback_address(), None);
    }
}
