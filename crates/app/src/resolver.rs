//! Time override resolution — turns a schedule's base time and override
//! policy into the time it should actually fire today.
//!
//! Oracle failures never escape from here. The occupancy gate fails closed
//! (the plug is not switched on), the solar clamp fails open (the literal
//! base time is used).

use plugsched_domain::error::ValidationError;
use plugsched_domain::schedule::OverridePolicy;
use plugsched_domain::time::{ClampWindow, TimeOfDay};
use plugsched_domain::trigger::FireAt;

use crate::ports::{OccupancyOracle, SolarTimeOracle};

/// Base hours before this are treated as morning schedules.
const MORNING_CUTOFF_HOUR: u32 = 13;

/// Which solar event a [`OverridePolicy::SunsetClamp`] schedule follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarEvent {
    Sunrise,
    Sunset,
}

impl SolarEvent {
    /// Morning schedules follow sunrise, everything from 13:00 on follows sunset.
    #[must_use]
    pub fn for_base(base: TimeOfDay) -> Self {
        if base.hour() < MORNING_CUTOFF_HOUR {
            Self::Sunrise
        } else {
            Self::Sunset
        }
    }
}

/// Tunables of the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long before the solar event the trigger fires.
    pub lead_minutes: u32,
    pub sunset_window: ClampWindow,
    /// Without a sunrise window the sunrise-derived time is used unclamped.
    pub sunrise_window: Option<ClampWindow>,
    /// Rooms whose switch-on schedules are always occupancy gated.
    pub gated_rooms: Vec<String>,
}

impl ResolverConfig {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvertedWindow`] if a window is inverted.
    pub fn new(
        lead_minutes: u32,
        sunset_window: (TimeOfDay, TimeOfDay),
        sunrise_window: Option<(TimeOfDay, TimeOfDay)>,
        gated_rooms: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            lead_minutes,
            sunset_window: ClampWindow::new(sunset_window.0, sunset_window.1)?,
            sunrise_window: sunrise_window
                .map(|(floor, ceiling)| ClampWindow::new(floor, ceiling))
                .transpose()?,
            gated_rooms,
        })
    }

    fn window_for(&self, event: SolarEvent) -> Option<&ClampWindow> {
        match event {
            SolarEvent::Sunrise => self.sunrise_window.as_ref(),
            SolarEvent::Sunset => Some(&self.sunset_window),
        }
    }

    fn is_gated_room(&self, room: Option<&str>) -> bool {
        room.is_some_and(|room| self.gated_rooms.iter().any(|g| g.eq_ignore_ascii_case(room)))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lead_minutes: 30,
            sunset_window: ClampWindow::EVENING,
            sunrise_window: None,
            gated_rooms: Vec::new(),
        }
    }
}

/// Applies override policies using the solar and occupancy oracles.
pub struct TimeOverrideResolver<S, O> {
    solar: S,
    occupancy: O,
    config: ResolverConfig,
}

impl<S, O> TimeOverrideResolver<S, O>
where
    S: SolarTimeOracle,
    O: OccupancyOracle,
{
    pub fn new(solar: S, occupancy: O, config: ResolverConfig) -> Self {
        Self {
            solar,
            occupancy,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Effective fire time for a schedule.
    ///
    /// `room` is the room of the schedule's device; a device in one of the
    /// configured gated rooms is gated even without
    /// [`OverridePolicy::OccupancyGate`]. Gating is checked first and only
    /// ever applies to switch-on schedules.
    pub async fn resolve(
        &self,
        base: TimeOfDay,
        policy: OverridePolicy,
        desired_power: bool,
        room: Option<&str>,
    ) -> FireAt {
        let gated = policy == OverridePolicy::OccupancyGate || self.config.is_gated_room(room);
        if gated && desired_power && !self.someone_home().await {
            return FireAt::Suppressed;
        }
        match policy {
            OverridePolicy::SunsetClamp => FireAt::At(self.solar_adjusted(base).await),
            OverridePolicy::None | OverridePolicy::OccupancyGate => FireAt::At(base),
        }
    }

    async fn someone_home(&self) -> bool {
        match self.occupancy.expected_home_today().await {
            Ok(Some(home)) => home,
            Ok(None) => {
                tracing::info!("occupancy unknown, suppressing gated schedule");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "occupancy oracle failed, suppressing gated schedule");
                false
            }
        }
    }

    async fn solar_adjusted(&self, base: TimeOfDay) -> TimeOfDay {
        let event = SolarEvent::for_base(base);
        let lookup = match event {
            SolarEvent::Sunrise => self.solar.sunrise().await,
            SolarEvent::Sunset => self.solar.sunset().await,
        };
        let solar = match lookup {
            Ok(time) => time,
            Err(err) => {
                tracing::warn!(error = %err, ?event, %base, "solar oracle failed, using base time");
                return base;
            }
        };
        let adjusted = solar.saturating_sub_minutes(self.config.lead_minutes);
        let effective = self
            .config
            .window_for(event)
            .map_or(adjusted, |window| window.clamp(adjusted));
        tracing::debug!(?event, %solar, %adjusted, %effective, "solar override applied");
        effective
    }
}
