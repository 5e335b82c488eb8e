use chrono::{DateTime, Days, NaiveTime, Utc};
use reelcast_core::{config::CalendarConfig, Variant};

use crate::error::{Result, ScheduleError};

/// Pure slot allocator: fixed daily time-of-day templates per variant.
///
/// Holds no connection and performs no I/O. Callers pass in the current set
/// of booked times for the brand+variant; identical inputs always produce
/// the same answer.
#[derive(Debug, Clone)]
pub struct SlotCalendar {
    light: Vec<NaiveTime>,
    dark: Vec<NaiveTime>,
}

impl SlotCalendar {
    /// Build a calendar from config templates ("HH:MM" UTC strings).
    ///
    /// Slots are sorted and deduplicated so the walk below can rely on
    /// chronological order within a day.
    pub fn from_config(config: &CalendarConfig) -> Result<Self> {
        Ok(Self {
            light: parse_template(&config.light_slots)?,
            dark: parse_template(&config.dark_slots)?,
        })
    }

    /// Compute the next free publish slot strictly after `bound`.
    ///
    /// Walks forward day-by-day through the variant's slot list; the first
    /// slot strictly after `bound` whose exact timestamp does not appear in
    /// `booked` is returned. "Occupied" means exact equality — slot identity,
    /// not proximity. No minimum lead time: if the very next slot is minutes
    /// away, that is the answer (callers needing lead time pass a later
    /// bound).
    pub fn next_slot(
        &self,
        variant: Variant,
        bound: DateTime<Utc>,
        booked: &[DateTime<Utc>],
    ) -> Result<DateTime<Utc>> {
        let slots = match variant {
            Variant::Light => &self.light,
            Variant::Dark => &self.dark,
        };
        if slots.is_empty() {
            return Err(ScheduleError::UnknownVariant(variant.to_string()));
        }

        // Every day offers `slots.len()` candidates and `booked` is finite,
        // so a free slot always exists within this horizon.
        let horizon_days = booked.len() as u64 / slots.len() as u64 + 2;

        let mut day = bound.date_naive();
        for _ in 0..=horizon_days {
            for time in slots {
                let candidate = day.and_time(*time).and_utc();
                if candidate > bound && !booked.contains(&candidate) {
                    return Ok(candidate);
                }
            }
            day = day
                .checked_add_days(Days::new(1))
                .ok_or_else(|| ScheduleError::Validation("slot date overflow".into()))?;
        }

        // Unreachable given the horizon above.
        Err(ScheduleError::Validation(
            "no free slot found within horizon".into(),
        ))
    }
}

fn parse_template(slots: &[String]) -> Result<Vec<NaiveTime>> {
    let mut parsed = Vec::with_capacity(slots.len());
    for s in slots {
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|e| ScheduleError::Validation(format!("bad slot time '{s}': {e}")))?;
        parsed.push(time);
    }
    parsed.sort();
    parsed.dedup();
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reelcast_core::config::CalendarConfig;

    fn calendar() -> SlotCalendar {
        SlotCalendar::from_config(&CalendarConfig::default()).expect("default config parses")
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn bound_on_slot_returns_next_slot_not_same() {
        // Bound falls exactly on the 00:00 slot — "strictly after" means 08:00.
        let cal = calendar();
        let next = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 0, 0), &[])
            .unwrap();
        assert_eq!(next, utc(2026, 1, 1, 8, 0, 0));
    }

    #[test]
    fn dark_variant_uses_its_own_template() {
        let cal = calendar();
        let next = cal
            .next_slot(Variant::Dark, utc(2026, 1, 1, 0, 0, 0), &[])
            .unwrap();
        assert_eq!(next, utc(2026, 1, 1, 4, 0, 0));
    }

    #[test]
    fn booked_slot_is_skipped() {
        let cal = calendar();
        let booked = vec![utc(2026, 1, 1, 8, 0, 0)];
        let next = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 0, 0), &booked)
            .unwrap();
        assert_eq!(next, utc(2026, 1, 1, 16, 0, 0));
    }

    #[test]
    fn full_day_booked_rolls_over_to_next_day() {
        let cal = calendar();
        let booked = vec![
            utc(2026, 1, 1, 8, 0, 0),
            utc(2026, 1, 1, 16, 0, 0),
            utc(2026, 1, 2, 0, 0, 0),
        ];
        let next = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 0, 0), &booked)
            .unwrap();
        assert_eq!(next, utc(2026, 1, 2, 8, 0, 0));
    }

    #[test]
    fn near_miss_booking_does_not_occupy_slot() {
        // Occupancy is exact equality: a booking one second off the template
        // slot does not block it.
        let cal = calendar();
        let booked = vec![utc(2026, 1, 1, 8, 0, 1)];
        let next = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 0, 0), &booked)
            .unwrap();
        assert_eq!(next, utc(2026, 1, 1, 8, 0, 0));
    }

    #[test]
    fn result_is_strictly_after_bound_and_unbooked() {
        let cal = calendar();
        let bound = utc(2026, 3, 15, 7, 59, 59);
        let booked = vec![utc(2026, 3, 15, 8, 0, 0), utc(2026, 3, 15, 16, 0, 0)];
        let next = cal.next_slot(Variant::Light, bound, &booked).unwrap();
        assert!(next > bound);
        assert!(!booked.contains(&next));
        assert_eq!(next, utc(2026, 3, 16, 0, 0, 0));
    }

    #[test]
    fn idempotent_for_identical_snapshot() {
        let cal = calendar();
        let bound = utc(2026, 6, 1, 13, 30, 0);
        let booked = vec![utc(2026, 6, 1, 16, 0, 0)];
        let a = cal.next_slot(Variant::Dark, bound, &booked).unwrap();
        let b = cal.next_slot(Variant::Dark, bound, &booked).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, utc(2026, 6, 1, 20, 0, 0));
    }

    #[test]
    fn empty_template_is_unknown_variant() {
        let config = CalendarConfig {
            light_slots: vec![],
            dark_slots: vec!["04:00".into()],
        };
        let cal = SlotCalendar::from_config(&config).unwrap();
        let err = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 0, 0), &[])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownVariant(_)));
    }

    #[test]
    fn malformed_slot_string_is_rejected() {
        let config = CalendarConfig {
            light_slots: vec!["25:99".into()],
            dark_slots: vec![],
        };
        assert!(SlotCalendar::from_config(&config).is_err());
    }

    #[test]
    fn template_is_sorted_regardless_of_config_order() {
        let config = CalendarConfig {
            light_slots: vec!["16:00".into(), "00:00".into(), "08:00".into()],
            dark_slots: vec!["04:00".into()],
        };
        let cal = SlotCalendar::from_config(&config).unwrap();
        let next = cal
            .next_slot(Variant::Light, utc(2026, 1, 1, 0, 30, 0), &[])
            .unwrap();
        assert_eq!(next, utc(2026, 1, 1, 8, 0, 0));
    }
}
