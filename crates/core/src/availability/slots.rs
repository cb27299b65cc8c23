//! Candidate slot generation
//!
//! Pure functions: given the pooled busy intervals (sorted by start) and the
//! request, produce conflict-free candidates. Single-day mode walks the
//! window at 15-minute granularity inside the working-hour band; multi-day
//! mode emits one aggregate block per start date whose whole span survives a
//! coarse overlap test.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use slotwise_domain::constants::{MAX_CANDIDATE_SLOTS, SLOT_GRANULARITY_MINUTES};
use slotwise_domain::{AvailabilityRequest, BusyInterval, CandidateSlot};

/// Generates, orders, and caps the candidate list.
///
/// `busy` must already be sorted ascending by start; the conflict scan
/// relies on that ordering to stop early.
#[must_use]
pub fn generate_candidates(
    request: &AvailabilityRequest,
    busy: &[BusyInterval],
    include_weekends: bool,
) -> Vec<CandidateSlot> {
    let mut slots = if request.is_multi_day {
        multi_day_blocks(request, busy, include_weekends)
    } else {
        single_day_slots(request, busy, include_weekends)
    };
    slots.sort_by_key(|slot| slot.start);
    slots.truncate(MAX_CANDIDATE_SLOTS);
    slots
}

fn single_day_slots(
    request: &AvailabilityRequest,
    busy: &[BusyInterval],
    include_weekends: bool,
) -> Vec<CandidateSlot> {
    let duration = Duration::minutes(request.slot_duration_minutes);
    let granularity = Duration::minutes(SLOT_GRANULARITY_MINUTES);
    let mut slots = Vec::new();

    let mut date = request.window_start.date_naive();
    let last_date = request.window_end.date_naive();
    while date <= last_date {
        if include_weekends || !is_weekend(date) {
            let band_start = at(date, request.day_window_start);
            let band_end = at(date, request.day_window_end);

            // Candidates stay anchored to the band start even when the
            // request window begins mid-day.
            let mut slot_start = band_start;
            while slot_start + duration <= band_end {
                let slot_end = slot_start + duration;
                if slot_start >= request.window_start
                    && slot_end <= request.window_end
                    && is_free(busy, slot_start, slot_end)
                {
                    slots.push(CandidateSlot::new(slot_start, slot_end));
                }
                slot_start += granularity;
            }
        }
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
    slots
}

/// One aggregate block per start date whose whole multi-day span is free.
///
/// The span check is deliberately coarse: any busy interval overlapping the
/// full `[start-day band start, end-day band end)` range disqualifies the
/// date, with no per-day working-hour precision inside the span.
fn multi_day_blocks(
    request: &AvailabilityRequest,
    busy: &[BusyInterval],
    include_weekends: bool,
) -> Vec<CandidateSlot> {
    let capacity = request.daily_capacity_minutes();
    if capacity <= 0 {
        return Vec::new();
    }
    let required_days = request.slot_duration_minutes.div_ceil(capacity);
    let mut slots = Vec::new();

    let mut date = request.window_start.date_naive();
    let last_date = request.window_end.date_naive();
    while date <= last_date {
        if include_weekends || !is_weekend(date) {
            let span_start = at(date, request.day_window_start);
            let span_end = at(date + Duration::days(required_days - 1), request.day_window_end);
            if span_end > request.window_end {
                break;
            }
            if span_start >= request.window_start && is_free(busy, span_start, span_end) {
                slots.push(CandidateSlot::new(span_start, span_end));
            }
        }
        let Some(next) = date.succ_opt() else { break };
        date = next;
    }
    slots
}

/// The one correctness-critical predicate: a candidate is free iff no busy
/// interval satisfies `slot_start < busy.end && slot_end > busy.start`.
fn is_free(busy: &[BusyInterval], slot_start: DateTime<Utc>, slot_end: DateTime<Utc>) -> bool {
    for interval in busy {
        // Sorted by start: nothing past slot_end can overlap.
        if interval.start >= slot_end {
            break;
        }
        if interval.overlaps(slot_start, slot_end) {
            return false;
        }
    }
    true
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use slotwise_domain::{CalendarCredential, ProviderKind};

    use super::*;

    fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
    }

    fn busy(start: DateTime<Utc>, end: DateTime<Utc>) -> BusyInterval {
        BusyInterval::new(start, end, 0, ProviderKind::Google).unwrap()
    }

    fn sorted(mut intervals: Vec<BusyInterval>) -> Vec<BusyInterval> {
        intervals.sort_by_key(|i| i.start);
        intervals
    }

    fn request(
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        duration: i64,
    ) -> AvailabilityRequest {
        AvailabilityRequest {
            participant_credentials: vec![CalendarCredential {
                access_token: "t".to_string(),
                provider_hint: None,
                email: None,
            }],
            window_start,
            window_end,
            slot_duration_minutes: duration,
            day_window_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            day_window_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_multi_day: false,
            include_weekends: None,
        }
    }

    // 2026-03-02 is a Monday.
    #[test]
    fn daily_busy_block_carves_out_surrounding_starts() {
        let req = request(ts(2, 9, 0), ts(2, 17, 0), 30);
        let pool = sorted(vec![busy(ts(2, 10, 0), ts(2, 11, 0))]);

        let slots = generate_candidates(&req, &pool, false);
        let starts: Vec<DateTime<Utc>> = slots.iter().map(|s| s.start).collect();

        // Free right up to the busy block
        assert!(starts.contains(&ts(2, 9, 0)));
        assert!(starts.contains(&ts(2, 9, 30)));
        // Every start whose 30-minute slot would touch 10:00-11:00 is gone
        for minutes in [45, 60, 75, 90, 105] {
            let excluded = ts(2, 9, 0) + Duration::minutes(minutes);
            assert!(!starts.contains(&excluded), "start {excluded} should conflict");
        }
        // Free again exactly at the busy end
        assert!(starts.contains(&ts(2, 11, 0)));
        // 8h band, 30min slots at 15min steps: 31 candidates minus 5 conflicts
        assert_eq!(slots.len(), 26);
    }

    #[test]
    fn no_slot_ever_overlaps_any_busy_interval() {
        let req = request(ts(2, 9, 0), ts(6, 17, 0), 45);
        let pool = sorted(vec![
            busy(ts(2, 10, 0), ts(2, 11, 0)),
            busy(ts(3, 9, 0), ts(3, 12, 30)),
            busy(ts(4, 16, 0), ts(4, 17, 0)),
            busy(ts(5, 12, 0), ts(5, 12, 15)),
        ]);

        let slots = generate_candidates(&req, &pool, false);
        assert!(!slots.is_empty());
        for slot in &slots {
            for interval in &pool {
                assert!(
                    !interval.overlaps(slot.start, slot.end),
                    "slot {} overlaps busy {}",
                    slot.start,
                    interval.start
                );
            }
        }
    }

    #[test]
    fn slots_stay_inside_the_working_hour_band() {
        let req = request(ts(2, 0, 0), ts(2, 23, 59), 60);
        let slots = generate_candidates(&req, &[], false);

        let band_start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let band_end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(!slots.is_empty());
        for slot in &slots {
            assert!(slot.start.time() >= band_start);
            assert!(slot.end.time() <= band_end);
            assert_eq!(slot.date, slot.start.date_naive());
        }
    }

    #[test]
    fn results_are_ordered_and_capped() {
        // Three weeks of 15-minute slots vastly exceeds the cap
        let req = request(ts(2, 9, 0), ts(20, 17, 0), 15);
        let slots = generate_candidates(&req, &[], false);

        assert_eq!(slots.len(), 100);
        for pair in slots.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn weekends_are_skipped_unless_included() {
        // 2026-03-07/08 are Sat/Sun
        let req = request(ts(7, 9, 0), ts(8, 17, 0), 60);

        assert!(generate_candidates(&req, &[], false).is_empty());

        let weekend_slots = generate_candidates(&req, &[], true);
        assert!(!weekend_slots.is_empty());
        assert!(weekend_slots.iter().any(|s| s.weekday == "Sat"));
        assert!(weekend_slots.iter().any(|s| s.weekday == "Sun"));
    }

    #[test]
    fn mid_day_window_start_keeps_grid_anchoring() {
        // Window starts 10:07; first viable anchored candidate is 10:15
        let window_start = ts(2, 10, 7);
        let req = request(window_start, ts(2, 17, 0), 30);
        let slots = generate_candidates(&req, &[], false);

        assert_eq!(slots[0].start, ts(2, 10, 15));
    }

    #[test]
    fn multi_day_blocks_span_required_days() {
        // 4h daily band, 8h duration -> 2 consecutive days required
        let mut req = request(ts(2, 0, 0), ts(6, 23, 0), 480);
        req.is_multi_day = true;
        req.day_window_start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        req.day_window_end = NaiveTime::from_hms_opt(14, 0, 0).unwrap();

        // Busy Wednesday midday knocks out Tue and Wed starts
        let pool = sorted(vec![busy(ts(4, 11, 0), ts(4, 12, 0))]);
        let slots = generate_candidates(&req, &pool, false);
        let start_dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();

        assert!(start_dates.contains(&NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
        assert!(!start_dates.contains(&NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()));
        assert!(!start_dates.contains(&NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
        assert!(start_dates.contains(&NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()));

        // Each block covers the full span
        let monday_block = &slots[0];
        assert_eq!(monday_block.start, ts(2, 10, 0));
        assert_eq!(monday_block.end, ts(3, 14, 0));
    }

    #[test]
    fn multi_day_spans_never_exceed_the_window() {
        let mut req = request(ts(2, 0, 0), ts(3, 23, 0), 480);
        req.is_multi_day = true;
        req.day_window_start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        req.day_window_end = NaiveTime::from_hms_opt(14, 0, 0).unwrap();

        // Only Monday can start a 2-day block inside a Mon-Tue window
        let slots = generate_candidates(&req, &[], false);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, ts(2, 10, 0));
    }

    #[test]
    fn multi_day_duration_fitting_one_day_yields_single_day_spans() {
        let mut req = request(ts(2, 0, 0), ts(3, 23, 0), 240);
        req.is_multi_day = true;
        req.day_window_start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        req.day_window_end = NaiveTime::from_hms_opt(14, 0, 0).unwrap();

        let slots = generate_candidates(&req, &[], false);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, ts(2, 10, 0));
        assert_eq!(slots[0].end, ts(2, 14, 0));
    }
}
