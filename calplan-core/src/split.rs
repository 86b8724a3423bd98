//! Weighted split boundaries.
//!
//! For duration `D` and percent `p` the first segment is
//! `[start, start + p% of D]` and the second is `[start + (100 - p)% of D, end]`.
//! Only `p = 50` gives a strict partition; other values may overlap or leave
//! a gap between the two segments.

use chrono::Duration;

use crate::error::{CalPlanError, CalPlanResult};
use crate::event::{CalendarEvent, EventTime, validate_range};

pub const DEFAULT_SPLIT_PERCENT: f64 = 50.0;

/// `[start, end)` of one split segment.
pub type Segment = (EventTime, EventTime);

fn offset_at(duration: Duration, percent: f64) -> Duration {
    let millis = duration.num_milliseconds() as f64 * percent / 100.0;
    Duration::milliseconds(millis.round() as i64)
}

/// Compute both segments for `percent`.
///
/// Fails with `InvalidSplitPercent` outside `[0, 100]` and with
/// `InvalidRange` when the input range or either segment is empty.
pub fn split_bounds(
    start: &EventTime,
    end: &EventTime,
    all_day: bool,
    percent: f64,
) -> CalPlanResult<(Segment, Segment)> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(CalPlanError::InvalidSplitPercent(percent));
    }
    validate_range(start, end)?;

    let duration = end.to_utc() - start.to_utc();
    let first_end = start.shifted(offset_at(duration, percent), all_day);
    let second_start = start.shifted(offset_at(duration, 100.0 - percent), all_day);

    let first = (start.normalized(all_day), first_end);
    let second = (second_start, end.normalized(all_day));
    validate_range(&first.0, &first.1)?;
    validate_range(&second.0, &second.1)?;

    Ok((first, second))
}

/// The two replacement events for `event`, carrying its title, color and
/// description. Neither has a remote id yet.
pub fn split_event(
    event: &CalendarEvent,
    percent: f64,
) -> CalPlanResult<(CalendarEvent, CalendarEvent)> {
    let ((first_start, first_end), (second_start, second_end)) =
        split_bounds(&event.start, &event.end, event.all_day, percent)?;

    let piece = |start: EventTime, end: EventTime| CalendarEvent {
        id: None,
        start,
        end,
        ..event.clone()
    };

    Ok((
        piece(first_start, first_end),
        piece(second_start, second_end),
    ))
}
