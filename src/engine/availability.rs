use ulid::Ulid;

use crate::limits::MAX_QUERY_WINDOW_MS;
use crate::model::{Ms, Window, MINUTE_MS};

use super::conflict::{find_conflicts, validate_window};
use super::{Engine, EngineError};

/// Free sub-windows of `query` for a business (optionally one staff
/// member's scope): active booking windows are merged and subtracted, and
/// fragments shorter than `min_duration_minutes` are dropped.
pub async fn free_windows(
    engine: &Engine,
    business_id: Ulid,
    staff_id: Option<Ulid>,
    query: Window,
    min_duration_minutes: Option<u32>,
) -> Result<Vec<Window>, EngineError> {
    validate_window(&query)?;
    if query.duration_ms() > MAX_QUERY_WINDOW_MS {
        return Err(EngineError::Validation("query window too wide"));
    }

    let occupied = find_conflicts(engine.store.as_ref(), business_id, staff_id, query, None).await?;
    let mut busy: Vec<Window> = occupied
        .iter()
        .map(|b| {
            let w = b.window();
            Window::new(w.start.max(query.start), w.end.min(query.end))
        })
        .collect();
    busy.sort_by_key(|w| w.start);

    let mut free = subtract_windows(&[query], &merge_overlapping(&busy));
    if let Some(min) = min_duration_minutes {
        let min_ms = min as Ms * MINUTE_MS;
        free.retain(|w| w.duration_ms() >= min_ms);
    }
    Ok(free)
}

/// Chop free windows into consecutive slot-length start instants, for slot
/// pickers. A window shorter than one slot yields nothing.
pub fn slot_starts(free: &[Window], slot_minutes: u32) -> Vec<Ms> {
    let slot_ms = slot_minutes as Ms * MINUTE_MS;
    if slot_ms <= 0 {
        return Vec::new();
    }
    let mut starts = Vec::new();
    for window in free {
        let mut cursor = window.start;
        while cursor + slot_ms <= window.end {
            starts.push(cursor);
            cursor += slot_ms;
        }
    }
    starts
}

/// Merge sorted overlapping/adjacent windows into disjoint windows.
pub fn merge_overlapping(sorted: &[Window]) -> Vec<Window> {
    let mut merged: Vec<Window> = Vec::new();
    for &window in sorted {
        if let Some(last) = merged.last_mut()
            && window.start <= last.end {
                last.end = last.end.max(window.end);
                continue;
            }
        merged.push(window);
    }
    merged
}

/// Subtract sorted disjoint `to_remove` windows from sorted `base` windows.
pub fn subtract_windows(base: &[Window], to_remove: &[Window]) -> Vec<Window> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Window::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Window::new(current_start, current_end));
        }
    }

    result
}
