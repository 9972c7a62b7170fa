use super::types::{Frequency, MonetaryEvent, MonthAnchor, NormalizedEvent};

pub fn normalize_event(event: &MonetaryEvent) -> NormalizedEvent {
    NormalizedEvent {
        kind: event.kind,
        amount: event.amount,
        frequency: event.frequency,
        start_date: event.start_date,
        end_date: event.end_date,
        sign: event.kind.sign(),
        start_month: MonthAnchor::from(event.start_date),
        end_month: event.end_date.map(MonthAnchor::from),
    }
}

pub fn normalize_events(events: &[MonetaryEvent]) -> Vec<NormalizedEvent> {
    events.iter().map(normalize_event).collect()
}

/// Whether `event` applies in the given month (1..=12). Day of month is ignored.
pub fn fires(event: &NormalizedEvent, year: i16, month: i8) -> bool {
    let current = MonthAnchor::new(year, month);
    if current < event.start_month {
        return false;
    }
    if event.end_month.is_some_and(|end| current > end) {
        return false;
    }

    match event.frequency {
        Frequency::Once => current == event.start_month,
        Frequency::Monthly => true,
        Frequency::Annual => month == event.start_month.month,
    }
}
