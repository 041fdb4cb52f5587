//! Date arithmetic for the calendar pages.
//!
//! All boundaries are computed on the studio's wall clock (a fixed UTC
//! offset from configuration) and converted to UTC instants for querying.
//! Ranges are half-open: `from <= starts_at < to`.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Day cells show at most this many events before collapsing into "+N more".
pub const MAX_EVENTS_PER_DAY: usize = 3;

/// Years accepted from query strings and forms.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

pub fn year_in_window(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// `YYYY-MM-DD` within the accepted years.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .filter(|d| year_in_window(*d))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

impl ViewMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("week") => ViewMode::Week,
            Some("day") => ViewMode::Day,
            _ => ViewMode::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Month => "month",
            ViewMode::Week => "week",
            ViewMode::Day => "day",
        }
    }
}

/// A calendar month, addressed as `YYYY-MM` in query strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let (y, m) = raw.trim().split_once('-')?;
        if y.len() != 4 || m.is_empty() || m.len() > 2 {
            return None;
        }
        let year: i32 = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }
        Some(MonthKey { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthKey { year: date.year(), month: date.month() }
    }

    /// `?month=` value, falling back to the month containing `today`.
    pub fn from_query(raw: Option<&str>, today: NaiveDate) -> Self {
        raw.and_then(Self::parse).unwrap_or_else(|| Self::from_date(today))
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.shift(1).first_day().pred_opt().unwrap_or(NaiveDate::MIN)
    }

    pub fn shift(&self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        MonthKey {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn prev(&self) -> Self {
        self.shift(-1)
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Half-open UTC interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Range {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

/// UTC instant of local midnight on `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    local_to_utc(naive, offset)
}

fn local_to_utc(naive: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    // A fixed offset has exactly one mapping for every local time.
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Today on the studio's wall clock.
pub fn today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

pub fn month_range(key: MonthKey, offset: FixedOffset) -> Range {
    Range {
        from: local_midnight(key.first_day(), offset),
        to: local_midnight(key.next().first_day(), offset),
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn week_range(anchor: NaiveDate, offset: FixedOffset) -> Range {
    let start = week_start(anchor);
    Range {
        from: local_midnight(start, offset),
        to: local_midnight(start + Duration::days(7), offset),
    }
}

pub fn day_range(anchor: NaiveDate, offset: FixedOffset) -> Range {
    Range {
        from: local_midnight(anchor, offset),
        to: local_midnight(anchor + Duration::days(1), offset),
    }
}

pub fn view_range(view: ViewMode, key: MonthKey, anchor: NaiveDate, offset: FixedOffset) -> Range {
    match view {
        ViewMode::Month => month_range(key, offset),
        ViewMode::Week => week_range(anchor, offset),
        ViewMode::Day => day_range(anchor, offset),
    }
}

/// Title shown above the grid, e.g. `2026-10`, `10/12 – 10/18, 2026`, `2026-10-16 (Fri)`.
pub fn view_title(view: ViewMode, key: MonthKey, anchor: NaiveDate) -> String {
    match view {
        ViewMode::Month => key.label(),
        ViewMode::Week => week_label(anchor),
        ViewMode::Day => anchor.format("%Y-%m-%d (%a)").to_string(),
    }
}

pub fn week_label(anchor: NaiveDate) -> String {
    let start = week_start(anchor);
    let end = start + Duration::days(6);
    format!(
        "{}/{} – {}/{}, {}",
        start.month(),
        start.day(),
        end.month(),
        end.day(),
        start.year()
    )
}

/// Anchor day for week/day views: the `?date=` value when valid, else today
/// if it falls inside the month, else the 1st.
pub fn anchor_date(key: MonthKey, raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    if let Some(d) = raw.and_then(parse_date) {
        return d;
    }
    if key.contains(today) { today } else { key.first_day() }
}

/// Inclusive bounds of the Sunday-start weeks covering the month.
pub fn grid_bounds(key: MonthKey) -> (NaiveDate, NaiveDate) {
    let first = key.first_day();
    let last = key.last_day();
    let start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
    let end = last + Duration::days((6 - last.weekday().num_days_from_sunday()) as i64);
    (start, end)
}

/// Query range for the month grid including the leading/trailing days.
pub fn grid_range(key: MonthKey, offset: FixedOffset) -> Range {
    let (start, end) = grid_bounds(key);
    Range {
        from: local_midnight(start, offset),
        to: local_midnight(end + Duration::days(1), offset),
    }
}

#[derive(Debug, Clone)]
pub struct DayCell<E> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub events: Vec<E>,
    pub more: usize,
}

impl<E> DayCell<E> {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Lay `events` out on the Sunday-start grid of `key`. `date_of` gives the
/// local day an event belongs to. Events keep their input order inside a day.
pub fn month_grid<E, F>(key: MonthKey, events: &[E], date_of: F, today: NaiveDate) -> Vec<Vec<DayCell<E>>>
where
    E: Clone,
    F: Fn(&E) -> NaiveDate,
{
    let (start, end) = grid_bounds(key);
    let mut weeks = Vec::new();
    let mut week = Vec::with_capacity(7);
    let mut day = start;
    while day <= end {
        let on_day: Vec<&E> = events.iter().filter(|e| date_of(*e) == day).collect();
        let more = on_day.len().saturating_sub(MAX_EVENTS_PER_DAY);
        week.push(DayCell {
            date: day,
            in_month: key.contains(day),
            is_today: day == today,
            events: on_day.into_iter().take(MAX_EVENTS_PER_DAY).cloned().collect(),
            more,
        });
        if week.len() == 7 {
            weeks.push(std::mem::take(&mut week));
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    weeks
}

/// Weekday header for Sunday-start grids.
pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Parse a form/API timestamp: RFC 3339 (any offset) or a `datetime-local`
/// value (`YYYY-MM-DDTHH:MM[:SS]`, also with a space) read on the studio clock.
/// Years outside `MIN_YEAR..=MAX_YEAR` are rejected.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            const LOCAL_FORMATS: [&str; 4] =
                ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];
            LOCAL_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|naive| local_to_utc(naive, offset))
        }
    };
    parsed.filter(|at| year_in_window(at.date_naive()))
}

/// Value for an `<input type="datetime-local">`.
pub fn to_local_input(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y-%m-%dT%H:%M").to_string()
}

pub fn format_local(at: DateTime<Utc>, offset: FixedOffset, fmt: &str) -> String {
    at.with_timezone(&offset).format(fmt).to_string()
}
