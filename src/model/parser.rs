// File: src/model/parser.rs
//! One-line "smart input" for creating and editing tasks from the shell.
//!
//! `Buy milk !high @tomorrow 9am #shopping cat:Home rec:weekly rem:2030-01-01 8:00`
use crate::model::{Priority, Recurrence, Task};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmartInput {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<NaiveDateTime>,
    /// Raw due text, present whenever an `@` token was given, parsed or not.
    pub due_text: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub reminder: Option<NaiveDateTime>,
}

impl SmartInput {
    pub fn has_due(&self) -> bool {
        self.due_text.is_some()
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

pub fn parse_time_string(s: &str) -> Option<NaiveTime> {
    let lower = s.to_lowercase();

    let parse_12h = |s: &str, is_pm: bool| -> Option<NaiveTime> {
        let (h, m) = if let Some((h_str, m_str)) = s.split_once(':') {
            (h_str.parse::<u32>().ok()?, m_str.parse::<u32>().ok()?)
        } else {
            (s.parse::<u32>().ok()?, 0)
        };
        if !(1..=12).contains(&h) || m > 59 {
            return None;
        }
        let h_24 = if h == 12 {
            if is_pm { 12 } else { 0 }
        } else if is_pm {
            h + 12
        } else {
            h
        };
        NaiveTime::from_hms_opt(h_24, m, 0)
    };

    if let Some(stripped) = lower.strip_suffix("am") {
        return parse_12h(stripped, false);
    }
    if let Some(stripped) = lower.strip_suffix("pm") {
        return parse_12h(stripped, true);
    }

    if let Some((h_str, m_str)) = lower.split_once(':') {
        let h = h_str.parse::<u32>().ok()?;
        let m = m_str.parse::<u32>().ok()?;
        return NaiveTime::from_hms_opt(h, m, 0);
    }

    None
}

/// Dates relative to `today`: ISO dates, today/tomorrow, `3d`, `2w`.
pub fn parse_smart_date(val: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(val, "%Y-%m-%d") {
        return Some(date);
    }
    let lower = val.to_lowercase();
    if lower == "today" {
        return Some(today);
    }
    if lower == "tomorrow" {
        return offset_days(today, 1);
    }
    if let Some(n) = lower.strip_suffix('d').and_then(|s| s.parse::<i64>().ok()) {
        return offset_days(today, n);
    }
    if let Some(n) = lower.strip_suffix('w').and_then(|s| s.parse::<i64>().ok()) {
        return offset_days(today, n.checked_mul(7)?);
    }
    None
}

// Out-of-range offsets yield None, leaving the text unparsed.
fn offset_days(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    today.checked_add_signed(Duration::try_days(days)?)
}

fn parse_priority(val: &str) -> Option<Priority> {
    match val.to_lowercase().as_str() {
        "1" | "h" | "high" => Some(Priority::High),
        "2" | "m" | "med" | "medium" => Some(Priority::Medium),
        "3" | "l" | "low" => Some(Priority::Low),
        _ => None,
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            } else {
                out.push('\\');
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        unescape(&s[1..s.len() - 1])
    } else {
        unescape(s)
    }
}

pub fn quote_value(s: &str) -> String {
    if s.contains(' ') || s.contains('"') || s.contains('\\') || s.contains('#') || s.is_empty() {
        let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

/// Splits on whitespace, keeping `"quoted values"` and `\ ` escapes inside one token.
pub fn split_input_respecting_quotes(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                current.push('\\');
            }
            '"' => {
                in_quote = !in_quote;
                current.push(c);
            }
            ws if ws.is_whitespace() && !in_quote => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

fn is_special_token(word: &str) -> bool {
    let lower = word.to_lowercase();
    word.starts_with('@')
        || word.starts_with('#')
        || word.starts_with('!')
        || lower.starts_with("cat:")
        || lower.starts_with("rec:")
        || lower.starts_with("rem:")
        || lower.starts_with("desc:")
}

pub fn escape_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(|word| {
            if is_special_token(word) {
                format!("\\{}", word)
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_smart_input(input: &str, default_reminder_time: NaiveTime) -> SmartInput {
    parse_smart_input_at(input, Local::now().date_naive(), default_reminder_time)
}

/// Same as [`parse_smart_input`] with an explicit "today" for relative dates.
pub fn parse_smart_input_at(
    input: &str,
    today: NaiveDate,
    default_reminder_time: NaiveTime,
) -> SmartInput {
    let mut parsed = SmartInput::default();
    let mut title_words = Vec::new();
    let stream = split_input_respecting_quotes(input);

    let mut i = 0;
    while i < stream.len() {
        let token = &stream[i];
        let token_lower = token.to_lowercase();
        let next_time = stream.get(i + 1).and_then(|t| parse_time_string(t));
        let mut consumed = 1;

        if let Some(val) = token.strip_prefix('!')
            && let Some(p) = parse_priority(val)
        {
            parsed.priority = Some(p);
        } else if let Some(val) = token.strip_prefix('@')
            && !val.is_empty()
        {
            let raw = strip_quotes(val);
            if let Some(date) = parse_smart_date(&raw, today)
                && let Some(t) = next_time
            {
                parsed.due = Some(date.and_time(t));
                parsed.due_text = Some(format!("{} {}", raw, stream[i + 1]));
                consumed = 2;
            } else {
                // Unparsable dates are kept for display only.
                parsed.due = parse_due_value(&raw, today);
                parsed.due_text = Some(raw);
            }
        } else if let Some(val) = token.strip_prefix('#')
            && !val.is_empty()
        {
            let tag = strip_quotes(val);
            if !parsed.tags.contains(&tag) {
                parsed.tags.push(tag);
            }
        } else if token_lower.starts_with("cat:") && token.len() > 4 {
            parsed.category = Some(strip_quotes(&token[4..]));
        } else if token_lower.starts_with("desc:") {
            parsed.description = Some(strip_quotes(&token[5..])).filter(|d| !d.is_empty());
        } else if let Some(val) = token_lower.strip_prefix("rec:")
            && let Ok(rec) = val.parse::<Recurrence>()
        {
            parsed.recurrence = Some(rec);
        } else if let Some(val) = token_lower.strip_prefix("rem:")
            && let Some(reminder) = parse_reminder(val, next_time, today, default_reminder_time)
        {
            parsed.reminder = Some(reminder);
            if next_time.is_some() && parse_time_string(val).is_none() {
                consumed = 2;
            }
        } else {
            title_words.push(unescape(token));
        }
        i += consumed;
    }

    parsed.title = title_words.join(" ");
    parsed
}

/// Parses a complete due value: a date, a date and a time, or a bare time (today).
pub fn parse_due_value(raw: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    if let Some(date) = parse_smart_date(raw, today) {
        return Some(date.and_time(end_of_day()));
    }
    if let Some((d, t)) = raw.trim().split_once(' ')
        && let (Some(date), Some(time)) = (parse_smart_date(d, today), parse_time_string(t.trim()))
    {
        return Some(date.and_time(time));
    }
    parse_time_string(raw).map(|t| today.and_time(t))
}

fn parse_reminder(
    val: &str,
    next_time: Option<NaiveTime>,
    today: NaiveDate,
    default_time: NaiveTime,
) -> Option<NaiveDateTime> {
    if let Some(t) = parse_time_string(val) {
        return Some(today.and_time(t));
    }
    let date = parse_smart_date(val, today)?;
    Some(date.and_time(next_time.unwrap_or(default_time)))
}

/// Renders a task back into smart input, suitable for pre-filling an edit.
pub fn to_smart_string(task: &Task) -> String {
    let mut s = escape_title(task.title());
    s.push_str(&format!(" !{}", task.priority().as_ref().to_lowercase()));
    if let Some(text) = task.due_text() {
        s.push_str(&format!(" @{}", quote_value(text)));
    } else if let Some(due) = task.due() {
        s.push_str(&format!(" @{}", due.format("%Y-%m-%d %H:%M")));
    }
    for tag in task.tags() {
        s.push_str(&format!(" #{}", quote_value(tag)));
    }
    if let Some(cat) = task.category() {
        s.push_str(&format!(" cat:{}", quote_value(cat)));
    }
    if task.recurrence() != Recurrence::None {
        s.push_str(&format!(" rec:{}", task.recurrence().as_ref().to_lowercase()));
    }
    if let Some(rem) = task.reminder() {
        s.push_str(&format!(" rem:{}", rem.format("%Y-%m-%d %H:%M")));
    }
    if let Some(desc) = task.description() {
        s.push_str(&format!(" desc:{}", quote_value(desc)));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 10).unwrap()
    }

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    fn parse(input: &str) -> SmartInput {
        parse_smart_input_at(input, today(), eight())
    }

    #[test]
    fn test_plain_title() {
        let p = parse("Buy milk");
        assert_eq!(p.title, "Buy milk");
        assert_eq!(p.priority, None);
        assert!(!p.has_due());
    }

    #[test]
    fn test_all_fields() {
        let p = parse(
            "Water plants !high @2030-06-12 14:30 #garden #home cat:House rec:weekly desc:\"back yard\"",
        );
        assert_eq!(p.title, "Water plants");
        assert_eq!(p.priority, Some(Priority::High));
        assert_eq!(
            p.due,
            NaiveDate::from_ymd_opt(2030, 6, 12)
                .unwrap()
                .and_hms_opt(14, 30, 0)
        );
        assert_eq!(p.due_text.as_deref(), Some("2030-06-12 14:30"));
        assert_eq!(p.tags, ["garden", "home"]);
        assert_eq!(p.category.as_deref(), Some("House"));
        assert_eq!(p.recurrence, Some(Recurrence::Weekly));
        assert_eq!(p.description.as_deref(), Some("back yard"));
    }

    #[test]
    fn test_relative_due_dates() {
        let p = parse("Call mom @tomorrow");
        assert_eq!(p.due, Some(NaiveDate::from_ymd_opt(2030, 6, 11).unwrap().and_time(end_of_day())));
        let p = parse("Taxes @2w");
        assert_eq!(p.due.map(|d| d.date()), NaiveDate::from_ymd_opt(2030, 6, 24));
    }

    #[test]
    fn test_quoted_due_with_time() {
        let p = parse("Standup @\"2030-06-12 9:30\"");
        assert_eq!(p.title, "Standup");
        assert_eq!(
            p.due,
            NaiveDate::from_ymd_opt(2030, 6, 12)
                .unwrap()
                .and_hms_opt(9, 30, 0)
        );
        assert_eq!(p.due_text.as_deref(), Some("2030-06-12 9:30"));
    }

    #[test]
    fn test_unparsable_due_keeps_text() {
        let p = parse("Paint fence @someday");
        assert_eq!(p.title, "Paint fence");
        assert_eq!(p.due, None);
        assert_eq!(p.due_text.as_deref(), Some("someday"));
        assert!(p.has_due());
    }

    #[test]
    fn test_reminder_uses_default_time() {
        let p = parse("Dentist rem:2030-07-01");
        assert_eq!(
            p.reminder,
            NaiveDate::from_ymd_opt(2030, 7, 1).unwrap().and_hms_opt(8, 0, 0)
        );
        let p = parse("Dentist rem:2030-07-01 9:15");
        assert_eq!(
            p.reminder,
            NaiveDate::from_ymd_opt(2030, 7, 1).unwrap().and_hms_opt(9, 15, 0)
        );
        assert_eq!(p.title, "Dentist");
    }

    #[test]
    fn test_escaped_and_invalid_tokens_stay_in_title() {
        let p = parse("Issue \\#42 !urgent rec:yearly");
        assert_eq!(p.title, "Issue #42 !urgent rec:yearly");
        assert_eq!(p.tags, Vec::<String>::new());
        assert_eq!(p.priority, None);
        assert_eq!(p.recurrence, None);
    }

    #[test]
    fn test_huge_offsets_do_not_parse() {
        assert_eq!(parse_smart_date("99999999d", today()), None);
        assert_eq!(parse_smart_date("9999999999999999w", today()), None);
        assert_eq!(parse_smart_date("-99999999d", today()), None);
        assert_eq!(parse_smart_date("3d", today()), NaiveDate::from_ymd_opt(2030, 6, 13));
        assert_eq!(parse_due_value("99999999d 10:00", today()), None);
    }

    #[test]
    fn test_time_strings() {
        assert_eq!(parse_time_string("2pm"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_time_string("12am"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time_string("07:45"), NaiveTime::from_hms_opt(7, 45, 0));
        assert_eq!(parse_time_string("25:00"), None);
        assert_eq!(parse_time_string("lunch"), None);
    }

    #[test]
    fn test_smart_string_round_trip_fields() {
        let p = parse("Report !low @2030-06-12 #work cat:Office rec:monthly");
        let mut task = Task::new(p.title.clone(), None, p.due, Priority::Low).unwrap();
        task.set_due_text(p.due_text.clone());
        task.set_tags(p.tags.clone());
        task.set_category(p.category.clone());
        task.set_recurrence(Recurrence::Monthly);

        let reparsed = parse(&to_smart_string(&task));
        assert_eq!(reparsed.title, "Report");
        assert_eq!(reparsed.priority, Some(Priority::Low));
        assert_eq!(reparsed.due, p.due);
        assert_eq!(reparsed.tags, p.tags);
        assert_eq!(reparsed.category, p.category);
        assert_eq!(reparsed.recurrence, Some(Recurrence::Monthly));
    }
}
