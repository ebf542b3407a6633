// Sync-window filtering: keep only the messages recorded on a given local day

use chrono::{Local, NaiveDate};

use crate::types::Message;

/// Messages whose timestamp falls on `date` in local time.
/// Untimestamped messages never match. Order is preserved.
pub fn messages_on(messages: &[Message], date: NaiveDate) -> Vec<Message> {
    messages
        .iter()
        .filter(|message| {
            message
                .timestamp
                .map(|ts| ts.with_timezone(&Local).date_naive() == date)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Messages recorded today (local calendar day)
pub fn today_messages(messages: &[Message]) -> Vec<Message> {
    messages_on(messages, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use chrono::{Duration, TimeZone, Utc};

    fn at_local(date: NaiveDate, hour: u32) -> chrono::DateTime<Utc> {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_messages_on_keeps_order_and_drops_untimestamped() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let messages = vec![
            Message::new(Role::User, "first", Some(at_local(day, 9))),
            Message::new(Role::Assistant, "undated", None),
            Message::new(Role::User, "yesterday", Some(at_local(day - Duration::days(1), 23))),
            Message::new(Role::Assistant, "second", Some(at_local(day, 12))),
            Message::new(Role::User, "tomorrow", Some(at_local(day + Duration::days(1), 0))),
        ];

        let kept: Vec<_> = messages_on(&messages, day)
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(kept, vec!["first", "second"]);
    }

    #[test]
    fn test_today_messages() {
        let now = Utc::now();
        let messages = vec![
            Message::new(Role::User, "now", Some(now)),
            Message::new(Role::User, "last week", Some(now - Duration::days(7))),
        ];

        let today = today_messages(&messages);
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].content, "now");
    }

    #[test]
    fn test_empty_input() {
        assert!(today_messages(&[]).is_empty());
    }
}
