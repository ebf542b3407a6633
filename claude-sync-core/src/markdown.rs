// Markdown rendering of a day's messages for one project

use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::types::Message;

pub const DEFAULT_PROJECT: &str = "default";

/// `YYYY-MM-DD`, the name of the per-day output folder
pub fn date_folder(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Long-form date used in the document heading, e.g. `2024年3月15日`
pub fn long_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Render messages under a dated heading. Performs no filtering.
pub fn format_markdown(messages: &[Message], project: &str, date: NaiveDate) -> String {
    let mut lines: Vec<&str> = Vec::with_capacity(2 + messages.len() * 6);
    let heading = format!("# {} - {}", long_date(date), project);
    let headings: Vec<String> = messages
        .iter()
        .map(|message| format!("## {}", message.role.speaker()))
        .collect();

    lines.push(&heading);
    lines.push("");
    for (message, speaker) in messages.iter().zip(&headings) {
        lines.push(speaker);
        lines.push("");
        lines.push(&message.content);
        lines.push("");
        lines.push("---");
        lines.push("");
    }

    lines.join("\n")
}

/// Project slug from the encoded project directory a session lives in.
///
/// Claude Code encodes the working directory by replacing `/` with `-`, so
/// `/Users/alice/dev/app` becomes `-Users-alice-dev-app`. Leading tokens that
/// are `users` or among the first two are treated as the home prefix and
/// dropped; the remainder is joined and lowercased.
pub fn project_slug(session_path: &Path) -> String {
    let encoded = session_path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parts: Vec<&str> = encoded.split('-').filter(|p| !p.is_empty()).collect();

    let start = parts
        .iter()
        .enumerate()
        .take_while(|(i, part)| *i < 2 || part.eq_ignore_ascii_case("users"))
        .count();

    let slug = parts[start..].join("-").to_lowercase();
    if slug.is_empty() {
        DEFAULT_PROJECT.to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_long_date_has_no_padding() {
        assert_eq!(long_date(day()), "2024年3月15日");
        assert_eq!(date_folder(day()), "2024-03-15");
        let new_year = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(long_date(new_year), "2025年1月5日");
        assert_eq!(date_folder(new_year), "2025-01-05");
    }

    #[test]
    fn test_format_markdown_layout() {
        let messages = vec![
            Message::new(Role::User, "How do I list files?", None),
            Message::new(Role::Assistant, "Use `ls`.\n\nOr `ls -la`.", None),
        ];

        let expected = "# 2024年3月15日 - my-app\n\
                        \n\
                        ## User\n\
                        \n\
                        How do I list files?\n\
                        \n\
                        ---\n\
                        \n\
                        ## Claude\n\
                        \n\
                        Use `ls`.\n\nOr `ls -la`.\n\
                        \n\
                        ---\n";
        assert_eq!(format_markdown(&messages, "my-app", day()), expected);
    }

    #[test]
    fn test_format_markdown_deterministic() {
        let messages = vec![Message::new(Role::User, "same", None)];
        assert_eq!(
            format_markdown(&messages, "p", day()),
            format_markdown(&messages, "p", day())
        );
    }

    #[test]
    fn test_format_markdown_empty() {
        assert_eq!(format_markdown(&[], "p", day()), "# 2024年3月15日 - p\n");
    }

    #[test]
    fn test_project_slug_strips_home_prefix() {
        let path = Path::new("/h/.claude/projects/-Users-alice-dev-My-App/abc.jsonl");
        assert_eq!(project_slug(path), "dev-my-app");

        let path = Path::new("/h/.claude/projects/-home-bob-work-api/abc.jsonl");
        assert_eq!(project_slug(path), "work-api");
    }

    #[test]
    fn test_project_slug_skips_users_after_prefix() {
        let path = Path::new("/p/-Volumes-data-Users-site/abc.jsonl");
        assert_eq!(project_slug(path), "site");
    }

    #[test]
    fn test_project_slug_fallback() {
        assert_eq!(project_slug(Path::new("/p/-Users-alice/abc.jsonl")), "default");
        assert_eq!(project_slug(Path::new("/p/---/abc.jsonl")), "default");
        assert_eq!(project_slug(Path::new("abc.jsonl")), "default");
    }
}
