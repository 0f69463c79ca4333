//! Release notes shown by `catsync --history`.

/// `(version, date, change)` entries, newest first.
pub const HISTORY: &[(&str, &str, &str)] = &[
    (
        "0.3.0",
        "2026-09-28",
        "Security rules are created once per category value and skipped when a rule with the same name exists.",
    ),
    (
        "0.2.0",
        "2026-07-14",
        "List endpoints are walked page by page; rule creation waits for its task.",
    ),
    (
        "0.1.0",
        "2026-05-02",
        "Category keys and values upserted from a YAML file.",
    ),
];

/// The history as printable text, one entry per line.
pub fn render() -> String {
    HISTORY
        .iter()
        .map(|(version, date, change)| format!("{version}  {date}  {change}"))
        .collect::<Vec<_>>()
        .join("\n")
}
