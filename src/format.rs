//! Display helpers shared by the terminal front end.

/// Renders a duration in milliseconds: `850ms`, `1.5s`, `2m 5s`.
pub fn format_time(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }

    let seconds = ms as f64 / 1000.0;
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }

    let whole_seconds = ms / 1000;
    format!("{}m {}s", whole_seconds / 60, whole_seconds % 60)
}

/// Renders an accuracy ratio in `[0, 1]` as a percentage with one decimal.
pub fn format_accuracy(accuracy: f64) -> String {
    format!("{:.1}%", accuracy * 100.0)
}

/// Groups digits in thousands: `1234567` becomes `1,234,567`.
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
