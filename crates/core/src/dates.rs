//! Date rendering for the Brazilian back-office UI.

/// Reformat an ISO-ish date (`YYYY-MM-DD`, optionally followed by `T...` or a
/// space and a time) as `DD/MM/YYYY`.
///
/// Input that does not split into three `-` separated parts is returned as-is.
pub fn format_iso_date_br(value: &str) -> String {
    let date = value
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or_default();
    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{day}/{month}/{year}"),
        _ => value.to_string(),
    }
}
