/// Formats a value the way the reports print numbers: '.' as thousands
/// separator, ',' as decimal separator, always two decimals.
/// Ex: 1234.56 -> "1.234,56"
pub fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, b) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*b as char);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{},{}", sign, grouped, frac_part)
}
