use std::io::Write;
use std::path::Path;

use crate::pipeline::Dashboard;
use crate::types::{Result, Scale};

/// Write dashboard to JSON file
pub fn write_json_file(dashboard: &Dashboard, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dashboard)?;
    Ok(())
}

/// Write dashboard to JSON string
pub fn to_json_string(dashboard: &Dashboard) -> Result<String> {
    Ok(serde_json::to_string_pretty(dashboard)?)
}

/// Write dashboard to stdout
pub fn write_json_stdout(dashboard: &Dashboard) -> Result<()> {
    let json = to_json_string(dashboard)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}

/// Placeholder for values that cannot be shown
pub const PLACEHOLDER: &str = "-";

/// Integer with `.` as thousands separator, e.g. `1.234.567`
pub fn format_int(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let n = value.trunc() as i64;
    let digits = n.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Percentage with `,` as decimal separator, e.g. `30,00%`.
///
/// Undefined ratios render as the placeholder.
pub fn format_pct(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) if r.is_finite() => {
            let pct = r * 100.0;
            let fixed = format!("{:.2}", pct.abs());
            let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
            let whole: f64 = int_part.parse().unwrap_or(0.0);
            let sign = if pct < 0.0 { "-" } else { "" };
            format!("{}{},{}%", sign, format_int(whole), dec_part)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Render a series value for the chosen scale
pub fn format_value(value: Option<f64>, scale: Scale) -> String {
    match scale {
        Scale::Count => value.map(format_int).unwrap_or_else(|| PLACEHOLDER.to_string()),
        Scale::Percent => format_pct(value),
    }
}
