use std::fmt::{self, Write};

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Write `[a, b, c]` with `sep` between items.
pub fn write_listing<W, I>(out: &mut W, items: I, sep: &str) -> fmt::Result
where
    W: Write + ?Sized,
    I: IntoIterator,
    I::Item: fmt::Display,
{
    out.write_char('[')?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.write_str(sep)?;
        }
        write!(out, "{}", item)?;
    }
    out.write_char(']')
}

pub fn listing<I>(items: I, sep: &str) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut s = String::new();
    // Writing into a String cannot fail.
    let _ = write_listing(&mut s, items, sep);
    s
}

/// One block glyph per value, scaled between the smallest and largest value.
pub fn sparkline(values: &[i64]) -> String {
    let (min, max) = match (values.iter().min(), values.iter().max()) {
        (Some(&lo), Some(&hi)) => (lo as i128, hi as i128),
        _                      => return String::new(),
    };
    let range = (max - min).max(1);
    values.iter()
        .map(|&v| SPARKS[(((v as i128 - min) * 7) / range).clamp(0, 7) as usize])
        .collect()
}

/// "3/4"
pub fn fmt_count(len: usize, capacity: usize) -> String {
    format!("{}/{}", len, capacity)
}

/// Fill level with no decimals: "75%"
pub fn fmt_fill_pct(len: usize, capacity: usize) -> String {
    if capacity == 0 {
        return "0%".to_string();
    }
    format!("{:.0}%", len as f64 * 100.0 / capacity as f64)
}
