//! Number formatting for report cells.

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Large counts with a `B`/`M`/`K` suffix and two decimals.
pub fn fmt_count(n: f64) -> String {
    if n >= 1e9 {
        format!("{:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("{:.2}M", n / 1e6)
    } else if n >= 1e3 {
        format!("{:.2}K", n / 1e3)
    } else {
        format!("{n:.0}")
    }
}

/// Byte counts as plain integers grouped by thousands (`1,234,567`).
pub fn fmt_bytes(n: f64) -> String {
    let whole = n.trunc();
    let digits = group_thousands(whole.abs() as u64);
    if whole < 0.0 {
        format!("-{digits}")
    } else {
        digits
    }
}

pub fn group_thousands(n: u64) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn fmt_percent(v: f64) -> String {
    format!("{v:.1}%")
}

/// Bytes expressed in gibibytes, one decimal.
pub fn fmt_gib(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / GIB)
}

/// `cache_reference` -> `Cache Reference`, `l1d_miss` -> `L1D Miss`.
pub fn display_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
