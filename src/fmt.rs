const MONTH_ABBR: &[&str] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Ordinal day label: 1st, 2nd, 3rd, 4th, ... 11th, 12th, 13th, ... 21st.
pub fn day_suffix(day: u32) -> String {
    let suffix = if matches!(day % 100, 11..=13) {
        "th"
    } else {
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{day}{suffix}")
}

/// Three-letter month abbreviation for 1-12, `"???"` otherwise.
pub fn month_abbr(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBR.get(i as usize))
        .copied()
        .unwrap_or("???")
}

/// Parse a month given as `3`, `03`, `Mar` or `March`.
pub fn parse_month(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let lower = raw.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_ABBR
        .iter()
        .position(|m| lower.starts_with(&m.to_ascii_lowercase()))
        .map(|i| i as u32 + 1)
}

/// Format a quantity with thousands separators and no decimals: -1,234
pub fn quantity(val: f64) -> String {
    let negative = val < 0.0;
    let rounded = format!("{:.0}", val.abs());

    let mut with_commas = String::new();
    for (i, c) in rounded.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative && with_commas != "0" {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_suffix_table() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (24, "24th"),
            (30, "30th"),
            (31, "31st"),
        ];
        for (day, expected) in cases {
            assert_eq!(day_suffix(day), expected, "day {day}");
        }
    }

    #[test]
    fn test_month_abbr() {
        assert_eq!(month_abbr(1), "Jan");
        assert_eq!(month_abbr(12), "Dec");
        assert_eq!(month_abbr(0), "???");
        assert_eq!(month_abbr(13), "???");
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("3"), Some(3));
        assert_eq!(parse_month("03"), Some(3));
        assert_eq!(parse_month("mar"), Some(3));
        assert_eq!(parse_month("September"), Some(9));
        assert_eq!(parse_month("Ja"), None);
        assert_eq!(parse_month("Smarch"), None);
        // Range checking is the filter resolver's job.
        assert_eq!(parse_month("13"), Some(13));
    }

    #[test]
    fn test_quantity_formatting() {
        assert_eq!(quantity(1234.0), "1,234");
        assert_eq!(quantity(-500.0), "-500");
        assert_eq!(quantity(0.0), "0");
        assert_eq!(quantity(-0.2), "0");
        assert_eq!(quantity(1000000.6), "1,000,001");
        assert_eq!(quantity(42.0), "42");
    }
}
