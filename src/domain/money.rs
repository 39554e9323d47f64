use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// R$ 50,00 is stored as 5000 cents.
pub type Cents = i64;

/// Format cents as a display string with two decimals.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal string into cents. Accepts "100", "100.5", "100.50";
/// extra decimal digits are truncated ("0.999" -> 99 cents).
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((u, d)) => {
            if d.contains('.') {
                return Err(ParseCentsError::InvalidFormat);
            }
            (u, d)
        }
        None => (digits, ""),
    };
    // A sign or a lone dot is not a number
    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimal: i64 = match decimal_str.len() {
        0 => 0,
        // "5" means 50 cents
        1 => {
            decimal_str
                .parse::<i64>()
                .map_err(|_| ParseCentsError::InvalidFormat)?
                * 10
        }
        _ => decimal_str
            .get(..2)
            .ok_or(ParseCentsError::InvalidFormat)?
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    // Stored amounts are free text; absurdly long digit runs must degrade
    // to an error instead of overflowing
    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal))
        .ok_or(ParseCentsError::InvalidFormat)?;
    Ok(if negative { -cents } else { cents })
}

/// Lenient variant for amounts coming out of stored records: free-form text
/// entered over years of use is occasionally not a number at all. Malformed
/// input yields `None` so aggregation can treat it as a zero contribution
/// instead of failing a whole summary over one bad row.
pub fn parse_cents_lenient(input: &str) -> Option<Cents> {
    parse_cents(input).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
