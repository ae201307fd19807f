//! Rupee formatting with Indian digit grouping.

/// Group digits the Indian way: the last three, then pairs (`12,34,567`).
#[must_use]
pub fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// Format whole rupees, e.g. `₹1,23,456` or `-₹80,000`.
#[must_use]
pub fn format_inr(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}₹{}", group_indian(amount.unsigned_abs()))
}

/// Compact rupee format: `₹1.23 Cr`, `₹4.50 L`, `₹12.5K`, `₹999`.
#[must_use]
pub fn format_inr_compact(amount: i64) -> String {
    const CRORE: f64 = 10_000_000.0;
    const LAKH: f64 = 100_000.0;
    const THOUSAND: f64 = 1_000.0;

    #[allow(clippy::cast_precision_loss)]
    let value = amount as f64;
    let abs = value.abs();

    if abs >= CRORE {
        format!("₹{:.2} Cr", value / CRORE)
    } else if abs >= LAKH {
        format!("₹{:.2} L", value / LAKH)
    } else if abs >= THOUSAND {
        format!("₹{:.1}K", value / THOUSAND)
    } else {
        format!("₹{amount}")
    }
}
