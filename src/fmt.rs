/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let sign = if val < 0.0 { "-" } else { "" };
    let total_cents = (val.abs() * 100.0).round() as u64;
    let (dollars, cents) = (total_cents / 100, total_cents % 100);
    let mut digits = dollars.to_string();
    let mut pos = digits.len() as isize - 3;
    while pos > 0 {
        digits.insert(pos as usize, ',');
        pos -= 3;
    }
    format!("{sign}${digits}.{cents:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(45.0), "$45.00");
        assert_eq!(money(1234.56), "$1,234.56");
        assert_eq!(money(-500.00), "-$500.00");
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1000000.99), "$1,000,000.99");
    }
}
