use super::SendError;

/// Normalize a destination number to `+<digits>`, requiring a country code.
pub fn normalize(number: &str) -> Result<String, SendError> {
    let trimmed = number.trim();
    let Some(rest) = trimmed.strip_prefix('+') else {
        return Err(SendError::CountryCode(number.to_string()));
    };

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return Err(SendError::InvalidPhone(number.to_string())),
        }
    }

    if !(7..=15).contains(&digits.len()) {
        return Err(SendError::InvalidPhone(number.to_string()));
    }

    Ok(format!("+{}", digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators() {
        assert_eq!(normalize(" +91 87500-17154 ").unwrap(), "+918750017154");
        assert_eq!(normalize("+1 (415) 555.0100").unwrap(), "+14155550100");
    }

    #[test]
    fn requires_country_code() {
        assert!(matches!(
            normalize("8750017154"),
            Err(SendError::CountryCode(_))
        ));
        assert!(matches!(normalize(""), Err(SendError::CountryCode(_))));
    }

    #[test]
    fn rejects_letters_and_bad_lengths() {
        assert!(matches!(
            normalize("+91abc17154"),
            Err(SendError::InvalidPhone(_))
        ));
        assert!(matches!(normalize("+123"), Err(SendError::InvalidPhone(_))));
        assert!(matches!(
            normalize("+1234567890123456"),
            Err(SendError::InvalidPhone(_))
        ));
    }
}
