use std::borrow::Cow;
use validator::ValidationError;

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    match value.trim().is_empty() {
        false => Ok(()),
        true => Err(ValidationError::new("REQUIRED_FIELD")
            .with_message(Cow::from("This field must not be empty"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_whitespace_only_values() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank(" \t\n\r").is_err());
    }

    #[test]
    fn accepts_values_with_content() {
        assert!(validate_not_blank("Cleats").is_ok());
        assert!(validate_not_blank("  soccer_cleats  ").is_ok());
    }
}
