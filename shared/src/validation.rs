use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

static DNI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8}$").expect("valid DNI pattern"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{9}$").expect("valid phone pattern"));

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::Phone)
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(ValidationError::Email)
    }
}

pub fn validate_dni(dni: &str) -> Result<(), ValidationError> {
    if DNI_PATTERN.is_match(dni) {
        Ok(())
    } else {
        Err(ValidationError::Dni)
    }
}

/// Keeps only the digits of a phone number as typed, e.g. "987 654 321".
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Customer data entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerForm {
    pub full_name: String,
    pub dni: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl CustomerForm {
    /// Trims every field and strips separators from the phone number.
    pub fn normalized(&self) -> CustomerForm {
        CustomerForm {
            full_name: self.full_name.trim().to_string(),
            dni: self.dni.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(&self.phone),
            address: self.address.trim().to_string(),
        }
    }

    /// Returns the first failing field, phone and email first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_phone(&self.phone)?;
        validate_email(&self.email)?;
        validate_dni(&self.dni)?;
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::FullName);
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::Address);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CustomerForm {
        CustomerForm {
            full_name: "Rosa Quispe Mamani".to_string(),
            dni: "45781236".to_string(),
            email: "rosa@example.pe".to_string(),
            phone: "987654321".to_string(),
            address: "Av. Arequipa 1234, Lima".to_string(),
        }
    }

    #[test]
    fn phone_must_be_exactly_nine_digits() {
        assert!(validate_phone("987654321").is_ok());
        for bad in ["", "98765432", "9876543210", "98765432a", "+51987654", "９８７６５４３２１"] {
            assert_eq!(validate_phone(bad), Err(ValidationError::Phone), "{bad}");
        }
    }

    #[test]
    fn email_only_needs_an_at_sign() {
        assert!(validate_email("a@b").is_ok());
        assert!(validate_email("@").is_ok());
        assert_eq!(validate_email("rosa.example.pe"), Err(ValidationError::Email));
    }

    #[test]
    fn dni_must_be_exactly_eight_digits() {
        assert!(validate_dni("00000001").is_ok());
        for bad in ["", "1234567", "123456789", "1234567X", " 2345678"] {
            assert_eq!(validate_dni(bad), Err(ValidationError::Dni), "{bad}");
        }
    }

    #[test]
    fn form_reports_phone_before_email() {
        let mut form = form();
        form.phone = "123".to_string();
        form.email = "nope".to_string();
        assert_eq!(form.validate(), Err(ValidationError::Phone));

        form.phone = "987654321".to_string();
        assert_eq!(form.validate(), Err(ValidationError::Email));
    }

    #[test]
    fn form_requires_name_and_address() {
        let mut blank_name = form();
        blank_name.full_name = "   ".to_string();
        assert_eq!(blank_name.validate(), Err(ValidationError::FullName));

        let mut blank_address = form();
        blank_address.address = String::new();
        assert_eq!(blank_address.validate(), Err(ValidationError::Address));

        assert!(form().validate().is_ok());
    }

    #[test]
    fn normalized_strips_phone_separators() {
        let mut raw = form();
        raw.phone = "987 654-321".to_string();
        raw.dni = " 45781236 ".to_string();
        let normalized = raw.normalized();
        assert_eq!(normalized.phone, "987654321");
        assert_eq!(normalized.dni, "45781236");
        assert!(normalized.validate().is_ok());
    }
}
