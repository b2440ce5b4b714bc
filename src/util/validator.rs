use lazy_static::lazy_static;
use regex::Regex;

pub const EMAIL_RULE: &str = "invalid email format";
pub const CELLPHONE_RULE: &str = "invalid phone number format";
pub const PASSWORD_RULE: &str =
    "password must start with a letter and be 6-20 letters, digits or symbols";

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .unwrap();
    static ref CELLPHONE_RE: Regex = Regex::new(r"^(\+?86)?1[3-9][0-9]{9}$").unwrap();
    static ref PASSWORD_RE: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9!@#$%^&*()_+=.,?~\-]{5,19}$").unwrap();
}

pub fn is_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Mainland mobile number, optionally prefixed with the country code.
pub fn is_cellphone(s: &str) -> bool {
    CELLPHONE_RE.is_match(s)
}

pub fn is_password(s: &str) -> bool {
    PASSWORD_RE.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(is_email("alice@example.com"));
        assert!(is_email("a.b+c@mail.example.org"));
        assert!(!is_email("alice"));
        assert!(!is_email("alice@"));
        assert!(!is_email("alice@example"));
        assert!(!is_email("al ice@example.com"));
    }

    #[test]
    fn cellphones() {
        assert!(is_cellphone("13812345678"));
        assert!(is_cellphone("+8613812345678"));
        assert!(!is_cellphone("12812345678"));
        assert!(!is_cellphone("1381234567"));
        assert!(!is_cellphone("alice"));
    }

    #[test]
    fn passwords() {
        assert!(is_password("Abc12345"));
        assert!(is_password("abcdef"));
        assert!(is_password("a_b.c-d!20charsXXXXX"));
        assert!(!is_password("1abcdef"), "must start with a letter");
        assert!(!is_password("Abc12"), "too short");
        assert!(!is_password("Abcdefghijklmnopqrstu"), "too long");
        assert!(!is_password("Abc 12345"), "no spaces");
        assert!(!is_password(""));
    }
}
