//! Check-digit validation of Brazilian tax ids (CPF for people, CNPJ for organizations).
//!
//! Callers strip formatting first; any non-digit character makes the input invalid.

use regex::Regex;
use std::sync::LazyLock;

pub static RE_NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

const CPF_LENGTH: usize = 11;
const CNPJ_LENGTH: usize = 14;

const CPF_FIRST_WEIGHTS: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
const CPF_SECOND_WEIGHTS: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl DocumentKind {
    /// 11 digits is a CPF, 14 a CNPJ.
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            CPF_LENGTH => Some(DocumentKind::Cpf),
            CNPJ_LENGTH => Some(DocumentKind::Cnpj),
            _ => None,
        }
    }

    fn len(self) -> usize {
        match self {
            DocumentKind::Cpf => CPF_LENGTH,
            DocumentKind::Cnpj => CNPJ_LENGTH,
        }
    }

    fn weights(self) -> (&'static [u32], &'static [u32]) {
        match self {
            DocumentKind::Cpf => (&CPF_FIRST_WEIGHTS, &CPF_SECOND_WEIGHTS),
            DocumentKind::Cnpj => (&CNPJ_FIRST_WEIGHTS, &CNPJ_SECOND_WEIGHTS),
        }
    }
}

/// Removes every non-digit character (`111.444.777-35` -> `11144477735`).
pub fn strip_non_digits(raw: &str) -> String {
    RE_NON_DIGITS.replace_all(raw, "").into_owned()
}

/// Weighted modulo-11 check digit over `digits`, one weight per digit.
fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

pub fn validate(kind: DocumentKind, digits: &str) -> bool {
    let values: Vec<u32> = match digits.chars().map(|c| c.to_digit(10)).collect() {
        Some(values) => values,
        None => return false,
    };
    if values.len() != kind.len() {
        return false;
    }
    if values.iter().all(|&d| d == values[0]) {
        return false;
    }

    let (first_weights, second_weights) = kind.weights();
    let base = first_weights.len();

    let first = check_digit(&values[..base], first_weights);
    if first != values[base] {
        return false;
    }
    let second = check_digit(&values[..=base], second_weights);
    second == values[base + 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_valid_numbers() {
        assert!(validate(DocumentKind::Cpf, "11144477735"));
        assert!(validate(DocumentKind::Cpf, "12345678909"));
        assert!(validate(DocumentKind::Cnpj, "11222333000181"));
    }

    #[test]
    fn rejects_wrong_check_digits() {
        assert!(!validate(DocumentKind::Cpf, "12345678900"));
        assert!(!validate(DocumentKind::Cpf, "12345678901"));
        assert!(!validate(DocumentKind::Cnpj, "11222333000182"));
    }

    #[test]
    fn rejects_repeated_digits_even_when_checksum_matches() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(11);
            assert!(!validate(DocumentKind::Cpf, &cpf), "{cpf}");
            let cnpj = d.to_string().repeat(14);
            assert!(!validate(DocumentKind::Cnpj, &cnpj), "{cnpj}");
        }
    }

    #[test]
    fn rejects_wrong_length_and_non_digits() {
        assert!(!validate(DocumentKind::Cpf, "1114447773"));
        assert!(!validate(DocumentKind::Cpf, "11222333000181"));
        assert!(!validate(DocumentKind::Cnpj, "11144477735"));
        assert!(!validate(DocumentKind::Cpf, "111.444.777-35"));
        assert!(!validate(DocumentKind::Cpf, ""));
    }

    #[test]
    fn single_digit_changes_invalidate_a_cpf() {
        let valid = "11144477735";
        for pos in 0..valid.len() {
            for replacement in '0'..='9' {
                let mut chars: Vec<char> = valid.chars().collect();
                if chars[pos] == replacement {
                    continue;
                }
                chars[pos] = replacement;
                let mutated: String = chars.into_iter().collect();
                assert!(!validate(DocumentKind::Cpf, &mutated), "{mutated}");
            }
        }
    }

    #[test]
    fn strips_formatting() {
        assert_eq!(strip_non_digits("111.444.777-35"), "11144477735");
        assert_eq!(strip_non_digits("11.222.333/0001-81"), "11222333000181");
        assert_eq!(strip_non_digits("abc"), "");
    }

    #[test]
    fn kind_from_length() {
        assert_eq!(DocumentKind::from_len(11), Some(DocumentKind::Cpf));
        assert_eq!(DocumentKind::from_len(14), Some(DocumentKind::Cnpj));
        assert_eq!(DocumentKind::from_len(12), None);
    }
}
