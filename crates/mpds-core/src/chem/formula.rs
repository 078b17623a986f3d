use serde_json::Value;

/// Normalise an MPDS chemical formula into a short, comparable form.
///
/// Keeps the first whitespace-separated token, drops the `x` used for
/// variable stoichiometry, unwraps a single enclosing `[...]`, optionally
/// strips enclosing round brackets, and finally turns the remaining round
/// brackets into square ones.
pub fn short_formula(formula: &str, strip_round_brackets: bool) -> String {
    let Some(token) = formula.split_whitespace().next() else {
        return String::new();
    };
    let mut short = token.replace('x', "");

    if short.starts_with('[') && short.matches('[').count() == 1 && short.ends_with(']') {
        short = short.trim_matches(|c| c == '[' || c == ']').to_string();
    }

    if strip_round_brackets {
        short = short.trim_matches(|c| c == '(' || c == ')').to_string();
    }

    short.replace('(', "[").replace(')', "]")
}

/// Whether a JSON value can be read as a single number.
pub fn is_scalar(value: &Value) -> bool {
    scalar_value(value).is_some()
}

/// Read a JSON number, or a string holding one, as `f64`.
pub fn scalar_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_token_only() {
        assert_eq!(short_formula("Fe2O3 rt", true), "Fe2O3");
        assert_eq!(short_formula("  NaCl  ", true), "NaCl");
    }

    #[test]
    fn test_variable_stoichiometry() {
        assert_eq!(short_formula("Fe1-xO", true), "Fe1-O");
    }

    #[test]
    fn test_square_brackets_unwrapped() {
        assert_eq!(short_formula("[Co(NH3)6]", false), "Co[NH3]6");
        assert_eq!(short_formula("[Fe][CN]6", true), "[Fe][CN]6");
    }

    #[test]
    fn test_round_brackets() {
        assert_eq!(short_formula("(Mg)O", true), "Mg]O");
        assert_eq!(short_formula("Ca(OH)2", true), "Ca[OH]2");
        assert_eq!(short_formula("(NH4)2SO4", false), "[NH4]2SO4");
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(short_formula("", true), "");
        assert_eq!(short_formula("   ", true), "");
    }

    #[test]
    fn test_is_scalar() {
        assert!(is_scalar(&json!(1.5)));
        assert!(is_scalar(&json!(3)));
        assert!(is_scalar(&json!("2.25")));
        assert!(is_scalar(&json!(true)));
        assert!(!is_scalar(&json!("eV")));
        assert!(!is_scalar(&json!(null)));
        assert!(!is_scalar(&json!([1, 2])));
    }
}
