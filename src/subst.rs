use std::env;

use crate::args::ArgMap;
use crate::error::{Error, Result};

#[cfg(windows)]
fn escape_path(value: String) -> String {
    value.replace('\\', "/")
}

#[cfg(not(windows))]
fn escape_path(value: String) -> String {
    value
}

fn resolve(
    globals: Option<&ArgMap>,
    defs: Option<&ArgMap>,
    args: Option<&ArgMap>,
    name: &str,
) -> Option<String> {
    if let Some(value) = args.and_then(|a| a.get(name)) {
        return Some(value.to_string());
    }
    if let Some(value) = defs.and_then(|d| d.get(name)) {
        return Some(value.to_string());
    }
    if let Some(value) = globals.and_then(|g| g.get(name)) {
        return Some(value.to_string());
    }
    env::var(name).ok().map(escape_path)
}

/// Expand backtick references in `input`.
///
/// `` `name` `` is resolved against args, then defs, then globals, then
/// the process environment; the first hit wins and a miss expands to
/// nothing. An empty reference ` `` ` produces one literal backtick.
/// Running into end-of-input with a reference open is an error.
pub fn subst_args(
    globals: Option<&ArgMap>,
    defs: Option<&ArgMap>,
    args: Option<&ArgMap>,
    input: &str,
) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut reference: Option<String> = None;

    for c in input.chars() {
        match (&mut reference, c) {
            (None, '`') => {
                reference = Some(String::new());
            }
            (Some(name), '`') => {
                if name.is_empty() {
                    result.push('`');
                } else if let Some(value) = resolve(globals, defs, args, name) {
                    result.push_str(&value);
                }
                reference = None;
            }
            (None, c) => result.push(c),
            (Some(name), c) => name.push(c),
        }
    }

    if reference.is_some() {
        return Err(Error::UnterminatedReference);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_backticks_is_identity() {
        let s = "dest { file(\"/var/log/messages\"); };";
        assert_eq!(subst_args(None, None, None, s).unwrap(), s);
    }

    #[test]
    fn test_scope_order() {
        let mut globals = ArgMap::new();
        globals.set("host_name", "h1");
        let mut defs = ArgMap::new();
        defs.set("port", "514");
        let mut args = ArgMap::new();
        args.set("port", "6514");

        let out = subst_args(
            Some(&globals),
            Some(&defs),
            Some(&args),
            "dest(`host_name`:`port`)",
        )
        .unwrap();
        assert_eq!(out, "dest(h1:6514)");
        assert_eq!(out.len(), 13);
    }

    #[test]
    fn test_empty_reference_is_literal_backtick() {
        assert_eq!(subst_args(None, None, None, "a``b").unwrap(), "a`b");
    }

    #[test]
    fn test_missing_reference_is_empty() {
        let args = ArgMap::new();
        assert_eq!(
            subst_args(None, None, Some(&args), "x`no_such_name_here`y").unwrap(),
            "xy"
        );
    }

    #[test]
    fn test_environment_fallback() {
        std::env::set_var("CFGLEX_TEST_SUBST", "from-env");
        assert_eq!(
            subst_args(None, None, None, "`CFGLEX_TEST_SUBST`").unwrap(),
            "from-env"
        );
    }

    #[test]
    fn test_unterminated_reference() {
        let err = subst_args(None, None, None, "value is `unclosed").unwrap_err();
        assert!(matches!(err, Error::UnterminatedReference));
    }
}
