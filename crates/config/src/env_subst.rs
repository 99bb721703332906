/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup function.
///
/// This is the implementation used by [`substitute_env`]; the separate
/// signature makes it testable without mutating the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find('}') {
            Some(end) if end > 0 => {
                let var_name = &after_open[..end];
                match lookup(var_name) {
                    Some(val) => result.push_str(&val),
                    // Leave unresolved placeholder as-is.
                    None => {
                        result.push_str("${");
                        result.push_str(var_name);
                        result.push('}');
                    },
                }
                rest = &after_open[end + 1..];
            },
            // Empty `${}` or unterminated placeholder: emit literally.
            _ => {
                result.push_str("${");
                rest = after_open;
            },
        }
    }

    result.push_str(rest);
    result
}
