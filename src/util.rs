/// Quotes an argument for the device shell, e.g. `a'b` becomes `'a'\''b'`.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_inner_classes_and_single_quotes() {
        assert_eq!(shell_quote("com.a/.B$C"), "'com.a/.B$C'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
