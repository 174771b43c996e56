use std::sync::{Mutex, MutexGuard, PoisonError};

/// Writes each value through `f`, putting `separator` between the ones that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Longest prefix of `value` not exceeding `len` bytes that ends on a char boundary.
pub fn char_prefix(value: &str, len: usize) -> &str {
    let mut end = len.min(value.len());
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Locks the mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::char_prefix(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::separated_by;

    #[test]
    fn separator_only_between_written_values() {
        let mut out = String::from("SELECT ");
        separated_by(
            &mut out,
            ["a", "", "b", "c"],
            |out, v| out.push_str(v),
            ", ",
        );
        assert_eq!(out, "SELECT a, b, c");
    }

    #[test]
    fn truncates_long_queries() {
        let query = "x".repeat(600);
        let printed = format!("{}", truncate_long!(query));
        assert_eq!(printed.len(), 500);
        assert!(printed.ends_with("..."));
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
    }
}
