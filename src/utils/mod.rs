pub mod perf;

pub use perf::Stopwatch;

/// Extract a short type name from the full module path.
///
/// Given `"name_keeper::handlers::HelpIntentHandler"`, returns `"HelpIntentHandler"`.
pub fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(
            short_type_name("name_keeper::handlers::HelpIntentHandler"),
            "HelpIntentHandler"
        );
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
