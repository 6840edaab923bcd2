#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Link step kinds into a [`Chain`](crate::Chain), evaluated left to right.
///
/// ```
/// use agentmatch::{chain, StepKind};
///
/// let version = chain![StepKind::down("version"), StepKind::CleanVersion];
/// assert_eq!(version.to_string(), "Down([1-]version) > CleanVersion()");
/// ```
#[macro_export]
macro_rules! chain {
    ($first:expr $(, $rest:expr)* $(,)?) => {{
        let rest: ::std::vec::Vec<$crate::StepKind> = ::std::vec![$($rest),*];
        $crate::Chain::new($first, rest)
    }};
}
