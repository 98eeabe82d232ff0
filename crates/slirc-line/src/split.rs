//! Parameter splitting shared by line decoding and chat-command parsing.
//!
//! IRC separates a line body into whitespace-delimited positional arguments
//! followed by an optional free-form trailing field. The same rule applies
//! to trigger-word command invocations inside message text, with a smaller
//! fixed-argument cap. Keeping one routine for both guarantees the two
//! never drift apart.

use smallvec::SmallVec;

/// Maximum positional arguments in a protocol line.
///
/// RFC 2812 allows fifteen parameters; the fifteenth is folded into the
/// trailing field whether or not it carries the `:` marker.
pub const MAX_PROTOCOL_ARGS: usize = 14;

/// Maximum positional arguments in a chat-command invocation. Everything
/// after the first argument is free-form trailing text.
pub const MAX_COMMAND_ARGS: usize = 1;

/// Borrowed split output: positional arguments plus optional trailing text.
pub type SplitArgs<'a> = (SmallVec<[&'a str; 15]>, Option<&'a str>);

/// Split `text` into positional arguments and trailing text.
///
/// Tokens are separated by runs of spaces. Splitting stops when a token
/// begins with the `:` trailing marker (the marker is stripped and the rest
/// of the line, possibly empty, becomes the trailing value) or when
/// `max_args` arguments have been taken (the rest of the line becomes the
/// trailing value without requiring a marker). Text with no trailing marker
/// and at most `max_args` tokens yields `None`, never `Some("")`.
pub fn split_args(text: &str, max_args: usize) -> SplitArgs<'_> {
    let mut args = SmallVec::new();
    let mut trailing = None;
    let bytes = text.as_bytes();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i] == b' ' {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if bytes[i] == b':' {
            trailing = Some(&text[i + 1..]);
            break;
        }
        if args.len() == max_args {
            trailing = Some(&text[i..]);
            break;
        }
        let start = i;
        while i < bytes.len() && bytes[i] != b' ' {
            i += 1;
        }
        args.push(&text[start..i]);
    }

    (args, trailing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_starts_trailing() {
        let (args, trailing) = split_args("#chan :hello world", MAX_PROTOCOL_ARGS);
        assert_eq!(args.as_slice(), ["#chan"]);
        assert_eq!(trailing, Some("hello world"));
    }

    #[test]
    fn test_no_marker_means_no_trailing() {
        let (args, trailing) = split_args("#chan +o somenick", MAX_PROTOCOL_ARGS);
        assert_eq!(args.as_slice(), ["#chan", "+o", "somenick"]);
        assert_eq!(trailing, None);
    }

    #[test]
    fn test_marker_with_empty_rest() {
        let (args, trailing) = split_args("#chan :", MAX_PROTOCOL_ARGS);
        assert_eq!(args.as_slice(), ["#chan"]);
        assert_eq!(trailing, Some(""));
    }

    #[test]
    fn test_empty_input() {
        let (args, trailing) = split_args("", MAX_PROTOCOL_ARGS);
        assert!(args.is_empty());
        assert_eq!(trailing, None);
    }

    #[test]
    fn test_space_runs_are_single_separators() {
        let (args, trailing) = split_args("a   b  :c  d", MAX_PROTOCOL_ARGS);
        assert_eq!(args.as_slice(), ["a", "b"]);
        assert_eq!(trailing, Some("c  d"));
    }

    #[test]
    fn test_marker_in_first_position() {
        let (args, trailing) = split_args(":all of it", MAX_PROTOCOL_ARGS);
        assert!(args.is_empty());
        assert_eq!(trailing, Some("all of it"));
    }

    #[test]
    fn test_cap_folds_rest_into_trailing() {
        let (args, trailing) = split_args("bob asdf qux", MAX_COMMAND_ARGS);
        assert_eq!(args.as_slice(), ["bob"]);
        assert_eq!(trailing, Some("asdf qux"));
    }

    #[test]
    fn test_exact_cap_leaves_trailing_absent() {
        let (args, trailing) = split_args("bob", MAX_COMMAND_ARGS);
        assert_eq!(args.as_slice(), ["bob"]);
        assert_eq!(trailing, None);
    }

    #[test]
    fn test_protocol_cap_at_fourteen() {
        let text = (1..=16).map(|n| format!("p{n}")).collect::<Vec<_>>().join(" ");
        let (args, trailing) = split_args(&text, MAX_PROTOCOL_ARGS);
        assert_eq!(args.len(), 14);
        assert_eq!(args[13], "p14");
        assert_eq!(trailing, Some("p15 p16"));
    }

    #[test]
    fn test_cap_respects_marker_first() {
        let (args, trailing) = split_args("bob :tail here", MAX_COMMAND_ARGS);
        assert_eq!(args.as_slice(), ["bob"]);
        assert_eq!(trailing, Some("tail here"));
    }
}
