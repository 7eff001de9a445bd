//! Property-based tests for rust_context_logger using proptest

use proptest::prelude::*;
use rust_context_logger::prelude::*;
use rust_context_logger::LevelRegistry;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Canonical names parse back in any letter case
    #[test]
    fn test_log_level_parse_any_case(level in any_level(), mask in any::<u8>()) {
        let mixed: String = level
            .to_str()
            .chars()
            .enumerate()
            .map(|(i, c)| if mask & (1 << (i % 8)) != 0 { c.to_ascii_lowercase() } else { c })
            .collect();
        let parsed: LogLevel = mixed.parse().unwrap();
        prop_assert_eq!(parsed, level);
    }

    /// Ordering follows the numeric severity
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, (a as u8) <= (b as u8));
        prop_assert_eq!(a.cmp(&b), (a as u8).cmp(&(b as u8)));
    }

    /// All three renderings are five characters wide
    #[test]
    fn test_log_level_renderings_aligned(level in any_level()) {
        prop_assert_eq!(level.as_lower().len(), 5);
        prop_assert_eq!(level.as_title().len(), 5);
        prop_assert_eq!(level.as_upper().len(), 5);
        prop_assert_eq!(level.as_lower().trim_end_matches('.'), level.to_str().to_lowercase());
    }

    /// Anything other than the five names is rejected
    #[test]
    fn test_log_level_rejects_unknown(name in "[a-z]{1,10}") {
        let known = ["trace", "debug", "info", "warn", "error"];
        prop_assume!(!known.contains(&name.as_str()));
        prop_assert!(name.parse::<LogLevel>().is_err());
    }
}

// ============================================================================
// Level Registry Tests
// ============================================================================

proptest! {
    /// A name resolves to the override of its longest configured prefix
    #[test]
    fn test_registry_longest_prefix(
        segments in prop::collection::vec("[a-z]{1,4}", 1..6),
        depth in 0usize..6,
        level in any_level(),
        default in any_level(),
    ) {
        let mut registry = LevelRegistry::new(default);
        let depth = depth.min(segments.len() - 1);
        let prefix = segments[..=depth].join(".");
        registry.set_override(prefix, level);

        let name = segments.join(".");
        prop_assert_eq!(registry.resolve(&name), level);

        let sibling = format!("{}x", segments[0]);
        prop_assert_eq!(registry.resolve(&sibling), default);
    }
}

// ============================================================================
// Template Tests
// ============================================================================

proptest! {
    /// Text without directives renders verbatim
    #[test]
    fn test_template_literal_passthrough(text in "[^%]{0,64}") {
        let renderer = TemplateRenderer::new(FormatTemplate::compile(&text), ContextStore::new());
        prop_assert_eq!(renderer.render("x", LogLevel::Info, "m"), text);
    }

    /// The message is inserted unchanged, whatever it contains
    #[test]
    fn test_template_message_verbatim(message in ".{0,64}", name in "[a-z.]{1,16}") {
        let renderer = TemplateRenderer::new(
            FormatTemplate::compile("%logger|%message|"),
            ContextStore::new(),
        );
        prop_assert_eq!(
            renderer.render(&name, LogLevel::Warn, &message),
            format!("{}|{}|", name, message)
        );
    }

    /// Context values fill `%key` directives
    #[test]
    fn test_template_context_value(key in "[a-z]{1,8}", value in "[ -~]{0,32}") {
        prop_assume!(!["date", "level", "logger", "message"].contains(&key.as_str()));
        let store = ContextStore::new();
        store.put(key.clone(), value.clone());
        let renderer = TemplateRenderer::new(FormatTemplate::compile(&format!("<%{}>", key)), store);
        prop_assert_eq!(renderer.render("x", LogLevel::Info, ""), format!("<{}>", value));
    }
}

// ============================================================================
// Message Formatting Tests
// ============================================================================

proptest! {
    /// Each placeholder takes one argument in order
    #[test]
    fn test_format_message_substitutes_in_order(args in prop::collection::vec("[a-z0-9]{0,8}", 0..8)) {
        let pattern = vec!["{}"; args.len()].join(",");
        let log_args: Vec<LogArg> = args.iter().map(|a| LogArg::from(a.as_str())).collect();
        let formatted = format_message(&pattern, &log_args);
        prop_assert_eq!(formatted.message, args.join(","));
        prop_assert!(formatted.error.is_none());
    }

    /// Missing arguments leave the remaining placeholders in place
    #[test]
    fn test_format_message_missing_arguments(placeholders in 1usize..8, given in 0usize..8) {
        let given = given.min(placeholders);
        let pattern = vec!["{}"; placeholders].join(" ");
        let args: Vec<LogArg> = (0..given).map(|i| LogArg::from(i)).collect();

        let formatted = format_message(&pattern, &args);
        let mut expected: Vec<String> = (0..given).map(|i| i.to_string()).collect();
        expected.extend(std::iter::repeat("{}".to_string()).take(placeholders - given));
        prop_assert_eq!(formatted.message, expected.join(" "));
    }

    /// A trailing error is bound, never substituted
    #[test]
    fn test_format_message_trailing_error(text in "[a-z ]{0,16}") {
        let report = Arc::new(ErrorReport::new("kind", "message"));
        let formatted = format_message(&format!("{} {{}}", text), &[LogArg::from(&report)]);
        prop_assert_eq!(formatted.message, format!("{} {{}}", text));
        prop_assert!(formatted.error.is_some());
    }
}

// ============================================================================
// Stack Filter Tests
// ============================================================================

proptest! {
    /// The sorted lookup agrees with a linear prefix scan
    #[test]
    fn test_stack_filter_matches_linear_scan(
        prefixes in prop::collection::vec("[ab:]{1,5}", 0..8),
        origin in "[ab:]{0,8}",
    ) {
        let filter = StackFilter::new(prefixes.clone());
        let expected = prefixes.iter().any(|p| origin.starts_with(p.as_str()));
        prop_assert_eq!(filter.is_unwanted(&origin), expected);
    }

    /// Stripping leaves only frames that are not unwanted
    #[test]
    fn test_stack_filter_strip(origins in prop::collection::vec("(std|app|tokio|lib)::[a-z]{1,4}", 0..12)) {
        let frames: Vec<StackFrame> = origins.iter().map(|o| StackFrame::new(o.clone(), "f")).collect();
        let report = Arc::new(ErrorReport::new("e", "m").with_frames(frames));

        let filter = StackFilter::default();
        prop_assert_eq!(filter.strip(&report), 1);

        let kept: Vec<String> = report.frames().into_iter().map(|f| f.origin).collect();
        let expected: Vec<String> = origins
            .into_iter()
            .filter(|o| !o.starts_with("std::") && !o.starts_with("tokio::"))
            .collect();
        prop_assert_eq!(kept, expected);
    }
}

// ============================================================================
// Context Store Tests
// ============================================================================

proptest! {
    /// Pops return pushed values in reverse order, then nothing
    #[test]
    fn test_context_stack_lifo(values in prop::collection::vec("[a-z]{1,6}", 0..10)) {
        let store = ContextStore::new();
        for v in &values {
            store.push_by_key("k", v.clone());
        }
        for v in values.iter().rev() {
            prop_assert_eq!(store.pop_by_key("k"), Some(v.clone()));
        }
        prop_assert_eq!(store.pop_by_key("k"), None);
    }
}
