use command_core::builder::{
    all_of, boolean, choices, choices_insensitive, double_num, enum_value, first_parsing, integer,
    literal, long_num, mark_true, none, only_one, optional, optional_weak,
    optional_weak_with_default, optional_with_default, remaining_joined_strings,
    remaining_raw_joined_strings, repeated, requiring_permission, seq, string,
};
use command_core::{
    ArgumentParseError, CommandArgs, CommandContext, CommandElement, CommandError, CommandSource,
    CommandSpec, Console, Element, Tokenizer, Value,
};
use strum::{AsRefStr, EnumIter};

struct Player {
    permissions: Vec<&'static str>,
}

impl CommandSource for Player {
    fn name(&self) -> &str {
        "player"
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
enum Difficulty {
    Peaceful,
    Easy,
    Hard,
}

fn parse(element: Element, input: &str) -> CommandContext {
    CommandSpec::new(element).parse(&Console, input).unwrap()
}

fn parse_error(element: Element, input: &str) -> ArgumentParseError {
    match CommandSpec::new(element).parse(&Console, input) {
        Err(CommandError::Parse(error)) => error,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

fn game_modes() -> Vec<(&'static str, Value)> {
    vec![("survival", Value::from(0)), ("creative", Value::from(1))]
}

// ============================================================================
// Sequences and leftovers
// ============================================================================

#[test]
fn sequence_binds_each_element() {
    let context = parse(seq(vec![string("player"), integer("amount")]), "alice 5");
    assert_eq!(context.one_as::<String>("player").as_deref(), Some("alice"));
    assert_eq!(context.one_as::<i32>("amount"), Some(5));
}

#[test]
fn leftover_tokens_are_rejected() {
    let error = parse_error(seq(vec![string("player"), integer("amount")]), "alice 5 extra");
    assert_eq!(error.message(), "Too many arguments!");
    assert_eq!(error.position(), 8);
    assert_eq!(error.usage(), Some("<player> <amount>"));
}

#[test]
fn bad_number_points_at_token() {
    let error = parse_error(seq(vec![string("player"), integer("amount")]), "alice ten");
    assert_eq!(error.message(), "Expected an integer, but input 'ten' was not");
    assert_eq!(error.position(), 6);
    assert_eq!(
        error.to_string(),
        "Expected an integer, but input 'ten' was not\nalice ten\n      ^\nUsage: <player> <amount>"
    );
}

#[test]
fn missing_tokens_fail() {
    let error = parse_error(seq(vec![string("player"), integer("amount")]), "alice");
    assert_eq!(error.message(), "Not enough arguments!");
}

#[test]
fn none_and_mark_true_consume_nothing() {
    let context = parse(seq(vec![none(), mark_true("confirmed")]), "");
    assert_eq!(context.one_as::<bool>("confirmed"), Some(true));
}

// ============================================================================
// Alternatives
// ============================================================================

#[test]
fn first_parsing_discards_bindings_of_failed_branches() {
    let element = first_parsing(vec![
        seq(vec![string("a"), integer("n")]),
        seq(vec![string("b"), string("c")]),
    ]);
    let context = parse(element, "x y");
    assert!(!context.has_any("a"));
    assert!(!context.has_any("n"));
    assert_eq!(context.one_as::<String>("b").as_deref(), Some("x"));
    assert_eq!(context.one_as::<String>("c").as_deref(), Some("y"));
}

#[test]
fn first_parsing_reports_last_failure() {
    let error = parse_error(first_parsing(vec![integer("n"), boolean("b")]), "zzz");
    assert_eq!(
        error.message(),
        "Argument was not a valid choice. Valid choices: true, t, yes, y, verify, 1, false, f, no, n, 0"
    );
}

#[test]
fn first_parsing_usage_joins_alternatives() {
    let element = first_parsing(vec![integer("n"), string("name")]);
    assert_eq!(element.usage(&Console), "<n>|<name>");
}

// ============================================================================
// Optional elements
// ============================================================================

#[test]
fn optional_without_input_binds_default() {
    let context = parse(optional_with_default(integer("n"), 7), "");
    assert_eq!(context.one_as::<i32>("n"), Some(7));

    let context = parse(optional(integer("n")), "");
    assert!(!context.has_any("n"));

    let context = parse(optional_weak_with_default(string("s"), "fallback"), "");
    assert_eq!(context.one_as::<String>("s").as_deref(), Some("fallback"));
}

#[test]
fn optional_never_fails_on_exhausted_args() {
    let element = optional_with_default(integer("n"), 3);
    let mut args = CommandArgs::new("", Vec::new());
    let mut context = CommandContext::new();
    element.parse(&Console, &mut args, &mut context).unwrap();
    assert_eq!(context.one_as::<i32>("n"), Some(3));
}

#[test]
fn optional_skips_failure_when_input_remains() {
    let element = seq(vec![
        optional_with_default(integer("n"), 1),
        string("a"),
        string("b"),
    ]);
    let context = parse(element, "x y");
    assert_eq!(context.one_as::<i32>("n"), Some(1));
    assert_eq!(context.one_as::<String>("a").as_deref(), Some("x"));
    assert_eq!(context.one_as::<String>("b").as_deref(), Some("y"));
}

#[test]
fn optional_rethrows_failure_on_last_token() {
    let error = parse_error(seq(vec![string("a"), optional(integer("n"))]), "x y");
    assert_eq!(error.message(), "Expected an integer, but input 'y' was not");
}

#[test]
fn weak_optional_always_skips_failures() {
    let context = parse(seq(vec![optional_weak(integer("n")), string("name")]), "bob");
    assert!(!context.has_any("n"));
    assert_eq!(context.one_as::<String>("name").as_deref(), Some("bob"));
}

#[test]
fn optional_usage_is_bracketed() {
    let element = seq(vec![string("player"), optional(integer("amount"))]);
    assert_eq!(element.usage(&Console), "<player> [<amount>]");
}

// ============================================================================
// Repetition
// ============================================================================

#[test]
fn repeated_parses_exact_count() {
    let context = parse(repeated(integer("n"), 3), "1 2 3");
    assert_eq!(context.all_as::<i32>("n"), [1, 2, 3]);
    assert_eq!(context.one("n"), None);
    assert_eq!(repeated(integer("n"), 3).usage(&Console), "3*<n>");
}

#[test]
fn all_of_consumes_everything() {
    let context = parse(all_of(string("w")), "a b c");
    assert_eq!(context.all_as::<String>("w"), ["a", "b", "c"]);
    assert_eq!(all_of(string("w")).usage(&Console), "<w>+");
}

#[test]
fn only_one_rejects_multiple_values() {
    let error = parse_error(only_one(all_of(string("w"))), "a b");
    assert_eq!(error.message(), "Argument w may have only one value!");

    let context = parse(only_one(string("w")), "a");
    assert_eq!(context.one_as::<String>("w").as_deref(), Some("a"));
}

// ============================================================================
// Permissions
// ============================================================================

#[test]
fn permission_guarded_argument() {
    let spec = CommandSpec::new(requiring_permission(string("target"), "admin.target"));

    let guest = Player {
        permissions: Vec::new(),
    };
    match spec.parse(&guest, "bob") {
        Err(CommandError::Parse(error)) => {
            assert_eq!(
                error.message(),
                "You do not have permission to use the target argument"
            );
        }
        other => panic!("expected a parse error, got {other:?}"),
    }

    let admin = Player {
        permissions: vec!["admin.target"],
    };
    let context = spec.parse(&admin, "bob").unwrap();
    assert_eq!(context.one_as::<String>("target").as_deref(), Some("bob"));
}

#[test]
fn command_permission_is_checked_first() {
    let spec = CommandSpec::new(string("x")).with_permission("cmd.use");
    let guest = Player {
        permissions: Vec::new(),
    };
    assert_eq!(
        spec.parse(&guest, "a").unwrap_err(),
        CommandError::PermissionDenied {
            permission: "cmd.use".to_string()
        }
    );
    assert!(spec.complete(&guest, "").is_empty());
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn literal_matches_ignoring_case() {
    let element = || seq(vec![literal("action", "set", &["set", "value"]), string("x")]);
    let context = parse(element(), "SET Value q");
    assert_eq!(context.one_as::<String>("action").as_deref(), Some("set"));

    let error = parse_error(element(), "set foo q");
    assert_eq!(
        error.message(),
        "Argument foo did not match expected next argument value"
    );
    assert_eq!(element().usage(&Console), "set value <x>");
}

#[test]
fn choices_respect_case_sensitivity() {
    let context = parse(choices("mode", game_modes()), "creative");
    assert_eq!(context.one_as::<i32>("mode"), Some(1));

    let error = parse_error(choices("mode", game_modes()), "CREATIVE");
    assert_eq!(
        error.message(),
        "Argument was not a valid choice. Valid choices: survival, creative"
    );

    let context = parse(choices_insensitive("mode", game_modes()), "CREATIVE");
    assert_eq!(context.one_as::<i32>("mode"), Some(1));
    assert_eq!(
        choices("mode", game_modes()).usage(&Console),
        "<survival|creative>"
    );
}

#[test]
fn enum_values_parse_by_name() {
    let context = parse(enum_value::<Difficulty>("difficulty"), "HARD");
    assert_eq!(
        context.one_any::<Difficulty>("difficulty"),
        Some(&Difficulty::Hard)
    );
    assert_eq!(
        enum_value::<Difficulty>("difficulty").usage(&Console),
        "<peaceful|easy|hard>"
    );
}

#[test]
fn remaining_strings_join_or_keep_raw_text() {
    let input = r#"say "hi  x" world"#;
    let context = parse(
        seq(vec![string("cmd"), remaining_joined_strings("msg")]),
        input,
    );
    assert_eq!(context.one_as::<String>("msg").as_deref(), Some("hi  x world"));

    let context = parse(
        seq(vec![string("cmd"), remaining_raw_joined_strings("msg")]),
        input,
    );
    assert_eq!(
        context.one_as::<String>("msg").as_deref(),
        Some(r#""hi  x" world"#)
    );
}

#[test]
fn booleans_and_wide_numbers() {
    let element = || {
        seq(vec![
            boolean("flag"),
            long_num("big"),
            double_num("ratio"),
        ])
    };
    let context = parse(element(), "yes 9999999999 2.5");
    assert_eq!(context.one_as::<bool>("flag"), Some(true));
    assert_eq!(context.one_as::<i64>("big"), Some(9_999_999_999));
    assert_eq!(context.one_as::<f64>("ratio"), Some(2.5));

    let context = parse(element(), "0 -1 1e3");
    assert_eq!(context.one_as::<bool>("flag"), Some(false));
    assert_eq!(context.one_as::<i64>("big"), Some(-1));
}

#[test]
fn space_split_tokenizer_keeps_quotes() {
    let spec = CommandSpec::new(all_of(string("w"))).with_tokenizer(Tokenizer::SpaceSplit);
    let context = spec.parse(&Console, r#""a b""#).unwrap();
    assert_eq!(context.all_as::<String>("w"), [r#""a"#, r#"b""#]);
}

#[test]
fn unterminated_quote_carries_usage() {
    let error = parse_error(string("x"), "\"open");
    assert_eq!(error.message(), "Unterminated quoted string");
    assert_eq!(error.usage(), Some("<x>"));
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn completion_walks_the_sequence() {
    let spec = CommandSpec::new(seq(vec![
        literal("action", "set", &["set"]),
        choices("mode", game_modes()),
    ]));
    assert_eq!(spec.complete(&Console, "se"), ["set"]);
    assert_eq!(spec.complete(&Console, "set "), ["survival", "creative"]);
    assert_eq!(spec.complete(&Console, "set cr"), ["creative"]);
    assert!(spec.complete(&Console, "set creative ").is_empty());
}

#[test]
fn completion_agrees_across_tokenizers() {
    let element = || {
        seq(vec![
            choices("mode", game_modes()),
            string("name"),
            boolean("confirm"),
        ])
    };
    for tokenizer in [Tokenizer::SpaceSplit, Tokenizer::QuotedStrings] {
        let spec = CommandSpec::new(element()).with_tokenizer(tokenizer);
        assert!(
            spec.complete(&Console, "creative ").is_empty(),
            "{tokenizer:?} completed past the name"
        );
        assert_eq!(spec.complete(&Console, "creative steve "), ["true", "false"]);
    }
}

#[test]
fn completion_unions_alternatives() {
    let spec = CommandSpec::new(first_parsing(vec![
        literal("action", "info", &["info"]),
        literal("action", "inherit", &["inherit"]),
        boolean("b"),
    ]));
    assert_eq!(spec.complete(&Console, "in"), ["info", "inherit"]);
    assert_eq!(spec.complete(&Console, "t"), ["true"]);
}

#[test]
fn completion_skips_optional_elements_that_do_not_match() {
    let spec = CommandSpec::new(seq(vec![
        optional_weak(integer("page")),
        choices("mode", game_modes()),
    ]));
    assert_eq!(spec.complete(&Console, "s"), ["survival"]);
}
