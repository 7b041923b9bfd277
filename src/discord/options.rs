//! Extraction helpers for resolved slash-command options.

use serenity::all::{ResolvedOption, ResolvedValue, User};

/// Finds a string option by name.
pub fn str_option<'a>(options: &'a [ResolvedOption<'_>], name: &str) -> Option<&'a str> {
    options.iter().find_map(|option| match option.value {
        ResolvedValue::String(value) if option.name == name => Some(value),
        _ => None,
    })
}

/// Finds a user option by name.
pub fn user_option<'a>(options: &'a [ResolvedOption<'a>], name: &str) -> Option<&'a User> {
    options.iter().find_map(|option| match option.value {
        ResolvedValue::User(user, _) if option.name == name => Some(user),
        _ => None,
    })
}

/// Returns the invoked subcommand and its nested options.
pub fn subcommand<'a>(
    options: &'a [ResolvedOption<'a>],
) -> Option<(&'a str, &'a [ResolvedOption<'a>])> {
    options.iter().find_map(|option| match &option.value {
        ResolvedValue::SubCommand(nested) => Some((option.name, nested.as_slice())),
        _ => None,
    })
}
