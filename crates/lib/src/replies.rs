//! Reply texts and the final answer batch.

use crate::answers::Selection;
use crate::channels::ReplyMessage;
use crate::normalize::Triggers;
use crate::router::ConversationContext;

pub const ACKNOWLEDGMENT: &str = "Gotcha! Please wait a moment, looking for the answer...";

pub const REINTERPRET_HINT: &str =
    "If our interpretation of your input is wrong, kindly rewrite it manually";

pub const CAROUSEL_ALT_TEXT: &str = "EZSolver found some answers for you";

pub const UNSUPPORTED_TYPE: &str =
    "Sorry, I can only read text and images. Send me an equation or a photo of one!";

const EXAMPLE_QUERIES: [&str; 3] = ["x^2+x-1=0", "integrate sin(x) dx", "derivative of x^3"];

fn example_lines(context: ConversationContext, triggers: &Triggers) -> String {
    EXAMPLE_QUERIES
        .iter()
        .map(|q| match context {
            ConversationContext::Group => format!("- {} {}", triggers.short(), q),
            ConversationContext::Direct => format!("- {}", q),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Greeting after the bot is added as a friend (or followed from a group).
pub fn welcome(context: ConversationContext, triggers: &Triggers) -> String {
    match context {
        ConversationContext::Direct => format!(
            "Hi! I'm EZSolver. Send me a math question or a photo of an equation and I'll solve it.\nTry:\n{}\nSend \"help\" any time for instructions.",
            example_lines(context, triggers)
        ),
        ConversationContext::Group => format!(
            "Hi everyone! I'm EZSolver. Start a message with \"{}\" or \"{}\" and I'll solve it.\nTry:\n{}",
            triggers.short(),
            triggers.long(),
            example_lines(context, triggers)
        ),
    }
}

/// Message after the bot joins a group or room.
pub fn join_invitation(triggers: &Triggers) -> String {
    format!(
        "Thanks for inviting EZSolver! I stay quiet unless you call me: start your message with \"{}\" or \"{}\", e.g. \"{} {}\". Type \"{} help\" for more.",
        triggers.short(),
        triggers.long(),
        triggers.short(),
        EXAMPLE_QUERIES[0],
        triggers.short()
    )
}

/// Usage instructions for the help command.
pub fn help(context: ConversationContext, triggers: &Triggers) -> String {
    match context {
        ConversationContext::Direct => format!(
            "How to use EZSolver:\n1. Type an equation or question, for example:\n{}\n2. Or send a photo of a printed equation.\nI reply with up to 5 answer cards.",
            example_lines(context, triggers)
        ),
        ConversationContext::Group => format!(
            "How to use EZSolver in a group:\nStart your message with \"{}\" or \"{}\", for example:\n{}\nMessages without the trigger word are ignored.",
            triggers.short(),
            triggers.long(),
            example_lines(context, triggers)
        ),
    }
}

/// Fallback when the engine could not interpret the query.
pub fn no_result(context: ConversationContext, triggers: &Triggers) -> String {
    format!(
        "Sorry, I couldn't find an answer for that. Try asking like this:\n{}",
        example_lines(context, triggers)
    )
}

/// Final answer messages: a carousel plus the rephrase hint, or the example-query fallback.
pub fn answer_messages(
    selection: Selection,
    context: ConversationContext,
    triggers: &Triggers,
) -> Vec<ReplyMessage> {
    if !selection.had_any_result {
        return vec![ReplyMessage::text(no_result(context, triggers))];
    }
    vec![
        ReplyMessage::carousel(selection.cards, CAROUSEL_ALT_TEXT),
        ReplyMessage::text(REINTERPRET_HINT),
    ]
}
