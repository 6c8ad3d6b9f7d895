//! Topic and condition validation
//!
//! FCM rejects conditions that reference malformed topic names, but only
//! after a round trip. These checks run locally so that an invalid topic or
//! condition never reaches the network.
//!
//! A condition is a boolean expression over quoted topic names:
//!
//! ```text
//! 'TopicA' in topics && ('TopicB' in topics || 'TopicC' in topics)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters allowed in a topic name
const TOPIC_NAME_CLASS: &str = r"[a-zA-Z0-9\-_.~%]+";

static TOPIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(TOPIC_NAME_CLASS).expect("topic name pattern is valid"));

/// Every token a well-formed condition is made of.
static CONDITION_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"topics|in|\s|\(|\)|&&|!|\|\||'{}'",
        TOPIC_NAME_CLASS
    ))
    .expect("condition token pattern is valid")
});

/// Any single-quoted substring, including empty and malformed ones.
static QUOTED_TOPIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\S|\s)'([^']*?)'(?:$|\S|\s)").expect("quoted topic pattern is valid")
});

/// Returns true if `condition` may be sent as a topic condition.
///
/// Both the token check and the per-topic check must pass.
pub fn validate_condition(condition: &str) -> bool {
    validate_condition_format(condition) && validate_condition_topics(condition)
}

/// Nothing but operators, parentheses, whitespace, `in topics` and quoted
/// topic names may appear.
pub fn validate_condition_format(condition: &str) -> bool {
    CONDITION_TOKENS.replace_all(condition, "").is_empty()
}

/// Every quoted name must consist only of topic-name characters.
pub fn validate_condition_topics(condition: &str) -> bool {
    QUOTED_TOPIC
        .captures_iter(condition)
        .filter_map(|caps| caps.get(1))
        .all(|topic| is_fully_topic_chars(topic.as_str()))
}

/// Validates a bare topic name as used by `send_to_topic`.
pub fn valid_topic_name(topic: &str) -> bool {
    !topic.is_empty() && is_fully_topic_chars(topic)
}

fn is_fully_topic_chars(value: &str) -> bool {
    TOPIC_NAME.replace_all(value, "").is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONDITION: &str =
        "'TopicA' in topics && ('TopicB' in topics || 'TopicC' in topics)";

    #[test]
    fn test_valid_condition() {
        assert!(validate_condition(VALID_CONDITION));
        assert!(validate_condition("'TopicA' in topics"));
        assert!(validate_condition("!('news' in topics)"));
        assert!(validate_condition("'a-b_c.d~e%f' in topics"));
    }

    #[test]
    fn test_invalid_topic_character() {
        assert!(!validate_condition("'TopicA$' in topics"));
        assert!(!validate_condition_topics("'TopicA$' in topics"));
    }

    #[test]
    fn test_stray_text_is_rejected() {
        assert!(!validate_condition("'TopicA' in topics and 'TopicB' in topics"));
        assert!(!validate_condition("'TopicA' in topics; drop"));
        assert!(!validate_condition_format("TopicA in topics"));
    }

    #[test]
    fn test_malformed_quoting() {
        assert!(!validate_condition("'TopicA in topics"));
        assert!(!validate_condition("'' in topics"));
        assert!(!validate_condition("'Topic A' in topics"));
    }

    #[test]
    fn test_checks_are_deterministic() {
        for _ in 0..3 {
            assert!(validate_condition(VALID_CONDITION));
            assert!(!validate_condition("'TopicA$' in topics"));
        }
    }

    #[test]
    fn test_topic_names() {
        assert!(valid_topic_name("TopicA"));
        assert!(valid_topic_name("news-2024_eu.sports~%20"));
        assert!(!valid_topic_name("TopicA$"));
        assert!(!valid_topic_name("Topic A"));
        assert!(!valid_topic_name("/topics/TopicA"));
        assert!(!valid_topic_name(""));
    }
}
