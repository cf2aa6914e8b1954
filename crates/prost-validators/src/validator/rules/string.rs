use prost_reflect::Value;
use regex::{Regex, RegexBuilder};

use crate::error::{CompilationError, Error, ValidationError};
use crate::schema::constraint::PatternRule;
use crate::template::MessageTemplate;
use crate::violation::Violation;

use super::display_value;

const DEFAULT_MESSAGE: &str = "{field} must match pattern {pattern}";

/// Regular-expression rule for string values. The empty string is exempt:
/// whether a value must be present is left to `required`.
pub(crate) struct PatternRuleEval {
    field: String,
    source: String,
    regex: Regex,
    message: Option<String>,
}

impl PatternRuleEval {
    pub fn new(field: &str, rule: &PatternRule) -> Result<Self, CompilationError> {
        if rule.regex.is_empty() {
            return Err(CompilationError {
                cause: format!("field {field}: empty regex pattern"),
            });
        }
        Ok(Self {
            field: field.to_string(),
            source: rule.regex.clone(),
            regex: compile(&rule.regex, &rule.flags)?,
            message: rule.message.clone(),
        })
    }

    pub fn evaluate(&self, val: &Value) -> Result<(), Error> {
        let Some(text) = val.as_str() else {
            return Ok(());
        };
        if text.is_empty() || self.regex.is_match(text) {
            return Ok(());
        }
        let template = MessageTemplate::new(self.message.as_deref().unwrap_or(DEFAULT_MESSAGE))
            .with_param("field", &self.field)
            .with_param("pattern", &self.source)
            .with_param("value", display_value(val));
        Err(ValidationError::single(Violation::new("pattern", template)).into())
    }
}

/// Compile `source` with modifier letters `i`, `m`, `s`, `u` and `x`.
pub(crate) fn compile(source: &str, flags: &str) -> Result<Regex, CompilationError> {
    let mut builder = RegexBuilder::new(source);
    builder.unicode(true);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'u' => builder.unicode(true),
            'x' => builder.ignore_whitespace(true),
            other => {
                return Err(CompilationError {
                    cause: format!("unknown pattern modifier `{other}` in `{flags}`"),
                });
            }
        };
    }
    builder.build().map_err(|e| CompilationError {
        cause: format!("invalid regex pattern `{source}`: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use prost_reflect::Value;
    use pretty_assertions::assert_eq;

    use super::{PatternRuleEval, compile};
    use crate::error::Error;
    use crate::schema::constraint::PatternRule;

    fn eval(regex: &str, flags: &str) -> PatternRuleEval {
        PatternRuleEval::new("code", &PatternRule::new(regex).with_flags(flags))
            .expect("pattern compiles")
    }

    fn passes(eval: &PatternRuleEval, text: &str) -> bool {
        eval.evaluate(&Value::String(text.to_string())).is_ok()
    }

    #[test]
    fn case_insensitive_modifier_ignores_letter_case() {
        let strict = eval("^[a-z]+$", "");
        assert!(passes(&strict, "abc"));
        assert!(!passes(&strict, "ABC"));

        let folded = eval("^[a-z]+$", "i");
        assert!(passes(&folded, "abc"));
        assert!(passes(&folded, "ABC"));
        assert!(passes(&folded, "aBc"));
    }

    #[test]
    fn matching_is_an_unanchored_search() {
        let digits = eval("[0-9]+", "");
        assert!(passes(&digits, "abc123"));
        assert!(!passes(&digits, "abc"));
    }

    #[test]
    fn multi_line_and_dot_all_modifiers() {
        assert!(!passes(&eval("^b$", ""), "a\nb"));
        assert!(passes(&eval("^b$", "m"), "a\nb"));
        assert!(!passes(&eval("^a.b$", ""), "a\nb"));
        assert!(passes(&eval("^a.b$", "s"), "a\nb"));
        assert!(passes(&eval("^a b c$", "x"), "abc"));
    }

    #[test]
    fn empty_regex_is_rejected() {
        let err = PatternRuleEval::new("code", &PatternRule::new(""))
            .err()
            .expect("an empty regex would match everything");
        assert!(err.cause.contains("empty regex"), "{}", err.cause);
    }

    #[test]
    fn empty_strings_are_exempt() {
        assert!(passes(&eval("^[a-z]+$", ""), ""));
    }

    #[test]
    fn violation_carries_pattern_and_value() {
        let err = eval("^[a-z]+$", "")
            .evaluate(&Value::String("A1".into()))
            .expect_err("mismatch");
        let Error::Validation(err) = err else {
            panic!("expected validation error");
        };
        let violation = &err.violations[0];
        assert_eq!(violation.rule_id(), "pattern");
        assert_eq!(violation.template().param("value"), Some("A1"));
        assert_eq!(violation.message(), "code must match pattern ^[a-z]+$");
    }

    #[test]
    fn custom_message_replaces_the_default() {
        let eval = PatternRuleEval::new(
            "code",
            &PatternRule::new("^x").with_message("{field} looks wrong: {value}"),
        )
        .expect("pattern compiles");
        let Err(Error::Validation(err)) = eval.evaluate(&Value::String("y".into())) else {
            panic!("expected validation error");
        };
        assert_eq!(err.violations[0].message(), "code looks wrong: y");
    }

    #[test]
    fn bad_sources_and_modifiers_fail_to_compile() {
        let err = compile("(unclosed", "").expect_err("bad regex");
        assert!(err.cause.contains("invalid regex pattern"), "{}", err.cause);
        let err = compile("a", "q").expect_err("bad modifier");
        assert!(err.cause.contains("unknown pattern modifier `q`"), "{}", err.cause);
    }
}
