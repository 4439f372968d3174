use lazy_static::lazy_static;
use regex::Regex;

const MATH_KEYWORDS: [&str; 17] = [
    "calculate",
    "squared",
    "square",
    "root",
    "solve",
    "what is",
    "what's",
    "how much",
    "percentage",
    "percent",
    "times",
    "multiply",
    "divide",
    "addition",
    "subtract",
    "plus",
    "minus",
];

// "x" matches any word containing the letter; kept as observed behavior.
const MATH_OPERATORS: [&str; 10] = ["+", "-", "*", "/", "=", "^", "**", "x", " x ", "×"];

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"\b\d+\b").unwrap();
}

/// Signals extracted from a user message by the math heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathIntent {
    pub has_keywords: bool,
    pub has_operators: bool,
    pub has_numbers: bool,
}

impl MathIntent {
    pub fn is_math_question(&self) -> bool {
        (self.has_numbers && self.has_operators) || (self.has_keywords && self.has_numbers)
    }
}

/// Best-effort detection of math/calculation questions. False positives and
/// negatives are expected; the prompt downstream tolerates both.
pub fn classify(message: &str) -> MathIntent {
    let lowered = message.to_lowercase();

    MathIntent {
        has_keywords: MATH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)),
        has_operators: MATH_OPERATORS.iter().any(|op| lowered.contains(op)),
        has_numbers: NUMBER_RE.is_match(message),
    }
}

/// Builds the single user-turn prompt for the completion backend.
pub fn build_prompt(message: &str, is_math_question: bool) -> String {
    if is_math_question {
        format!(
            r#"You are an AI assistant that MUST use Python code execution for mathematical calculations.

CRITICAL RULES:
1. For math questions, you MUST write Python code
2. ALWAYS format Python code using ```python code blocks
3. Use print() statements to display results

User question: "{}"

Provide Python code in ```python blocks that calculates and prints the answer."#,
            message
        )
    } else {
        format!(
            r#"You are a helpful AI assistant. Respond naturally to the user's question.

User: {}"#,
            message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_operator_is_math() {
        assert!(classify("what is 2+2").is_math_question());
    }

    #[test]
    fn digits_and_keyword_is_math() {
        assert!(classify("calculate 15 percent of 80").is_math_question());
    }

    #[test]
    fn no_digits_is_never_math() {
        assert!(!classify("calculate something").is_math_question());
        assert!(!classify("how much is a plus sign worth").is_math_question());
    }

    #[test]
    fn unicode_multiplication_sign_counts_as_operator() {
        assert!(classify("6 × 7").is_math_question());
    }

    #[test]
    fn plain_greeting_is_not_math() {
        let intent = classify("Hello, how are you?");
        assert!(!intent.is_math_question());
        assert!(!intent.has_numbers);
    }

    #[test]
    fn math_prompt_demands_fenced_code() {
        let prompt = build_prompt("what is 2+2", true);
        assert!(prompt.contains("```python"));
        assert!(prompt.contains("what is 2+2"));
    }

    #[test]
    fn regular_prompt_passes_message_through() {
        let prompt = build_prompt("tell me a joke", false);
        assert!(!prompt.contains("```python"));
        assert!(prompt.contains("tell me a joke"));
    }
}
