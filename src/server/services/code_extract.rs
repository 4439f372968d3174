use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PYTHON_FENCE_RE: Regex = Regex::new(r"(?s)```python\n(.*?)\n```").unwrap();
    static ref PLAIN_FENCE_RE: Regex = Regex::new(r"(?s)```\n(.*?)\n```").unwrap();
    static ref BARE_MATH_RES: [Regex; 3] = [
        Regex::new(r"(\d+\s*[+\-*/]\s*\d+)").unwrap(),
        Regex::new(r"(\d+\s*\*\*\s*\d+)").unwrap(),
        Regex::new(r"(\d+\s*%\s*\d+)").unwrap(),
    ];
}

const STATEMENT_PREFIXES: [&str; 12] = [
    "print(", "import ", "from ", "def ", "class ", "if ", "for ", "while ", "#", "result =",
    "answer =", "calc =",
];

type LineRule = fn(&str) -> bool;

fn starts_with_statement(line: &str) -> bool {
    STATEMENT_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

fn contains_print_call(line: &str) -> bool {
    line.contains("print(")
}

// Over-broad on purpose: any non-comment line with " = " counts, including
// natural-language sentences.
fn has_assignment(line: &str) -> bool {
    line.contains(" = ") && !line.starts_with('#')
}

fn has_power_operator(line: &str) -> bool {
    line.contains("**")
}

fn ends_as_call(line: &str) -> bool {
    line.ends_with(')') && line.contains('(')
}

// Ordered; the first matching rule keeps the line. Prose sentences carrying
// a spaced arithmetic expression ("The answer is 7 + 5") are not kept here;
// they fall through to the bare-arithmetic patterns below, which produce the
// executable form.
const LINE_RULES: [LineRule; 5] = [
    starts_with_statement,
    contains_print_call,
    has_assignment,
    has_power_operator,
    ends_as_call,
];

fn looks_like_code(line: &str) -> bool {
    LINE_RULES.iter().any(|rule| rule(line))
}

/// Pulls an executable snippet out of free-form model output.
///
/// Policies are tried in strict priority order: a ```python fence, an
/// untagged fence, the line-by-line heuristic, and finally a bare-arithmetic
/// pattern that synthesizes a print statement. Returns an empty string when
/// nothing matches.
pub fn extract_code(text: &str) -> String {
    if let Some(captures) = PYTHON_FENCE_RE.captures(text) {
        return captures[1].trim().to_string();
    }

    if let Some(captures) = PLAIN_FENCE_RE.captures(text) {
        return captures[1].trim().to_string();
    }

    let code_lines: Vec<&str> = text
        .lines()
        .filter(|line| {
            let stripped = line.trim();
            !stripped.is_empty() && !stripped.starts_with("---") && looks_like_code(stripped)
        })
        .collect();

    if !code_lines.is_empty() {
        return code_lines.join("\n").trim().to_string();
    }

    for pattern in BARE_MATH_RES.iter() {
        if let Some(captures) = pattern.captures(text) {
            return format!("result = {}\nprint(result)", &captures[1]);
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_fence_round_trips() {
        assert_eq!(extract_code("```python\nprint(1+1)\n```"), "print(1+1)");
    }

    #[test]
    fn python_fence_beats_untagged_fence() {
        let text = "```\nnot this\n```\nand\n```python\nprint(2)\n```";
        assert_eq!(extract_code(text), "print(2)");
    }

    #[test]
    fn untagged_fence_is_second_choice() {
        let text = "Here you go:\n```\nresult = 3 * 3\nprint(result)\n```";
        assert_eq!(extract_code(text), "result = 3 * 3\nprint(result)");
    }

    #[test]
    fn fence_interior_is_trimmed() {
        assert_eq!(extract_code("```python\n  print(5)  \n```"), "print(5)");
    }

    #[test]
    fn line_heuristic_keeps_statement_lines() {
        let text = "Sure, here is the calculation:\nx = 5\ny = 10\nprint(x + y)";
        assert_eq!(extract_code(text), "x = 5\ny = 10\nprint(x + y)");
    }

    #[test]
    fn line_heuristic_skips_separators() {
        let text = "---\nresult = 2 ** 8\nprint(result)\n---";
        assert_eq!(extract_code(text), "result = 2 ** 8\nprint(result)");
    }

    #[test]
    fn assignment_rule_is_deliberately_broad() {
        assert_eq!(extract_code("the total = what you asked"), "the total = what you asked");
    }

    #[test]
    fn comment_lines_do_not_trip_the_assignment_rule() {
        assert_eq!(extract_code("# nothing = here at all"), "# nothing = here at all");
    }

    #[test]
    fn bare_arithmetic_synthesizes_a_snippet() {
        assert_eq!(extract_code("The answer is 7 + 5"), "result = 7 + 5\nprint(result)");
    }

    #[test]
    fn modulo_fallback_matches() {
        assert_eq!(extract_code("try 10%3 maybe"), "result = 10%3\nprint(result)");
    }

    #[test]
    fn plain_text_yields_empty_string() {
        assert_eq!(extract_code("Hello, how are you?"), "");
    }
}
