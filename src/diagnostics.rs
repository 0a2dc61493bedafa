//! Diagnostic rendering for resolution failures.
//!
//! Converts structured `Error` variants into a human-readable message plus
//! fix-it solutions, and renders them as markdown with bold headings for
//! terminal display. Replacement ranges are relative to the body of the
//! original link, so callers can translate them into source coordinates.

use std::fmt::Write as _;
use std::ops::Range;

use crate::error::{Candidate, Error};
use crate::parser::PathComponent;

/// ANSI escape code for bold text.
const BOLD: &str = "\x1b[1m";
/// ANSI escape code to reset text formatting.
const RESET: &str = "\x1b[0m";

/// Suggestions farther than this edit distance are dropped.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// One text replacement within the original link body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: Range<usize>,
    pub text: String,
}

/// A proposed fix: a summary plus the replacements that apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub summary: String,
    pub replacements: Vec<Replacement>,
}

/// A formatted resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub solutions: Vec<Solution>,
}

/// Format an error into a message and fix-it solutions.
pub fn error_info(e: &Error, link: &str) -> ErrorInfo {
    return match e {
        Error::NotFound { remaining, available_roots, .. } => {
            suggestion_info(e, remaining, available_roots)
        },
        Error::UnknownName { remaining, siblings, .. } => suggestion_info(e, remaining, siblings),
        Error::UnknownDisambiguation { remaining, candidates, .. }
        | Error::LookupCollision { remaining, candidates, .. } => {
            candidate_info(e, remaining, candidates)
        },
        Error::NonSymbolMatchForSymbolLink { .. } => doc_link_rewrite_info(e, link),
        _ => ErrorInfo {
            message: e.to_string(),
            solutions: Vec::new(),
        },
    };
}

/// Suggest nearest-name matches for a missing component.
fn suggestion_info(e: &Error, remaining: &[PathComponent], available: &[String]) -> ErrorInfo {
    let mut solutions = Vec::new();
    if let Some(component) = remaining.first() {
        for suggestion in nearest_names(&component.name, available) {
            solutions.push(Solution {
                summary: format!("replace `{}` with `{suggestion}`", component.full),
                replacements: vec![Replacement {
                    range: component.range.clone(),
                    text: suggestion,
                }],
            });
        }
    }
    return ErrorInfo {
        message: e.to_string(),
        solutions,
    };
}

/// List every candidate with the disambiguation that selects it.
fn candidate_info(e: &Error, remaining: &[PathComponent], candidates: &[Candidate]) -> ErrorInfo {
    let mut solutions = Vec::new();
    if let Some(component) = remaining.first() {
        for candidate in candidates {
            let replacement = format!("{}{}", candidate.name, candidate.suffix);
            let summary = match &candidate.declaration {
                Some(declaration) => {
                    format!("insert `{}` for `{declaration}`", candidate.suffix)
                },
                None => format!("replace `{}` with `{replacement}`", component.full),
            };
            solutions.push(Solution {
                summary,
                replacements: vec![Replacement {
                    range: component.range.clone(),
                    text: replacement,
                }],
            });
        }
    }
    return ErrorInfo {
        message: e.to_string(),
        solutions,
    };
}

/// Propose rewriting a doubled-backtick symbol link as a `<doc:>` link.
/// The two replacements sit at the link boundaries.
fn doc_link_rewrite_info(e: &Error, link: &str) -> ErrorInfo {
    return ErrorInfo {
        message: e.to_string(),
        solutions: vec![Solution {
            summary: "use a <doc:> style link for a non-symbol destination".to_string(),
            replacements: vec![
                Replacement {
                    range: 0..0,
                    text: "<doc:".to_string(),
                },
                Replacement {
                    range: link.len()..link.len(),
                    text: ">".to_string(),
                },
            ],
        }],
    };
}

/// Nearest names by edit distance, cutoff 3, ties broken alphabetically.
fn nearest_names(name: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = available
        .iter()
        .map(|candidate| return (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| return *distance <= MAX_SUGGESTION_DISTANCE)
        .collect();
    scored.sort();
    return scored.into_iter().map(|(_, candidate)| candidate.clone()).collect();
}

// ── Terminal rendering ─────────────────────────────────────────────────

/// Render a formatted error as valid markdown with bold headings and print
/// to stderr.
pub fn print_error_info(info: &ErrorInfo) {
    let md = render_error_info(info);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render a formatted error as a structured markdown diagnostic.
pub fn render_error_info(info: &ErrorInfo) -> String {
    let mut out = format!("\
# Error: Unresolved Link

{}
", info.message);

    if !info.solutions.is_empty() {
        out.push_str("\n## Fix\n\n");
        for solution in &info.solutions {
            let _ = writeln!(out, "- {}", solution.summary);
        }
    }
    return out;
}

/// Render a non-resolution error (I/O, malformed input) for the CLI.
pub fn print_error(e: &Error) {
    let info = ErrorInfo {
        message: e.to_string(),
        solutions: Vec::new(),
    };
    print_error_info(&info);
    return;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_names_respects_cutoff_and_order() {
        let available = vec![
            "Color".to_string(),
            "Colour".to_string(),
            "Shape".to_string(),
        ];
        let suggestions = nearest_names("Colr", &available);
        assert_eq!(suggestions, vec!["Color".to_string(), "Colour".to_string()]);
    }

    #[test]
    fn collision_solutions_carry_the_component_range() {
        let e = Error::LookupCollision {
            link: "/M/Foo/bar()".to_string(),
            partial: vec!["M".to_string()],
            remaining: vec![PathComponent::plain("Foo", 3..6)],
            candidates: vec![
                Candidate {
                    name: "Foo".to_string(),
                    suffix: "-struct".to_string(),
                    declaration: Some("struct Foo".to_string()),
                },
                Candidate {
                    name: "Foo".to_string(),
                    suffix: "-class".to_string(),
                    declaration: Some("class Foo".to_string()),
                },
            ],
        };
        let info = error_info(&e, "/M/Foo/bar()");
        assert_eq!(info.solutions.len(), 2);
        assert_eq!(info.solutions[0].replacements[0].range, 3..6);
        assert_eq!(info.solutions[0].replacements[0].text, "Foo-struct");
    }

    #[test]
    fn non_symbol_match_proposes_doc_link() {
        let e = Error::NonSymbolMatchForSymbolLink {
            link: "GettingStarted".to_string(),
            name: "GettingStarted".to_string(),
        };
        let info = error_info(&e, "GettingStarted");
        let replacements = &info.solutions[0].replacements;
        assert_eq!(replacements[0].range, 0..0);
        assert_eq!(replacements[0].text, "<doc:");
        assert_eq!(replacements[1].range, 14..14);
        assert_eq!(replacements[1].text, ">");
    }
}
