//! Canned content of the legal console: static commands, pattern rules,
//! quick commands and the welcome banner.

use crate::commands::{CommandBook, CommandEntry, CommandResult, PatternRule};
use crate::overlay::EasterEgg;
use anyhow::Result;
use regex::Captures;
use serde::Serialize;

pub const PROMPT: &str = "gość@kancelaria:~$";
pub const DEMO_COMMAND: &str = "ISAP.find('ochrona danych osobowych')";
pub const UNKNOWN_HINT: &str = "Wpisz 'help', aby zobaczyć dostępne polecenia.";

const SEARCH_PATTERN: &str = r#"(?i)^isap\.find\(\s*(?:"([^"]+)"|'([^']+)')\s*\)\s*;?$"#;
const ASK_PATTERN: &str = r#"(?i)^ai\.ask\(\s*["'](.+)["']\s*\)\s*;?$"#;
const ARTICLE_PATTERN: &str = r#"(?i)^art\.get\(\s*(\d+)\s*,\s*["'](.+)["']\s*\)\s*;?$"#;
const EASTER_EGG_PATTERN: &str =
    r#"(?i)^cats\.show\(\s*["']?(pimpek|mruczek|wszystkie)["']?\s*\)\s*;?$"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuickCommand {
    pub id: &'static str,
    pub label: &'static str,
    pub command: &'static str,
}

pub const QUICK_COMMANDS: &[QuickCommand] = &[
    QuickCommand {
        id: "help",
        label: "Pomoc",
        command: "help",
    },
    QuickCommand {
        id: "search-rodo",
        label: "Szukaj: RODO",
        command: "ISAP.find('RODO')",
    },
    QuickCommand {
        id: "ask-privacy",
        label: "Zapytaj asystenta",
        command: "AI.ask('Czy mój sklep potrzebuje polityki prywatności zgodnej z RODO?')",
    },
    QuickCommand {
        id: "article-kc",
        label: "Art. 58 KC",
        command: "art.get(58, 'Kodeks cywilny')",
    },
];

pub fn quick_command(id: &str) -> Option<&'static QuickCommand> {
    QUICK_COMMANDS.iter().find(|quick| quick.id == id)
}

/// Usage examples for the pattern commands, as shown by `help` and `/info`.
pub const PATTERN_EXAMPLES: &[&str] = &[
    "ISAP.find('fraza')",
    "AI.ask('pytanie')",
    "art.get(numer, 'tytuł aktu')",
];

pub fn welcome_lines() -> Vec<String> {
    lines(&[
        "👋 Cześć!",
        "Szukasz czegoś w kodzie? Napisz do mnie!",
        "Konsola prawnicza w trybie demonstracyjnym. Wpisz 'help', aby zacząć.",
    ])
}

pub fn standard_book() -> Result<CommandBook> {
    Ok(CommandBook::new()
        .with_static("help", CommandEntry::System(help_lines()))
        .with_static(
            "whoami",
            CommandEntry::System(lines(&[
                "Radca prawny i programista.",
                "Łączę prawo nowych technologii z inżynierią oprogramowania.",
                "Specjalizacje: ochrona danych osobowych, umowy IT, regulacje AI.",
            ])),
        )
        .with_static(
            "kontakt",
            CommandEntry::System(lines(&[
                "E-mail: kontakt@kancelaria.dev",
                "LinkedIn: /in/kancelaria-dev",
                "Odpowiadam zwykle w ciągu jednego dnia roboczego.",
            ])),
        )
        .with_static(
            "uslugi",
            CommandEntry::System(lines(&[
                "  • audyty zgodności z RODO",
                "  • umowy wdrożeniowe i licencyjne IT",
                "  • regulaminy i polityki prywatności",
                "  • wsparcie przy wdrażaniu AI Act",
            ])),
        )
        .with_static("clear", CommandEntry::Clear)
        .with_pattern(PatternRule::new("search", SEARCH_PATTERN, search)?)
        .with_pattern(PatternRule::new("ask", ASK_PATTERN, ask)?)
        .with_pattern(PatternRule::new("article", ARTICLE_PATTERN, article)?)
        .with_pattern(PatternRule::new("easter-egg", EASTER_EGG_PATTERN, easter_egg)?))
}

fn help_lines() -> Vec<String> {
    let mut output = lines(&[
        "Dostępne polecenia:",
        "  help       pokaż tę pomoc",
        "  whoami     kilka słów o mnie",
        "  kontakt    dane kontaktowe",
        "  uslugi     zakres usług",
        "  clear      wyczyść konsolę",
        "",
        "Polecenia z argumentami:",
    ]);
    output.extend(PATTERN_EXAMPLES.iter().map(|example| format!("  {example}")));
    output
}

fn search(captures: &Captures<'_>) -> Option<CommandResult> {
    // Group 1 holds a double-quoted query, group 2 a single-quoted one.
    let query = match capture(captures, 1) {
        "" => capture(captures, 2),
        quoted => quoted,
    };
    Some(CommandResult::result(
        "Przeszukiwanie bazy ISAP...",
        vec![
            format!("Znaleziono akty prawne dla: \"{query}\""),
            "  [1] Ustawa o ochronie danych osobowych".to_string(),
            "  [2] Rozporządzenie (UE) 2016/679 (RODO)".to_string(),
            "  [3] Ustawa o świadczeniu usług drogą elektroniczną".to_string(),
            "Wyniki mają charakter demonstracyjny.".to_string(),
        ],
    ))
}

fn ask(captures: &Captures<'_>) -> Option<CommandResult> {
    let question = capture(captures, 1).to_lowercase();
    let answer = if question.contains("rodo") || question.contains("dane osobowe") {
        lines(&[
            "Jeżeli przetwarzasz dane osobowe klientów, RODO obowiązuje Cię niezależnie od skali.",
            "Potrzebujesz co najmniej klauzuli informacyjnej i rejestru czynności przetwarzania.",
        ])
    } else if question.contains("umow") {
        lines(&[
            "Umowa IT powinna precyzyjnie określać przedmiot, odbiór prac i przejście praw autorskich.",
            "Najwięcej sporów dotyczy kryteriów odbioru, więc warto je opisać mierzalnie.",
        ])
    } else if question.contains("ai act") || question.contains("sztuczn") {
        lines(&[
            "AI Act klasyfikuje systemy według poziomu ryzyka.",
            "Zacznij od inwentaryzacji używanych narzędzi i oceny, czy któreś jest systemem wysokiego ryzyka.",
        ])
    } else {
        lines(&[
            "To dobre pytanie, ale odpowiedź zależy od szczegółów sprawy.",
            "Napisz do mnie przez 'kontakt', a przyjrzymy się temu razem.",
        ])
    };
    let mut response = answer;
    response.push("(Odpowiedź wygenerowana automatycznie, nie stanowi porady prawnej.)".to_string());
    Some(CommandResult::ai("Asystent analizuje pytanie...", response))
}

fn article(captures: &Captures<'_>) -> Option<CommandResult> {
    let number = capture(captures, 1);
    let title = capture(captures, 2);
    let lowered = title.to_lowercase();
    let body = if lowered.contains("kodeks cywilny") || lowered.split_whitespace().any(|word| word == "kc") {
        "Czynność prawna sprzeczna z ustawą albo mająca na celu obejście ustawy jest nieważna."
    } else if lowered.contains("rodo") {
        "Przetwarzanie jest zgodne z prawem wyłącznie w przypadkach, gdy spełniony jest co najmniej jeden z warunków."
    } else {
        "Treść tego artykułu nie jest dostępna w trybie demonstracyjnym."
    };
    Some(CommandResult::result(
        "Pobieranie treści artykułu...",
        vec![
            format!("Art. {number}. {title}"),
            format!("  {body}"),
        ],
    ))
}

fn easter_egg(captures: &Captures<'_>) -> Option<CommandResult> {
    EasterEgg::from_token(capture(captures, 1))
        .map(|egg| CommandResult::easter_egg("Wywoływanie kotów...", egg))
}

fn capture<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures
        .get(index)
        .map(|value| value.as_str().trim())
        .unwrap_or_default()
}

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|line| line.to_string()).collect()
}
