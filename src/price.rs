//! Ticket price parsing.
//!
//! Two source layouts exist: a free-text block where section headers are
//! followed by "<days> : <value>" lines, and a two column table whose first
//! cell reads "<label><projection> - <days>".

use chrono::Weekday;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::Price;
use crate::normalize::price_weight;
use crate::text::{break_by_token, lines, parse_day};

/// A day token from a price table. Holidays and previews are listed next to
/// weekdays on the source pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Day {
    Weekday(Weekday),
    Holiday,
    Preview,
}

struct Section {
    header: &'static str,
    label: &'static str,
    attributes: &'static [&'static str],
}

const SECTIONS: &[Section] = &[
    Section {
        header: "Valores para projeção 2D",
        label: "Projeção 2D",
        attributes: &["2D"],
    },
    Section {
        header: "Valores para projeção 3D",
        label: "Projeção 3D",
        attributes: &["3D"],
    },
    Section {
        header: "Sala MAGIC D (Sessões em 2D e 3D - Poltrona VIP)",
        label: "Magic D - Projeção 2D/3D - Poltrona VIP",
        attributes: &["2D", "3D", "Magic D", "Poltrona VIP"],
    },
    Section {
        header: "Sala MAGIC D (Sessões em 2D - Poltrona Tradicional)",
        label: "Magic D - Projeção 2D - Poltrona Tradicional",
        attributes: &["2D", "Magic D", "Poltrona Tradicional"],
    },
    Section {
        header: "Sala MAGIC D (Sessões em 3D - Poltrona Tradicional)",
        label: "Magic D - Projeção 3D - Poltrona Tradicional",
        attributes: &["3D", "Magic D", "Poltrona Tradicional"],
    },
];

/// Parses the free-text price page. Lines outside a known section, or that
/// fail to parse, are logged and skipped.
pub fn parse_label_block(text: &str) -> Result<Vec<Price>> {
    if text.trim().is_empty() {
        return Err(Error::structure("empty price page"));
    }

    let mut section: Option<&Section> = None;
    let mut prices = Vec::new();

    for line in lines(text) {
        if line == "TABELA DE PREÇOS" {
            continue;
        }
        if let Some(found) = SECTIONS.iter().find(|s| line.contains(s.header)) {
            section = Some(found);
            continue;
        }

        let Some(current) = section else {
            debug!(line, "price line before any section header");
            continue;
        };

        match parse_price_line(line) {
            Ok(mut price) => {
                price.label = current.label.to_string();
                price.attributes = current.attributes.iter().map(|a| a.to_string()).collect();
                price.weight = price_weight(&price.attributes);
                prices.push(price);
            }
            Err(e) => warn!(line, error = %e, "skipping price line"),
        }
    }

    Ok(prices)
}

/// Parses "<weekday-list>[ (exceto <list>)] : <value>".
pub fn parse_price_line(line: &str) -> Result<Price> {
    let (days, value) = break_by_token(line, ':');
    if days.trim().is_empty() || value.trim().is_empty() {
        return Err(Error::structure(format!("price line without ':' separator: {line}")));
    }

    let mut price = Price::default();

    let (included, excluded) = match days.find('(') {
        Some(i) => (&days[..i], Some(days[i + 1..].trim_end().trim_end_matches(')'))),
        None => (days, None),
    };

    let mut previous: Option<Weekday> = None;
    let mut ranged = false;
    for token in included.split_whitespace() {
        let token = clean_token(token);
        if token == "a" && previous.is_some() {
            ranged = true;
            continue;
        }
        if let Some(day) = parse_day(&token) {
            if ranged && let Some(from) = previous {
                let mut d = from.succ();
                while d != day {
                    push_unique(&mut price.weekdays, d);
                    d = d.succ();
                }
            }
            push_unique(&mut price.weekdays, day);
            previous = Some(day);
        } else if is_holiday(&token) {
            price.includes_holidays = true;
        } else if is_preview(&token) {
            price.includes_previews = true;
        }
        ranged = false;
    }

    if let Some(clause) = excluded {
        let mut tokens = clause.split_whitespace().map(clean_token);
        if tokens.next().as_deref() == Some("exceto") {
            for token in tokens {
                if is_holiday(&token) {
                    price.except_holidays = true;
                } else if is_preview(&token) {
                    price.except_previews = true;
                }
            }
        }
    }

    price.full = scan_value(value)?;
    price.half = price.full / 2.0;
    Ok(price)
}

/// Reads digits and commas (as decimal point) until whitespace follows at
/// least one digit.
fn scan_value(text: &str) -> Result<f32> {
    let mut number = String::new();
    let mut seen_digit = false;
    for c in text.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            seen_digit = true;
        } else if c == ',' {
            number.push('.');
        } else if c.is_whitespace() && seen_digit {
            break;
        }
    }

    match number.parse::<f32>() {
        Ok(v) if v > 0.0 => Ok(v),
        _ => Err(Error::value("price", text)),
    }
}

fn clean_token(token: &str) -> String {
    token
        .trim_matches(|c: char| c == ',' || c == '.' || c == ';' || c == '(' || c == ')')
        .to_lowercase()
}

fn is_holiday(token: &str) -> bool {
    token.starts_with("feriado")
}

fn is_preview(token: &str) -> bool {
    token.starts_with("pré-estreia") || token.starts_with("pre-estreia")
}

fn push_unique(days: &mut Vec<Weekday>, day: Weekday) {
    if !days.contains(&day) {
        days.push(day);
    }
}

/// Parses table rows of `[label, value]` cells. The first row is the header.
pub fn parse_price_table(rows: &[Vec<String>]) -> Vec<Price> {
    rows.iter()
        .skip(1)
        .filter_map(|row| match parse_price_row(row) {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(?row, error = %e, "skipping price row");
                None
            }
        })
        .collect()
}

pub fn parse_price_row(cells: &[String]) -> Result<Price> {
    let [label, value, ..] = cells else {
        return Err(Error::structure("price row with less than two cells"));
    };

    let parts: Vec<&str> = label.trim().split(" - ").collect();
    let [head, days] = parts.as_slice() else {
        return Err(Error::value("price days/projection", label.as_str()));
    };

    let chars: Vec<char> = head.chars().collect();
    if chars.len() <= 2 {
        return Err(Error::value("projection", *head));
    }
    let projection: String = chars[chars.len() - 2..].iter().collect();
    if projection != "2D" && projection != "3D" {
        return Err(Error::value("projection", *head));
    }

    let mut price = Price {
        label: format!("Projeção {projection}"),
        attributes: vec![projection],
        ..Price::default()
    };

    for day in parse_table_days(days) {
        match day {
            Day::Weekday(w) => push_unique(&mut price.weekdays, w),
            Day::Holiday => price.includes_holidays = true,
            Day::Preview => price.includes_previews = true,
        }
    }

    let full = value
        .trim_matches(|c: char| c.is_whitespace() || c == 'R' || c == '$')
        .replace(',', ".");
    price.full = full
        .parse::<f32>()
        .map_err(|_| Error::value("price", value.as_str()))?;
    price.half = price.full / 2.0;
    price.weight = price_weight(&price.attributes);
    Ok(price)
}

/// Substring matching over lowercase tokens of three or more characters.
pub fn parse_table_days(text: &str) -> Vec<Day> {
    const TABLE: &[(&[&str], Day)] = &[
        (&["dom"], Day::Weekday(Weekday::Sun)),
        (&["seg"], Day::Weekday(Weekday::Mon)),
        (&["ter"], Day::Weekday(Weekday::Tue)),
        (&["qua"], Day::Weekday(Weekday::Wed)),
        (&["qui"], Day::Weekday(Weekday::Thu)),
        (&["sex"], Day::Weekday(Weekday::Fri)),
        (&["sáb", "sab"], Day::Weekday(Weekday::Sat)),
        (&["fer"], Day::Holiday),
        (&["pré-estreia", "pre-estreia"], Day::Preview),
    ];

    text.split(' ')
        .filter(|t| t.chars().count() >= 3)
        .filter_map(|t| {
            let token = t.to_lowercase();
            let day = TABLE
                .iter()
                .find(|(needles, _)| needles.iter().any(|n| token.contains(n)))
                .map(|(_, day)| *day);
            if day.is_none() {
                debug!(token, "unknown price day");
            }
            day
        })
        .collect()
}
