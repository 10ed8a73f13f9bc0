use std::cmp::Ordering;
use std::io::{self, IsTerminal, Read};

use anyhow::Context;
use crossterm::style::{Color, Stylize};

use ratings_terminal::config::{self, RatingsConfig};
use ratings_terminal::names::split_arg_names;
use ratings_terminal::state::{AppState, ResultRow, submit_with};

const HIGH_RATING_COLOR: Color = Color::Rgb {
    r: 0xe2,
    g: 0xb3,
    b: 0x40,
};

// Usage: ratings_lookup [--sort] ["Name One; Name Two" ...]
// With no names on the command line, names are read from stdin, one per line.
fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    let mut sort = false;
    let mut name_args = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--sort" {
            sort = true;
        } else {
            name_args.push(arg);
        }
    }

    let input = if name_args.is_empty() {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed reading names from stdin")?;
        raw
    } else {
        split_arg_names(&name_args).join("\n")
    };

    let cfg = RatingsConfig::from_env();
    for warning in &cfg.warnings {
        eprintln!("[WARN] {warning}");
    }
    let service = config::build_service(&cfg)?;

    let mut state = AppState::new();
    state.input = input;
    submit_with(&mut state, service.as_ref());

    for line in state.logs.iter().filter(|l| !l.starts_with("[INFO]")) {
        eprintln!("{line}");
    }
    if let Some(notice) = &state.notice {
        eprintln!("{notice}");
        std::process::exit(1);
    }

    let mut rows = state.rows.clone();
    if sort {
        rows.sort_by(compare_rating_desc);
    }

    let color = io::stdout().is_terminal();
    let width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    for row in &rows {
        let rating = if row.emphasized && color {
            row.rating.clone().with(HIGH_RATING_COLOR).bold().to_string()
        } else {
            row.rating.clone()
        };
        println!("{:<width$}  {}", row.name, rating);
    }
    println!("{}", state.result_count);

    Ok(())
}

fn compare_rating_desc(a: &ResultRow, b: &ResultRow) -> Ordering {
    match (a.rating_value, b.rating_value) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
