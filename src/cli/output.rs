//! Console messages for the `secrets` commands.
//!
//! Status lines go to stdout so they sit next to the setup banner;
//! warnings and errors go to stderr.  Nothing here ever prints key bytes
//! unless the caller passes them in explicitly.

use console::{style, StyledObject};

fn status(mark: StyledObject<&str>, msg: &str) -> String {
    format!("{mark} {msg}")
}

pub fn success(msg: &str) {
    println!("{}", status(style("\u{2713}").green().bold(), msg));
}

/// Printed by `main` for any error that ends the command.
pub fn error(msg: &str) {
    eprintln!("{}", status(style("\u{2717}").red().bold(), msg));
}

pub fn warning(msg: &str) {
    eprintln!("{}", status(style("!").yellow().bold(), msg));
}

pub fn info(msg: &str) {
    println!("{}", status(style("\u{2139}").blue().bold(), msg));
}

/// Dimmed follow-up hint, e.g. which command to run next.
pub fn tip(msg: &str) {
    println!("{}", status(style("\u{2192}").dim(), &style(msg).dim().to_string()));
}

/// Generator-style line naming a file setup touched: `      create  secrets.yml.key`.
pub fn action(verb: &str, target: &str) {
    println!("      {}  {target}", style(verb).green().bold());
}
