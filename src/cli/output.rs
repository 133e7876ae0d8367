use std::fmt;

use colored::Colorize;

pub fn info(message: impl fmt::Display) {
    println!("{}", message);
}

pub fn success(message: impl fmt::Display) {
    println!("{} {}", "ok:".green().bold(), message);
}

pub fn warning(message: impl fmt::Display) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn error(message: impl fmt::Display) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
