//! Model listing functionality

use crate::core::config::Config;
use crate::core::constants::KNOWN_MODELS;

/// One line per known model; the configured default is starred.
pub fn model_lines(default_model: &str) -> Vec<String> {
    let mut lines: Vec<String> = KNOWN_MODELS
        .iter()
        .map(|model| {
            let marker = if *model == default_model { "*" } else { " " };
            format!("{marker} {model}")
        })
        .collect();
    if !KNOWN_MODELS.contains(&default_model) {
        lines.push(format!("* {default_model} (custom)"));
    }
    lines
}

pub fn list_models(config: &Config) {
    let default_model = config.generation_settings().model;
    println!("Known models:");
    for line in model_lines(&default_model) {
        println!("  {line}");
    }
    println!();
    println!("Set a default with: sonarchat set default-model <model>");
}
