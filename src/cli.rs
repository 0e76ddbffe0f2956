//! Command-line interface and REPL
//!
//! The REPL plays the host: each line becomes one host call on the engine.

use anyhow::{Context, Result};
use colored::*;
use osc_deck::actions::{ActionParams, SetDefaultsAction};
use osc_deck::engine::Engine;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Host slot size used by `image` when none is given
const DEFAULT_SLOT: u32 = 90;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("expected key=value, got '{0}'")]
    BadPair(String),
    #[error("'{0}' is not a tick count")]
    BadDiff(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Press { action: String, params: ActionParams },
    Turn { action: String, diff: i32, params: ActionParams },
    Reset { action: String, params: ActionParams },
    Image {
        action: String,
        params: ActionParams,
        slot: u32,
        out: Option<PathBuf>,
    },
    Items { action: String, control: String },
    State,
    Defaults {
        ip: String,
        port: String,
        listener: Option<String>,
    },
    Help,
    Quit,
    Empty,
}

impl CliCommand {
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(CliCommand::Empty);
        };
        let rest: Vec<&str> = words.collect();

        match command {
            "press" => {
                let (action, params) = action_and_params(&rest, "press <action> key=value...")?;
                Ok(CliCommand::Press { action, params })
            },
            "reset" => {
                let (action, params) = action_and_params(&rest, "reset <action> key=value...")?;
                Ok(CliCommand::Reset { action, params })
            },
            "turn" => {
                const USAGE: &str = "turn <action> <diff> key=value...";
                let [action, diff, pairs @ ..] = rest.as_slice() else {
                    return Err(CliError::Usage(USAGE));
                };
                let diff = diff
                    .parse::<i32>()
                    .map_err(|_| CliError::BadDiff(diff.to_string()))?;
                Ok(CliCommand::Turn {
                    action: action.to_string(),
                    diff,
                    params: parse_pairs(pairs)?,
                })
            },
            "image" => {
                let (action, mut params) =
                    action_and_params(&rest, "image <action> key=value... [slot=<px>] [out=<file.png>]")?;
                let out = params.remove("out").map(PathBuf::from);
                let slot = match params.remove("slot") {
                    Some(raw) => raw.parse().map_err(|_| CliError::BadPair(format!("slot={}", raw)))?,
                    None => DEFAULT_SLOT,
                };
                Ok(CliCommand::Image {
                    action,
                    params,
                    slot,
                    out,
                })
            },
            "items" => match rest.as_slice() {
                [action, control] => Ok(CliCommand::Items {
                    action: action.to_string(),
                    control: control.to_string(),
                }),
                _ => Err(CliError::Usage("items <action> <control>")),
            },
            "state" => Ok(CliCommand::State),
            "defaults" => match rest.as_slice() {
                [ip, port] => Ok(CliCommand::Defaults {
                    ip: ip.to_string(),
                    port: port.to_string(),
                    listener: None,
                }),
                [ip, port, listener] => Ok(CliCommand::Defaults {
                    ip: ip.to_string(),
                    port: port.to_string(),
                    listener: Some(listener.to_string()),
                }),
                _ => Err(CliError::Usage("defaults <ip> <port> [listener_port]")),
            },
            "help" | "?" => Ok(CliCommand::Help),
            "quit" | "exit" => Ok(CliCommand::Quit),
            other => Err(CliError::UnknownCommand(other.to_string())),
        }
    }
}

fn action_and_params(rest: &[&str], usage: &'static str) -> Result<(String, ActionParams), CliError> {
    let [action, pairs @ ..] = rest else {
        return Err(CliError::Usage(usage));
    };
    Ok((action.to_string(), parse_pairs(pairs)?))
}

fn parse_pairs(pairs: &[&str]) -> Result<ActionParams, CliError> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(CliError::BadPair(pair.to_string())),
        })
        .collect()
}

/// Read lines on a blocking thread and forward them to `tx`
///
/// Ctrl-C and Ctrl-D both end the session with a `quit` line.
pub fn spawn_repl(tx: mpsc::Sender<String>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                warn!("Failed to start line editor: {}", e);
                let _ = tx.blocking_send("quit".to_string());
                return;
            },
        };

        loop {
            let line = match rl.readline("osc> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    line
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => "quit".to_string(),
                Err(e) => {
                    warn!("Readline error: {}", e);
                    "quit".to_string()
                },
            };

            let quitting = matches!(line.trim(), "quit" | "exit");
            if tx.blocking_send(line).is_err() || quitting {
                break;
            }
        }
    })
}

pub fn print_help() {
    println!("\n{}", "=== OSC Deck ===".bold().cyan());
    let rows = [
        ("press <action> k=v...", "button press (ButtonOSC, SetDefaults)"),
        ("turn <action> <diff> k=v...", "dial rotation (oscknob, CustomKnobOSC)"),
        ("reset <action> k=v...", "dial press, resets a knob"),
        ("image <action> k=v... [slot=90] [out=f.png]", "render feedback"),
        ("items <action> <control>", "listbox options"),
        ("state", "address store as JSON"),
        ("defaults <ip> <port> [listener]", "save sender settings"),
        ("help", "this text"),
        ("quit | exit", "leave"),
    ];
    for (usage, what) in rows {
        println!("  {:<46} {}", usage.yellow(), what);
    }
    println!(
        "\n  e.g. {}",
        "press ButtonOSC type=toggle address=/mute label=Mute".green()
    );
}

/// Run one command; returns false when the session should end
pub fn execute(engine: &Engine, command: CliCommand) -> Result<bool> {
    debug!("REPL command: {:?}", command);
    match command {
        CliCommand::Press { action, params } | CliCommand::Reset { action, params } => {
            engine.run_command(&action, &params)?;
        },
        CliCommand::Turn { action, diff, params } => {
            engine.apply_adjustment(&action, &params, diff)?;
            if let Some(name) = engine.adjustment_display_name(&action, &params)? {
                println!("  {}", name.bright_white());
            }
        },
        CliCommand::Image {
            action,
            params,
            slot,
            out,
        } => match engine.request_image(&action, &params, slot, slot)? {
            Some(img) => {
                let (w, h) = img.dimensions();
                match out {
                    Some(path) => {
                        img.save(&path)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("  {}x{} image written to {}", w, h, path.display().to_string().green());
                    },
                    None => println!("  {}x{} image rendered (add out=<file.png> to save)", w, h),
                }
            },
            None => println!("  {}", "no image for this control".dimmed()),
        },
        CliCommand::Items { action, control } => {
            for item in engine.listbox_items(&action, &control)? {
                println!("  {:<10} {:<10} {}", item.value.yellow(), item.label, item.description.dimmed());
            }
        },
        CliCommand::State => {
            let snapshot = engine.store().snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        },
        CliCommand::Defaults { ip, port, listener } => {
            let mut params = ActionParams::new().with("sender_ip", ip).with("sender_port", port);
            if let Some(listener) = listener {
                params.insert("listener_port", listener);
            }
            engine.run_command(SetDefaultsAction::NAME, &params)?;
        },
        CliCommand::Help => print_help(),
        CliCommand::Quit => return Ok(false),
        CliCommand::Empty => {},
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press() {
        let cmd = CliCommand::parse("press ButtonOSC type=toggle address=/mute").unwrap();
        assert_eq!(
            cmd,
            CliCommand::Press {
                action: "ButtonOSC".to_string(),
                params: ActionParams::new()
                    .with("type", "toggle")
                    .with("address", "/mute"),
            }
        );
    }

    #[test]
    fn test_parse_turn() {
        let cmd = CliCommand::parse("turn oscknob -3 type=raw address=/gain").unwrap();
        assert!(matches!(cmd, CliCommand::Turn { diff: -3, .. }));
        assert_eq!(
            CliCommand::parse("turn oscknob left").unwrap_err(),
            CliError::BadDiff("left".to_string())
        );
        assert!(matches!(CliCommand::parse("turn"), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_parse_image_options() {
        let cmd = CliCommand::parse("image ButtonOSC type=basic address=/a slot=60 out=a.png").unwrap();
        let CliCommand::Image { params, slot, out, .. } = cmd else {
            panic!("expected image command");
        };
        assert_eq!(slot, 60);
        assert_eq!(out, Some(PathBuf::from("a.png")));
        assert_eq!(params.get("out"), None);
        assert_eq!(params.get("address"), Some("/a"));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(CliCommand::parse("   ").unwrap(), CliCommand::Empty);
        assert_eq!(CliCommand::parse("exit").unwrap(), CliCommand::Quit);
        assert_eq!(CliCommand::parse("state").unwrap(), CliCommand::State);
        assert_eq!(
            CliCommand::parse("defaults 10.0.0.2 8000").unwrap(),
            CliCommand::Defaults {
                ip: "10.0.0.2".to_string(),
                port: "8000".to_string(),
                listener: None,
            }
        );
        assert_eq!(
            CliCommand::parse("press ButtonOSC address").unwrap_err(),
            CliError::BadPair("address".to_string())
        );
        assert_eq!(
            CliCommand::parse("fly away").unwrap_err(),
            CliError::UnknownCommand("fly".to_string())
        );
    }
}
