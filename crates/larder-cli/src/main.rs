mod cli;
mod dispatch;
mod logging;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use larder_client::ClientError;
use stdout_io::write_stdout_text;

const ROOT_HELP: &str = "Larder - ingredient demand forecasting from point-of-sale exports

Usage:
  larder <command>

Start here:
  larder forecast --help
  larder usage --sales May_Data.csv June_Data.csv --recipes recipes.csv
";

const TOP_LEVEL_HELP: &str = "Larder - ingredient demand forecasting from point-of-sale exports

USAGE: larder <command> [--json]

Forecast and reconcile:
  larder forecast --sales <csv>... --recipes <csv> --shipments <csv>
                                  Forecast usage and flag months where supply falls short
  larder forecast ... --output report.csv
                                  Also write the report as CSV

Inspect a single stage:
  larder usage --sales <csv>... --recipes <csv>
                                  Monthly ingredient usage implied by sales
  larder supply --shipments <csv> Monthly supply implied by the shipment schedule

Settings:
  Pass --config <toml>, or place config.toml in $LARDER_HOME (default ~/.larder).
  Set RUST_LOG=larder_client=info for per-stage diagnostics on stderr.

Run `larder <command> --help` for table formats and options.
";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    logging::init();

    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    let mode = output::mode_for_command(&cli.command);
    tracing::debug!(command = cli.command.name(), ?mode, "dispatching command");

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&text).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        kind => {
            let command_hint = if matches!(
                kind,
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
            ) {
                command_path_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint);
            let mode = infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's trailing usage and "For more information" lines; the
/// recovery steps replace them.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// First non-flag argument, when it names a subcommand.
fn command_path_from_args(raw_args: &[String]) -> Option<&'static str> {
    let first = raw_args
        .iter()
        .skip(1)
        .find(|value| !value.starts_with('-'))?;
    match first.as_str() {
        "usage" => Some("usage"),
        "supply" => Some("supply"),
        "forecast" => Some("forecast"),
        _ => None,
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.code.starts_with("internal_") {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, infer_requested_output_mode, strip_clap_boilerplate};
    use crate::output::OutputMode;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn clap_usage_tail_is_removed() {
        let message = "error: the following required arguments were not provided:\n  --recipes <RECIPES>\n\nUsage: larder usage --sales <SALES>... --recipes <RECIPES>\n\nFor more information, try '--help'.\n";
        assert_eq!(
            strip_clap_boilerplate(message),
            "error: the following required arguments were not provided:\n  --recipes <RECIPES>"
        );
    }

    #[test]
    fn command_hint_comes_from_the_first_positional() {
        assert_eq!(
            command_path_from_args(&args(&["larder", "--json", "forecast", "--sales"])),
            Some("forecast")
        );
        assert_eq!(command_path_from_args(&args(&["larder", "reorder"])), None);
        assert_eq!(command_path_from_args(&args(&["larder", "--json"])), None);
    }

    #[test]
    fn json_flag_anywhere_requests_json_errors() {
        assert_eq!(
            infer_requested_output_mode(&args(&["larder", "supply", "--json"])),
            OutputMode::Json
        );
        assert_eq!(
            infer_requested_output_mode(&args(&["larder", "supply"])),
            OutputMode::Text
        );
    }
}
