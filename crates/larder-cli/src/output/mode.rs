use crate::cli::Commands;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    if command.wants_json() {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputMode, mode_for_command};
    use crate::cli::parse_from;

    #[test]
    fn json_flag_selects_json_for_every_command() {
        let cases: [&[&str]; 3] = [
            &["usage", "--sales", "s.csv", "--recipes", "r.csv"],
            &["supply", "--shipments", "p.csv"],
            &["forecast", "--sales", "s.csv", "--recipes", "r.csv"],
        ];
        for args in cases {
            let argv = std::iter::once("larder")
                .chain(args.iter().copied())
                .chain(std::iter::once("--json"));
            let parsed = parse_from(argv);
            assert!(parsed.is_ok());
            if let Ok(cli) = parsed {
                assert_eq!(mode_for_command(&cli.command), OutputMode::Json);
            }
        }
    }

    #[test]
    fn text_is_the_default() {
        let parsed = parse_from(["larder", "supply", "--shipments", "p.csv"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            assert_eq!(mode_for_command(&cli.command), OutputMode::Text);
        }
    }
}
