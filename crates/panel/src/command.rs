use clap::{AppSettings, Parser};

/// One console line. Every variant maps to exactly one panel operation.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[clap(setting(AppSettings::NoBinaryName))]
#[clap(rename_all = "kebab-case")]
pub enum PanelRequest {
    /// Toggle a relay channel by name
    Relay { name: String },

    /// Take one still image
    Still,

    /// Start or stop a video recording
    Video,

    /// Start or stop interval still capture
    Interval,

    /// Lengthen the capture interval by one second
    IntervalUp,

    /// Shorten the capture interval by one second
    IntervalDown,

    /// Show relay states, camera state and the latest sensor reading
    Status {
        #[clap(long)]
        json: bool,
    },

    /// Show the newest log entries
    Log {
        #[clap(long, default_value = "20")]
        count: usize,
    },

    Exit,
}

impl PanelRequest {
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(line.split_ascii_whitespace())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_console_lines() {
        assert_eq!(
            PanelRequest::parse_line("relay solder-iron").unwrap(),
            PanelRequest::Relay {
                name: "solder-iron".into()
            }
        );
        assert_eq!(
            PanelRequest::parse_line("interval-up").unwrap(),
            PanelRequest::IntervalUp
        );
        assert_eq!(
            PanelRequest::parse_line("log --count 3").unwrap(),
            PanelRequest::Log { count: 3 }
        );
        assert_eq!(
            PanelRequest::parse_line("status").unwrap(),
            PanelRequest::Status { json: false }
        );
    }

    #[test]
    fn rejects_unknown_commands() {
        assert!(PanelRequest::parse_line("kettle").is_err());
        assert!(PanelRequest::parse_line("relay").is_err());
    }
}
