//! CLI argument definitions

use clap::{ArgAction, Parser};

use super::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "pyprobe",
    about = "Sample the call stack of a running Python process",
    version = VERSION,
    disable_version_flag = true,
    after_help = "\
EXAMPLES:
    sudo pyprobe 1234                        Folded stacks for 1 second
    sudo pyprobe -s 10 -r 0.01 1234          10 seconds at 100 Hz
    sudo pyprobe -t 1234                     Timestamped trace"
)]
pub struct Args {
    /// Process ID to profile
    #[arg(value_name = "PID")]
    pub pid: String,

    /// How many seconds to run for
    #[arg(short, long, value_name = "SECS", default_value_t = 1.0)]
    pub seconds: f64,

    /// Sample rate, as a fractional value of seconds
    #[arg(short, long, value_name = "RATE", default_value_t = 0.001)]
    pub rate: f64,

    /// Show the version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Exclude idle time from statistics
    #[arg(short = 'x', long)]
    pub exclude_idle: bool,

    /// Include timestamps for each stacktrace
    #[arg(short, long)]
    pub timestamp: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pyprobe", "42"]).unwrap();
        assert_eq!(args.pid, "42");
        assert!((args.seconds - 1.0).abs() < f64::EPSILON);
        assert!((args.rate - 0.001).abs() < f64::EPSILON);
        assert!(!args.exclude_idle);
        assert!(!args.timestamp);
    }

    #[test]
    fn test_short_and_long_flags() {
        let args =
            Args::try_parse_from(["pyprobe", "-s", "2.5", "--rate=0.01", "-x", "-t", "7"]).unwrap();
        assert!((args.seconds - 2.5).abs() < f64::EPSILON);
        assert!((args.rate - 0.01).abs() < f64::EPSILON);
        assert!(args.exclude_idle);
        assert!(args.timestamp);
        assert_eq!(args.pid, "7");
    }

    #[test]
    fn test_extra_positional_rejected() {
        assert!(Args::try_parse_from(["pyprobe", "1", "2"]).is_err());
    }

    #[test]
    fn test_missing_pid_rejected_with_usage() {
        let err = Args::try_parse_from(["pyprobe"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.to_string().contains("Usage: pyprobe [OPTIONS] <PID>"));
    }

    #[test]
    fn test_version_without_pid() {
        let err = Args::try_parse_from(["pyprobe", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert!(err.to_string().starts_with("pyprobe "));
    }

    #[test]
    fn test_version_ignores_the_rest_of_the_line() {
        for argv in [
            &["pyprobe", "-v", "1", "2"][..],
            &["pyprobe", "-v", "-s", "abc"],
            &["pyprobe", "--version", "-r", "0"],
        ] {
            let err = Args::try_parse_from(argv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DisplayVersion, "argv: {argv:?}");
        }
    }

    #[test]
    fn test_help_shows_pid_as_required() {
        let usage = Args::command().render_usage().to_string();
        assert!(usage.contains("<PID>"), "usage: {usage}");
    }
}
