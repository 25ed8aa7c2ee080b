//! Line-oriented control commands read from stdin.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    Add(Vec<PathBuf>),
    Remove(usize),
    Shuffle,
    Clear,
    Pause,
    Resume,
    Toggle,
    Next,
    Volume(u8),
    List,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  add <path>...   queue files
  rm <index>      remove a queued track
  shuffle         shuffle and restart from the top
  clear           empty the queue
  pause | resume | toggle
  next            skip to the next track
  vol <0-100>     set volume
  list            show the queue
  status          print status as JSON
  help
  quit";

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ControlCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "add" | "a" => {
            let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
            if paths.is_empty() {
                bail!("usage: add <path>...");
            }
            ControlCommand::Add(paths)
        }
        "rm" | "remove" => {
            let index = words.next().ok_or_else(|| anyhow!("usage: rm <index>"))?;
            let index = index
                .parse()
                .with_context(|| format!("invalid index {index:?}"))?;
            ControlCommand::Remove(index)
        }
        "vol" | "volume" => {
            let percent = words.next().ok_or_else(|| anyhow!("usage: vol <0-100>"))?;
            let percent: u8 = percent
                .parse()
                .with_context(|| format!("invalid volume {percent:?}"))?;
            if percent > 100 {
                bail!("volume must be 0-100");
            }
            ControlCommand::Volume(percent)
        }
        "shuffle" => ControlCommand::Shuffle,
        "clear" => ControlCommand::Clear,
        "pause" => ControlCommand::Pause,
        "resume" | "play" => ControlCommand::Resume,
        "toggle" | "p" => ControlCommand::Toggle,
        "next" | "n" | "skip" => ControlCommand::Next,
        "list" | "ls" => ControlCommand::List,
        "status" => ControlCommand::Status,
        "help" | "?" => ControlCommand::Help,
        "quit" | "q" | "exit" => ControlCommand::Quit,
        other => bail!("unknown command {other:?} (try `help`)"),
    };
    Ok(Some(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t").unwrap(), None);
    }

    #[test]
    fn add_collects_every_path() {
        assert_eq!(
            parse("add a.flac b.mp3").unwrap(),
            Some(ControlCommand::Add(vec![
                PathBuf::from("a.flac"),
                PathBuf::from("b.mp3")
            ]))
        );
        assert!(parse("add").is_err());
    }

    #[test]
    fn rm_needs_a_numeric_index() {
        assert_eq!(parse("rm 2").unwrap(), Some(ControlCommand::Remove(2)));
        assert!(parse("rm").is_err());
        assert!(parse("rm two").is_err());
        assert!(parse("rm -1").is_err());
    }

    #[test]
    fn volume_is_bounded() {
        assert_eq!(parse("vol 0").unwrap(), Some(ControlCommand::Volume(0)));
        assert_eq!(parse("VOL 100").unwrap(), Some(ControlCommand::Volume(100)));
        assert!(parse("vol 101").is_err());
        assert!(parse("vol 300").is_err());
    }

    #[test]
    fn aliases_map_to_commands() {
        assert_eq!(parse("n").unwrap(), Some(ControlCommand::Next));
        assert_eq!(parse("p").unwrap(), Some(ControlCommand::Toggle));
        assert_eq!(parse("q").unwrap(), Some(ControlCommand::Quit));
        assert_eq!(parse("ls").unwrap(), Some(ControlCommand::List));
    }

    #[test]
    fn unknown_verbs_are_errors() {
        let err = parse("dance").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}
