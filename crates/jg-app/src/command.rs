//! Host text commands.

use jg_upload::parse_atoi;

/// A parsed host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `id?`
    Identify,
    /// `pos?`
    Position,
    /// `p?`
    ProgramInfo,
    /// `?`
    Status,
    /// `upload`
    Upload,
    /// `play`
    Play,
    /// `stop`
    Stop,
    /// `pause`
    Pause,
    /// `,`
    PrevLine,
    /// `.`
    NextLine,
    /// `goto <n>`, zero-based line already resolved from the 1-based argument.
    Goto(usize),
    /// `preset <n>`
    Preset(u16),
    /// `b?`
    LineBuffer,
    /// `proto?`
    FullProgram,
    /// `fsm?`
    FsmState,
    /// `halt`
    Halt,
    /// `override_safety`
    OverrideSafety,
    /// `restore_safety`
    RestoreSafety,
}

impl Command {
    /// Parse one token. Unknown tokens yield `None`.
    ///
    /// `goto` and `preset` match by prefix; their argument follows with or
    /// without a separating space.
    pub fn parse(token: &str) -> Option<Command> {
        let cmd = match token {
            "id?" => Command::Identify,
            "pos?" => Command::Position,
            "p?" => Command::ProgramInfo,
            "?" => Command::Status,
            "upload" => Command::Upload,
            "play" => Command::Play,
            "stop" => Command::Stop,
            "pause" => Command::Pause,
            "," => Command::PrevLine,
            "." => Command::NextLine,
            "b?" => Command::LineBuffer,
            "proto?" => Command::FullProgram,
            "fsm?" => Command::FsmState,
            "halt" => Command::Halt,
            "override_safety" => Command::OverrideSafety,
            "restore_safety" => Command::RestoreSafety,
            _ => {
                if let Some(arg) = token.strip_prefix("goto") {
                    Command::Goto(parse_atoi(arg).max(1) - 1)
                } else if let Some(arg) = token.strip_prefix("preset") {
                    Command::Preset(u16::try_from(parse_atoi(arg)).unwrap_or(u16::MAX))
                } else {
                    return None;
                }
            }
        };
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_commands() {
        assert_eq!(Command::parse("id?"), Some(Command::Identify));
        assert_eq!(Command::parse("?"), Some(Command::Status));
        assert_eq!(Command::parse(","), Some(Command::PrevLine));
        assert_eq!(Command::parse("."), Some(Command::NextLine));
        assert_eq!(Command::parse("fsm?"), Some(Command::FsmState));
        assert_eq!(Command::parse("override_safety"), Some(Command::OverrideSafety));
    }

    #[test]
    fn goto_is_one_based() {
        assert_eq!(Command::parse("goto 5"), Some(Command::Goto(4)));
        assert_eq!(Command::parse("goto1"), Some(Command::Goto(0)));
        assert_eq!(Command::parse("goto 0"), Some(Command::Goto(0)));
        assert_eq!(Command::parse("goto -3"), Some(Command::Goto(0)));
        assert_eq!(Command::parse("goto"), Some(Command::Goto(0)));
    }

    #[test]
    fn preset_argument() {
        assert_eq!(Command::parse("preset 2"), Some(Command::Preset(2)));
        assert_eq!(Command::parse("preset"), Some(Command::Preset(0)));
        assert_eq!(Command::parse("preset 70000"), Some(Command::Preset(u16::MAX)));
    }

    #[test]
    fn unknown_commands() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("PLAY"), None);
        assert_eq!(Command::parse("id"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn goto_resolves_one_based_argument(n in 1usize..100_000) {
            prop_assert_eq!(Command::parse(&format!("goto {n}")), Some(Command::Goto(n - 1)));
        }

        #[test]
        fn parse_is_total(token in "\\PC{0,64}") {
            let _ = Command::parse(&token);
        }
    }
}
