/// One line typed at the console.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Tap,
    Toggle,
    Start,
    Stop,
    Bpm(i64),
    Time(i64),
    Volume(i64),
    Options,
    Help,
    Quit,
    /// Anything else, handed to the command parser.
    Text(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let mut words = trimmed.split_whitespace();
        let (Some(head), rest) = (words.next(), words.next()) else {
            return Input::Tap;
        };
        if words.next().is_some() {
            return Input::Text(line.to_string());
        }
        let head = head.to_ascii_lowercase();
        let number = rest.and_then(|word| word.parse::<i64>().ok());
        match (head.as_str(), rest, number) {
            ("tap" | "t", None, _) => Input::Tap,
            ("space" | "toggle", None, _) => Input::Toggle,
            ("start", None, _) => Input::Start,
            ("stop", None, _) => Input::Stop,
            ("bpm", Some(_), Some(n)) => Input::Bpm(n),
            ("time", Some(_), Some(n)) => Input::Time(n),
            ("volume" | "vol", Some(_), Some(n)) => Input::Volume(n),
            ("options", None, _) => Input::Options,
            ("help" | "?", None, _) => Input::Help,
            ("quit" | "exit" | "q", None, _) => Input::Quit,
            _ => Input::Text(line.to_string()),
        }
    }
}

pub const HELP: &str = "\
enter/tap       tap tempo
space/toggle    start or stop
start, stop
bpm N           20..240
time N          beats per bar, 1..8
volume N        0..100
options         list time signatures
quit
Any other line is scanned for [METRONOME: ...] commands.";
