/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Message(&'a str),
    Clear,
    Help,
    Exit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        if !line.starts_with('/') {
            return Input::Message(line);
        }
        match line {
            "/clear" => Input::Clear,
            "/help" | "/h" | "/?" => Input::Help,
            "/exit" | "/quit" | "/q" => Input::Exit,
            other => Input::Unknown(other),
        }
    }
}
