use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use super::{Client, Clock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Help,
    Quit,
    Minimize,
    Screenshot,
    /// `None` queries the current value.
    WindowScreen(Option<usize>),
    Fullscreen(Option<bool>),
    Borderless(Option<bool>),
    Vsync(Option<bool>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}. usage: {usage}")]
pub struct CommandParseError {
    reason: String,
    usage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandLineError {
    #[error("{0}. usage: help")]
    Tokenize(String),
    #[error("unknown command '{0}'. try: help")]
    Unknown(String),
    #[error(transparent)]
    Invalid(#[from] CommandParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandRegistrationError {
    #[error("command name cannot be empty")]
    EmptyName,
    #[error("duplicate command registration: {0}")]
    Duplicate(String),
}

type ParseFn = dyn Fn(&[String]) -> Result<ClientCommand, CommandParseError> + Send + Sync;

struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

/// Client commands by name. Lookup is case-insensitive; help lists commands in
/// registration order.
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

type BuiltinParse = fn(&[String]) -> Result<ClientCommand, CommandParseError>;

const BUILTINS: [(&str, &str, &str, BuiltinParse); 9] = [
    ("help", "List commands", "", parse_help),
    ("quit", "Quit the client", "", parse_quit),
    ("exit", "Quit the client", "", parse_quit),
    ("minimize", "Minimize the window", "", parse_minimize),
    ("screenshot", "Take a screenshot", "", parse_screenshot),
    ("gfx_screen", "Screen the window is on", "[index:usize]", parse_window_screen),
    ("gfx_fullscreen", "Fullscreen mode", "[0|1]", parse_fullscreen),
    ("gfx_borderless", "Borderless window", "[0|1]", parse_borderless),
    ("gfx_vsync", "Vertical sync", "[0|1]", parse_vsync),
];

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_client_builtins()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub fn with_client_builtins() -> Self {
        let mut registry = Self::new();
        for (name, help, arg_schema, parse) in BUILTINS {
            registry.insert(name.to_string(), help.to_string(), arg_schema.to_string(), Box::new(parse));
        }
        registry
    }

    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), CommandRegistrationError>
    where
        F: Fn(&[String]) -> Result<ClientCommand, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommandRegistrationError::EmptyName);
        }
        if self.lookup(&name).is_some() {
            return Err(CommandRegistrationError::Duplicate(name));
        }
        self.insert(name, help.into(), arg_schema.into(), Box::new(parse));
        Ok(())
    }

    fn insert(&mut self, name: String, help: String, arg_schema: String, parse: Box<ParseFn>) {
        self.lookup_by_lower_name
            .insert(name.to_ascii_lowercase(), self.specs.len());
        self.specs.push(CommandSpec {
            name,
            help,
            arg_schema,
            parse,
        });
    }

    fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let index = self
            .lookup_by_lower_name
            .get(&input_name.to_ascii_lowercase())?;
        self.specs.get(*index)
    }

    pub fn iter_specs_in_order(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.specs.iter().map(|spec| {
            (
                spec.name.as_str(),
                spec.help.as_str(),
                spec.arg_schema.as_str(),
            )
        })
    }

    /// `Ok(None)` for blank lines and comments.
    pub fn parse_line(&self, raw_line: &str) -> Result<Option<ClientCommand>, CommandLineError> {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            return Ok(None);
        }

        let tokens = tokenize_line(line).map_err(CommandLineError::Tokenize)?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let spec = self
            .lookup(command_name)
            .ok_or_else(|| CommandLineError::Unknown(command_name.clone()))?;
        Ok(Some((spec.parse)(args)?))
    }

    /// Parses and applies one line. Returns the lines to show the user.
    pub fn execute<C: Clock>(&self, client: &mut Client<C>, raw_line: &str) -> Vec<String> {
        match self.parse_line(raw_line) {
            Ok(Some(command)) => self.apply(client, command),
            Ok(None) => Vec::new(),
            Err(error) => vec![format!("error: {error}")],
        }
    }

    fn apply<C: Clock>(&self, client: &mut Client<C>, command: ClientCommand) -> Vec<String> {
        match command {
            ClientCommand::Help => self
                .iter_specs_in_order()
                .map(|(name, help, arg_schema)| {
                    if arg_schema.is_empty() {
                        format!("{name} - {help}")
                    } else {
                        format!("{name} {arg_schema} - {help}")
                    }
                })
                .collect(),
            ClientCommand::Quit => {
                info!(reason = "command", "shutdown_requested");
                client.quit();
                Vec::new()
            }
            ClientCommand::Minimize => {
                client.minimize();
                Vec::new()
            }
            ClientCommand::Screenshot => {
                client.screenshot();
                Vec::new()
            }
            ClientCommand::WindowScreen(None) => {
                vec![format!("gfx_screen is {}", client.config().gfx_screen)]
            }
            ClientCommand::WindowScreen(Some(index)) => {
                if client.config().gfx_screen != index {
                    client.switch_window_screen(index);
                }
                Vec::new()
            }
            ClientCommand::Fullscreen(None) => {
                vec![format!(
                    "gfx_fullscreen is {}",
                    u8::from(client.config().gfx_fullscreen)
                )]
            }
            ClientCommand::Fullscreen(Some(value)) => {
                if client.config().gfx_fullscreen != value {
                    client.toggle_fullscreen();
                }
                Vec::new()
            }
            ClientCommand::Borderless(None) => {
                vec![format!(
                    "gfx_borderless is {}",
                    u8::from(client.config().gfx_borderless)
                )]
            }
            ClientCommand::Borderless(Some(value)) => {
                let config = client.config();
                if !config.gfx_fullscreen && config.gfx_borderless != value {
                    client.toggle_window_bordered();
                }
                Vec::new()
            }
            ClientCommand::Vsync(None) => {
                vec![format!("gfx_vsync is {}", u8::from(client.config().gfx_vsync))]
            }
            ClientCommand::Vsync(Some(value)) => {
                if client.config().gfx_vsync != value {
                    client.toggle_window_vsync();
                }
                Vec::new()
            }
        }
    }

    /// Runs every line of a command file. A missing file is not an error and
    /// returns `Ok(false)`.
    pub fn execute_file<C: Clock>(&self, client: &mut Client<C>, path: &Path) -> io::Result<bool> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error),
        };

        for (line_index, line) in text.lines().enumerate() {
            for output in self.execute(client, line) {
                if output.starts_with("error:") {
                    warn!(
                        file = %path.display(),
                        line = line_index + 1,
                        output = output.as_str(),
                        "command_file_error"
                    );
                } else {
                    info!(output = output.as_str(), "command_output");
                }
            }
        }
        info!(file = %path.display(), "command_file_executed");
        Ok(true)
    }
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..index],
            _ => {}
        }
    }
    line
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            _ => {
                current.push(ch);
                pending = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_help(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(ClientCommand::Help)
}

fn parse_quit(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    require_no_args(args, "quit")?;
    Ok(ClientCommand::Quit)
}

fn parse_minimize(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    require_no_args(args, "minimize")?;
    Ok(ClientCommand::Minimize)
}

fn parse_screenshot(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    require_no_args(args, "screenshot")?;
    Ok(ClientCommand::Screenshot)
}

fn parse_window_screen(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    const USAGE: &str = "gfx_screen [index]";
    let Some(raw) = optional_single_arg(args, USAGE)? else {
        return Ok(ClientCommand::WindowScreen(None));
    };
    let index = raw.parse::<usize>().map_err(|_| CommandParseError {
        reason: format!("invalid screen index '{raw}' (expected usize)"),
        usage: USAGE.to_string(),
    })?;
    Ok(ClientCommand::WindowScreen(Some(index)))
}

fn parse_fullscreen(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    parse_flag(args, "gfx_fullscreen [0|1]").map(ClientCommand::Fullscreen)
}

fn parse_borderless(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    parse_flag(args, "gfx_borderless [0|1]").map(ClientCommand::Borderless)
}

fn parse_vsync(args: &[String]) -> Result<ClientCommand, CommandParseError> {
    parse_flag(args, "gfx_vsync [0|1]").map(ClientCommand::Vsync)
}

/// Integer flag; any non-zero value is on.
fn parse_flag(args: &[String], usage: &str) -> Result<Option<bool>, CommandParseError> {
    let Some(raw) = optional_single_arg(args, usage)? else {
        return Ok(None);
    };
    let value = raw.parse::<i64>().map_err(|_| CommandParseError {
        reason: format!("invalid flag value '{raw}' (expected integer)"),
        usage: usage.to_string(),
    })?;
    Ok(Some(value != 0))
}

fn optional_single_arg<'a>(
    args: &'a [String],
    usage: &str,
) -> Result<Option<&'a str>, CommandParseError> {
    match args {
        [] => Ok(None),
        [single] => Ok(Some(single.as_str())),
        _ => Err(CommandParseError {
            reason: "expected at most one argument".to_string(),
            usage: usage.to_string(),
        }),
    }
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError {
            reason: "unexpected extra arguments".to_string(),
            usage: usage.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::app::clock::SimClock;
    use crate::app::collaborators::fakes::{collaborators, SharedLog};
    use crate::app::ClientState;
    use crate::config::ClientConfig;

    fn client(clock: &SimClock) -> (Client<&SimClock>, SharedLog) {
        let (collaborators, log) = collaborators(Vec::new());
        let mut client = Client::with_clock(
            clock,
            ClientConfig::default(),
            collaborators,
            PathBuf::from("shots"),
        );
        client.start().expect("start");
        (client, log)
    }

    #[test]
    fn help_lists_commands_in_registration_order() {
        let clock = SimClock::new(Duration::from_micros(10));
        let (mut client, _log) = client(&clock);
        let registry = CommandRegistry::with_client_builtins();

        let lines = registry.execute(&mut client, "help");

        assert_eq!(lines[0], "help - List commands");
        assert_eq!(lines[1], "quit - Quit the client");
        assert_eq!(lines[2], "exit - Quit the client");
        assert_eq!(lines[5], "gfx_screen [index:usize] - Screen the window is on");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = CommandRegistry::with_client_builtins();
        assert_eq!(registry.parse_line("QUIT"), Ok(Some(ClientCommand::Quit)));
        assert_eq!(
            registry.parse_line("Gfx_VSync 1"),
            Ok(Some(ClientCommand::Vsync(Some(true))))
        );
    }

    #[test]
    fn unknown_command_and_bad_args_report_errors() {
        let clock = SimClock::new(Duration::from_micros(10));
        let (mut client, _log) = client(&clock);
        let registry = CommandRegistry::with_client_builtins();

        assert_eq!(
            registry.execute(&mut client, "nope"),
            vec!["error: unknown command 'nope'. try: help"]
        );
        assert_eq!(
            registry.execute(&mut client, "gfx_screen left"),
            vec!["error: invalid screen index 'left' (expected usize). usage: gfx_screen [index]"]
        );
        assert_eq!(
            registry.execute(&mut client, "quit now"),
            vec!["error: unexpected extra arguments. usage: quit"]
        );
        assert_eq!(client.state(), ClientState::Offline);
    }

    #[test]
    fn exit_and_quit_both_request_quitting() {
        let clock = SimClock::new(Duration::from_micros(10));
        let registry = CommandRegistry::with_client_builtins();
        for line in ["quit", "exit"] {
            let (mut client, _log) = client(&clock);
            registry.execute(&mut client, line);
            assert_eq!(client.state(), ClientState::Quitting);
        }
    }

    #[test]
    fn chained_settings_report_and_apply() {
        let clock = SimClock::new(Duration::from_micros(10));
        let (mut client, log) = client(&clock);
        let registry = CommandRegistry::with_client_builtins();

        assert_eq!(registry.execute(&mut client, "gfx_vsync"), vec!["gfx_vsync is 0"]);
        registry.execute(&mut client, "gfx_vsync 1");
        assert!(client.config().gfx_vsync);
        assert!(log.borrow().vsync);

        registry.execute(&mut client, "gfx_screen 1");
        assert_eq!(client.config().gfx_screen, 1);

        registry.execute(&mut client, "gfx_fullscreen 1");
        assert!(client.config().gfx_fullscreen);
        registry.execute(&mut client, "gfx_fullscreen 1");
        assert_eq!(log.borrow().fullscreen_changes, vec![true]);

        registry.execute(&mut client, "gfx_borderless 1");
        assert!(!client.config().gfx_borderless);

        registry.execute(&mut client, "gfx_fullscreen 0");
        registry.execute(&mut client, "gfx_borderless 1");
        assert!(client.config().gfx_borderless);
    }

    #[test]
    fn minimize_and_screenshot_reach_graphics() {
        let clock = SimClock::new(Duration::from_micros(10));
        let (mut client, log) = client(&clock);
        let registry = CommandRegistry::with_client_builtins();

        registry.execute(&mut client, "minimize");
        registry.execute(&mut client, "screenshot");

        assert!(log.borrow().minimized);
        assert_eq!(log.borrow().screenshots, vec![None]);
    }

    #[test]
    fn command_file_skips_comments_and_blank_lines() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("autoexec.cfg");
        fs::write(
            &path,
            "# window setup\n\ngfx_vsync 1 # trailing\nbogus\ngfx_screen \"1\"\n",
        )
        .expect("write");

        let clock = SimClock::new(Duration::from_micros(10));
        let (mut client, _log) = client(&clock);
        let registry = CommandRegistry::with_client_builtins();

        assert!(registry.execute_file(&mut client, &path).expect("execute"));
        assert!(client.config().gfx_vsync);
        assert_eq!(client.config().gfx_screen, 1);

        let missing = temp.path().join("missing.cfg");
        assert!(!registry.execute_file(&mut client, &missing).expect("missing"));
    }

    #[test]
    fn registration_rejects_empty_and_duplicate_names() {
        let mut registry = CommandRegistry::with_client_builtins();
        assert_eq!(
            registry.register(" ", "", "", |_| Ok(ClientCommand::Help)),
            Err(CommandRegistrationError::EmptyName)
        );
        assert_eq!(
            registry.register("Quit", "", "", |_| Ok(ClientCommand::Quit)),
            Err(CommandRegistrationError::Duplicate("Quit".to_string()))
        );
        assert!(registry
            .register("leave", "Alias for quit", "", |_| Ok(ClientCommand::Quit))
            .is_ok());
        assert_eq!(registry.parse_line("leave"), Ok(Some(ClientCommand::Quit)));
    }

    #[test]
    fn tokenizer_handles_quotes_and_errors() {
        assert_eq!(
            tokenize_line("gfx_screen \"1\"  ").expect("tokens"),
            vec!["gfx_screen", "1"]
        );
        assert!(tokenize_line("echo \"oops").is_err());
        assert_eq!(strip_comment("a \"#b\" # c"), "a \"#b\" ");
    }
}
