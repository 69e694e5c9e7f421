//! Interactive price-check prompt.
//!
//! Launch with `puya-kiosk repl` (or no subcommand). Scan or type a code and
//! press Enter. Lines starting with `/` are commands; `/help` lists them.

use std::io::Write;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use puya_lookup::{normalize_identifier, OdooClient, RpcTransport};

use crate::config::resolve_history_path;
use crate::kiosk::lookup_and_render;
use crate::render::{render_product, OutputFormat};
use crate::session::KioskSession;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/again", "Look up the last code again"),
    ("/last", "Show the last product found"),
    ("/status", "Show connection settings and session counters"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the kiosk"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct KioskHelper;

impl Completer for KioskHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];
        if !input.starts_with('/') || input.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(input))
            .map(|(cmd, desc)| Pair {
                display: format!("{cmd:<10} {desc}"),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for KioskHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for KioskHelper {}
impl Validator for KioskHelper {}
impl Helper for KioskHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Run the interactive kiosk prompt until `/exit` or end of input.
pub async fn run<T: RpcTransport>(
    client: &OdooClient<T>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mpuya-kiosk v{}\x1b[0m \x1b[90m\u{2014} Price Scanner\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Scan or type a code and press Enter. \x1b[36m/help\x1b[0m for commands, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<KioskHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(KioskHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let hist_path = resolve_history_path();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut session = KioskSession::new();
    let mut stdout = std::io::stdout();
    let prompt = " \x1b[36mscan>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let action =
                    handle_line(&line, client, &mut session, format, &mut stdout).await?;
                if action == LineAction::Exit {
                    eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

/// What the prompt should do after a line was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    Continue,
    Exit,
}

/// Handle one prompt line: a `/command` or a code to look up.
///
/// Lookup renderings go to `out`; notices and command listings go to stderr.
pub async fn handle_line<T, W>(
    line: &str,
    client: &OdooClient<T>,
    session: &mut KioskSession,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<LineAction>
where
    T: RpcTransport,
    W: Write,
{
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineAction::Continue);
    }

    let Some(command) = line.strip_prefix('/') else {
        let Some(identifier) = normalize_identifier(line) else {
            return Ok(LineAction::Continue);
        };
        if !session.observe(&identifier) {
            eprintln!("  \x1b[90m(same code as before; /again to refresh)\x1b[0m");
            return Ok(LineAction::Continue);
        }
        lookup_and_render(&identifier, client, session, format, out).await?;
        return Ok(LineAction::Continue);
    };

    match command.split_whitespace().next().unwrap_or("") {
        "exit" | "quit" => return Ok(LineAction::Exit),
        "" | "help" | "h" | "?" => cmd_help(),
        "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
        "again" => cmd_again(client, session, format, out).await?,
        "last" => cmd_last(session),
        "status" => cmd_status(client, session),
        other => {
            eprintln!("  Unknown command '/{other}'. Type /help for commands.");
        }
    }
    Ok(LineAction::Continue)
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<10} {desc}");
    }
    eprintln!();
    eprintln!("  Anything else is treated as a product code.");
    eprintln!();
}

async fn cmd_again<T, W>(
    client: &OdooClient<T>,
    session: &mut KioskSession,
    format: OutputFormat,
    out: &mut W,
) -> anyhow::Result<()>
where
    T: RpcTransport,
    W: Write,
{
    let Some(identifier) = session.last_attempted().map(str::to_string) else {
        eprintln!("  Nothing scanned yet.");
        return Ok(());
    };
    session.reset();
    session.observe(&identifier);
    lookup_and_render(&identifier, client, session, format, out).await?;
    Ok(())
}

fn cmd_last(session: &KioskSession) {
    match session.last_product() {
        Some((product, at)) => {
            eprintln!();
            eprintln!("  Looked up at {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            for line in render_product(product).lines() {
                eprintln!("    {line}");
            }
            eprintln!();
        }
        None => eprintln!("  No product found yet."),
    }
}

fn cmd_status<T: RpcTransport>(client: &OdooClient<T>, session: &KioskSession) {
    let credentials = client.credentials();
    let stats = session.stats();
    eprintln!();
    eprintln!("  Endpoint:  {}", credentials.endpoint());
    eprintln!("  Database:  {}", credentials.database());
    eprintln!("  User:      {}", credentials.username());
    if let Some(code) = session.last_attempted() {
        eprintln!("  Last code: {code}");
    }
    eprintln!();
    eprintln!("  Lookups:   {}", stats.lookups);
    eprintln!("    found:     {}", stats.found);
    eprintln!("    not found: {}", stats.not_found);
    eprintln!("    failed:    {}", stats.failed);
    eprintln!("  Repeats skipped: {}", stats.duplicates_skipped);
    eprintln!();
}
