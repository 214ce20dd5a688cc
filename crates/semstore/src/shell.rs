use semstore_common::SemStoreError;
use semstore_vector::{QueryResult, SemanticStore};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
Commands:
  add <title> | <text>      add a document
  search [-k N] <query>     top N documents for the query
  list                      show every document
  clear                     remove every document
  stats                     document count, model and index state
  rebuild                   re-embed everything
  help                      this text
  quit                      leave the shell";

/// One parsed shell line
#[derive(Debug, PartialEq)]
pub enum Command {
    Add { title: String, text: String },
    Search { query: String, k: Option<i64> },
    List,
    Clear,
    Stats,
    Rebuild,
    Help,
    Quit,
    Empty,
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "" => Ok(Command::Empty),
        "add" => {
            let (title, text) = rest
                .split_once('|')
                .ok_or_else(|| "usage: add <title> | <text>".to_string())?;
            Ok(Command::Add {
                title: title.trim().to_string(),
                text: text.trim().to_string(),
            })
        }
        "search" | "query" => {
            if let Some(after_flag) = rest.strip_prefix("-k") {
                let after_flag = after_flag.trim_start();
                let (number, query) = after_flag.split_once(char::is_whitespace).unwrap_or((after_flag, ""));
                let k = number
                    .parse::<i64>()
                    .map_err(|_| format!("invalid k: {:?}", number))?;
                Ok(Command::Search {
                    query: query.trim().to_string(),
                    k: Some(k),
                })
            } else {
                Ok(Command::Search {
                    query: rest.to_string(),
                    k: None,
                })
            }
        }
        "list" | "ls" => Ok(Command::List),
        "clear" => Ok(Command::Clear),
        "stats" | "status" => Ok(Command::Stats),
        "rebuild" => Ok(Command::Rebuild),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {:?} (try 'help')", other)),
    }
}

/// Read commands until EOF or `quit`, writing answers to `out`
pub async fn run<R, W>(
    store: &SemanticStore,
    input: R,
    out: &mut W,
    default_k: usize,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "error: {}", msg)?;
                continue;
            }
        };

        match execute(store, command, out, default_k).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_validation() => writeln!(out, "error: {}", e)?,
            Err(e) => {
                tracing::error!("Shell command failed: {}", e);
                writeln!(out, "error: {}", e)?;
            }
        }
    }

    Ok(())
}

/// Run one command; `Ok(false)` ends the session
async fn execute<W: Write>(
    store: &SemanticStore,
    command: Command,
    out: &mut W,
    default_k: usize,
) -> Result<bool, SemStoreError> {
    match command {
        Command::Empty => {}
        Command::Quit => return Ok(false),
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Add { title, text } => {
            let document = store.add(&title, &text).await?;
            writeln!(out, "added #{} {}", document.id, document.title)?;
        }
        Command::Search { query, k } => {
            let k = match k {
                None => default_k,
                Some(k) if k > 0 => usize::try_from(k).unwrap_or(usize::MAX),
                Some(k) => {
                    return Err(SemStoreError::validation(format!("k must be positive, got {}", k)))
                }
            };
            let results = store.search(&query, k).await?;
            if results.is_empty() {
                writeln!(out, "No results found. Try adding documents first.")?;
            }
            for result in &results {
                write_result(out, result)?;
            }
        }
        Command::List => {
            let documents = store.list().await;
            if documents.is_empty() {
                writeln!(out, "(no documents)")?;
            }
            for document in documents {
                writeln!(out, "#{} {}: {}", document.id, document.title, document.text)?;
            }
        }
        Command::Clear => {
            store.clear().await;
            writeln!(out, "cleared")?;
        }
        Command::Stats => {
            let status = store.status().await;
            writeln!(
                out,
                "documents: {}  model: {}  dimension: {}  state: {:?}",
                status.documents,
                status.model,
                status
                    .dimension
                    .map_or_else(|| "unknown".to_string(), |d| d.to_string()),
                status.state
            )?;
        }
        Command::Rebuild => {
            store.rebuild().await?;
            writeln!(out, "index rebuilt")?;
        }
    }
    Ok(true)
}

fn write_result<W: Write>(out: &mut W, result: &QueryResult) -> std::io::Result<()> {
    writeln!(out, "#{} {} (score: {:.4})", result.id, result.title, result.score)?;
    writeln!(out, "    {}", result.text)
}
