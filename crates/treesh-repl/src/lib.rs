//! treesh REPL: a line-driven front end over the kernel builtins.
//!
//! Reads one line at a time from stdin, runs it to completion, prints the
//! output and loops. The remote tree is an in-memory store loaded from a
//! JSON snapshot.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use treesh_kernel::builtins::BUILTINS;
use treesh_kernel::{CommandOutput, MemoryStore, Session, ShellConfig, run_line};

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineResult {
    Output(CommandOutput),
    Exit,
}

/// REPL state.
pub struct Repl {
    session: Session,
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL over `store` with the given configuration.
    pub fn new(config: &ShellConfig, store: Arc<MemoryStore>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        Ok(Self {
            session: Session::from_config(config, store),
            runtime,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Prompt showing the working directory.
    pub fn prompt(&self) -> String {
        format!("treesh:{}> ", self.session.cwd())
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> LineResult {
        let trimmed = line.trim();
        match trimmed {
            "exit" | "quit" | "/quit" | "/q" => return LineResult::Exit,
            "/help" | "/h" => return LineResult::Output(CommandOutput::success(help_text())),
            _ => {}
        }

        tracing::debug!(line = trimmed, "dispatching line");
        let session = &mut self.session;
        LineResult::Output(self.runtime.block_on(run_line(session, trimmed)))
    }
}

fn help_text() -> String {
    format!(
        "Builtins: {}\nMeta: /help, /quit (or exit)",
        BUILTINS.join(", ")
    )
}

/// Load the in-memory tree: a JSON snapshot, or an empty tree for `None`.
pub fn load_tree(path: Option<&Path>) -> Result<MemoryStore> {
    let Some(path) = path else {
        return Ok(MemoryStore::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree snapshot from {}", path.display()))?;
    MemoryStore::from_json(&json)
        .with_context(|| format!("Failed to parse tree snapshot from {}", path.display()))
}

/// Print a command's output, returning its exit code.
pub fn print_output(output: &CommandOutput) -> i64 {
    if !output.out.is_empty() {
        println!("{}", output.out);
    }
    if !output.err.is_empty() {
        eprintln!("{}", output.err);
    }
    output.code
}

/// Run the interactive loop until EOF or an exit command.
pub fn run(mut repl: Repl) -> Result<()> {
    println!("treesh v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", repl.prompt());
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            println!();
            return Ok(());
        };
        let line = line.context("Failed to read from stdin")?;

        match repl.process_line(&line) {
            LineResult::Output(output) => {
                print_output(&output);
            }
            LineResult::Exit => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{"type": "directory", "children": {
        "data": {"type": "directory", "children": {
            "a.txt": {"type": "file", "size": 3},
            "b.txt": {"type": "file", "size": 1}
        }},
        "home": {"type": "directory", "children": {
            "alice": {"type": "directory", "children": {
                "proj": {"type": "link", "target": "/data"}
            }}
        }}
    }}"#;

    fn repl() -> Repl {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tree.json");
        std::fs::write(&path, TREE).expect("write");
        let store = load_tree(Some(&path)).expect("load tree");

        let config = ShellConfig {
            user: Some("alice".into()),
            ..ShellConfig::default()
        };
        Repl::new(&config, Arc::new(store)).expect("repl")
    }

    fn out(repl: &mut Repl, line: &str) -> String {
        match repl.process_line(line) {
            LineResult::Output(output) => output.out,
            LineResult::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn test_prompt_tracks_cwd() {
        let mut repl = repl();
        assert_eq!(repl.prompt(), "treesh:/home/alice> ");
        out(&mut repl, "cd proj");
        assert_eq!(repl.prompt(), "treesh:/home/alice/proj> ");
    }

    #[test]
    fn test_runs_builtins() {
        let mut repl = repl();
        assert_eq!(out(&mut repl, "ls proj"), "a.txt\nb.txt");
        assert_eq!(out(&mut repl, "ls -S /data"), "b.txt\na.txt");
        assert_eq!(out(&mut repl, "ls /"), "bin\ndata\nhome");
    }

    #[test]
    fn test_meta_commands() {
        let mut repl = repl();
        assert_eq!(repl.process_line("  exit "), LineResult::Exit);
        assert!(out(&mut repl, "/help").contains("invalidate"));
    }

    #[test]
    fn test_errors_do_not_end_the_session() {
        let mut repl = repl();
        match repl.process_line("cd /missing") {
            LineResult::Output(output) => assert_eq!(output.code, 1),
            LineResult::Exit => panic!("unexpected exit"),
        }
        assert_eq!(out(&mut repl, "pwd"), "/home/alice");
    }

    #[test]
    fn test_load_tree_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_tree(Some(&dir.path().join("missing.json"))).is_err());
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").expect("write");
        assert!(load_tree(Some(&bad)).is_err());
        assert!(load_tree(None).is_ok());
    }
}
