//! Builtin commands and the outermost error boundary.
//!
//! [`run_line`] takes one line of user input through the whole core:
//! tokenize, expand unquoted wildcard words, dispatch. Failures become a
//! single line of text; nothing here ends the session.
//!
//! | command      | usage                               |
//! |--------------|-------------------------------------|
//! | `cd`         | `cd [dir]`, `cd -`                  |
//! | `pwd`        | `pwd [-L\|-P]`                      |
//! | `ls`         | `ls [-d] [-r] [-S\|-t\|-o] [path..]` |
//! | `mode`       | `mode [logical\|physical]`          |
//! | `invalidate` | `invalidate [path]`                 |

use treesh_types::{AddressingMode, Entry, ListOptions, SortKey, VfsError, VfsResult};

use crate::lexer::tokenize;
use crate::session::Session;

/// Result of one command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code. 0 means success.
    pub code: i64,
    pub out: String,
    pub err: String,
}

impl CommandOutput {
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
        }
    }

    pub fn failure(code: i64, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
        }
    }

    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// Names of the builtin commands.
pub const BUILTINS: &[&str] = &["cd", "invalidate", "ls", "mode", "pwd"];

/// Run one line of input.
pub async fn run_line(session: &mut Session, line: &str) -> CommandOutput {
    let words = match tokenize(line) {
        Ok(words) => words,
        Err(e) => return CommandOutput::failure(2, format!("treesh: {e}")),
    };
    let Some((name, rest)) = words.split_first() else {
        return CommandOutput::default();
    };
    let name = name.text.as_str();

    let args = match session.expand_words(rest).await {
        Ok(args) => args,
        Err(err) => return report(session, name, err),
    };

    tracing::debug!(command = name, args = ?args, "dispatch");
    match name {
        "cd" => cd(session, &args).await,
        "pwd" => pwd(session, &args).await,
        "ls" => ls(session, &args).await,
        "mode" => mode(session, &args),
        "invalidate" => invalidate(session, &args).await,
        other => CommandOutput::failure(127, format!("{other}: command not found")),
    }
}

/// Turn a failure into its one line of text, clearing the error log.
fn report(session: &Session, command: &str, err: VfsError) -> CommandOutput {
    CommandOutput::failure(1, format!("{command}: {}", take_message(session, err)))
}

fn take_message(session: &Session, err: VfsError) -> String {
    session
        .errors()
        .drain()
        .pop()
        .unwrap_or(err)
        .to_string()
}

async fn cd(session: &mut Session, args: &[String]) -> CommandOutput {
    match args {
        [] => {
            let home = session.context().home();
            match session.cd(home.as_str()).await {
                Ok(_) => CommandOutput::success(""),
                Err(err) => report(session, "cd", err),
            }
        }
        [dash] if dash == "-" => match session.cd_previous().await {
            Ok(Some(dir)) => CommandOutput::success(dir.to_string()),
            Ok(None) => CommandOutput::failure(1, "cd: OLDPWD not set"),
            Err(err) => report(session, "cd", err),
        },
        [dir] => match session.cd(dir).await {
            Ok(_) => CommandOutput::success(""),
            Err(err) => report(session, "cd", err),
        },
        _ => CommandOutput::failure(2, "cd: too many arguments"),
    }
}

async fn pwd(session: &Session, args: &[String]) -> CommandOutput {
    let mut physical = false;
    for arg in args {
        match arg.as_str() {
            "-P" => physical = true,
            "-L" => physical = false,
            other => return CommandOutput::failure(2, format!("pwd: unknown option {other}")),
        }
    }
    match session.pwd(physical).await {
        Ok(dir) => CommandOutput::success(dir.to_string()),
        Err(err) => report(session, "pwd", err),
    }
}

async fn ls(session: &Session, args: &[String]) -> CommandOutput {
    let mut opts = session.list_options();
    let mut paths: Vec<&str> = Vec::new();

    for arg in args {
        match arg.strip_prefix('-') {
            Some(flags) if !flags.is_empty() => {
                for flag in flags.chars() {
                    match flag {
                        'd' => opts.self_only = true,
                        'r' => opts.reverse = true,
                        'S' => opts.sort = SortKey::Size,
                        't' => opts.sort = SortKey::Modified,
                        'o' => opts.sort = SortKey::Owner,
                        other => {
                            return CommandOutput::failure(2, format!("ls: unknown option -{other}"));
                        }
                    }
                }
            }
            _ => paths.push(arg),
        }
    }
    if paths.is_empty() {
        paths.push("");
    }

    let headers = paths.len() > 1 && !opts.self_only;
    let mut operands = Vec::new();
    let mut blocks = Vec::new();
    let mut errors = Vec::new();

    for path in &paths {
        match list_operand(session, path, opts).await {
            Ok(Listed::Operand) => operands.push(path.to_string()),
            Ok(Listed::Children(entries)) => {
                let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
                let body = names.join("\n");
                blocks.push(if headers { format!("{path}:\n{body}") } else { body });
            }
            Err(err) => errors.push(format!("ls: {}", take_message(session, err))),
        }
    }

    // Non-directory operands print first, as one block
    if !operands.is_empty() {
        blocks.insert(0, operands.join("\n"));
    }
    let separator = if headers { "\n\n" } else { "\n" };
    CommandOutput {
        code: if errors.is_empty() { 0 } else { 1 },
        out: blocks.join(separator),
        err: errors.join("\n"),
    }
}

/// What `ls` prints for one operand.
enum Listed {
    /// The operand itself: a file, an executable, or anything under `-d`.
    Operand,
    Children(Vec<Entry>),
}

async fn list_operand(session: &Session, path: &str, opts: ListOptions) -> VfsResult<Listed> {
    if opts.self_only {
        session.list(path, opts).await?;
        return Ok(Listed::Operand);
    }
    match session.list(path, opts).await {
        Ok(entries) => Ok(Listed::Children(entries)),
        Err(err @ VfsError::NotADirectory(_)) => {
            let described = session.list(path, opts.self_only(true)).await?;
            if described.first().is_some_and(|e| !e.is_dir_like()) {
                session.errors().drain();
                Ok(Listed::Operand)
            } else {
                Err(err)
            }
        }
        Err(err) => Err(err),
    }
}

fn mode(session: &mut Session, args: &[String]) -> CommandOutput {
    match args {
        [] => CommandOutput::success(session.mode().to_string()),
        [value] => match value.parse::<AddressingMode>() {
            Ok(mode) => {
                session.set_mode(mode);
                CommandOutput::success("")
            }
            Err(e) => CommandOutput::failure(2, format!("mode: {e}")),
        },
        _ => CommandOutput::failure(2, "mode: too many arguments"),
    }
}

async fn invalidate(session: &Session, args: &[String]) -> CommandOutput {
    let result = match args {
        [] => session.invalidate(None).await,
        [path] => session.invalidate(Some(path.as_str())).await,
        _ => return CommandOutput::failure(2, "invalidate: too many arguments"),
    };
    match result {
        Ok(()) => CommandOutput::success(""),
        Err(err) => report(session, "invalidate", err),
    }
}
