//! Operator-facing input/output for the plaintext client.
//!
//! The plaintext client shows every server prompt to an operator and reads
//! the username and password from them. [`StdConsole`] uses the terminal;
//! [`ScriptedConsole`] replays fixed answers (CLI flags, tests).

use std::collections::VecDeque;
use std::io;

use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::error::{AuthError, Result};

/// Operator input source and display.
pub trait OperatorConsole: Send {
    /// Show a server message to the operator
    fn display<'a>(&'a mut self, message: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Read one line of operator input, without the line terminator
    fn read_line(&mut self) -> BoxFuture<'_, Result<String>>;
}

impl<C: OperatorConsole + ?Sized> OperatorConsole for &mut C {
    fn display<'a>(&'a mut self, message: &'a str) -> BoxFuture<'a, Result<()>> {
        (**self).display(message)
    }

    fn read_line(&mut self) -> BoxFuture<'_, Result<String>> {
        (**self).read_line()
    }
}

/// Terminal console on stdin/stdout.
pub struct StdConsole {
    stdin: BufReader<Stdin>,
    stdout: Stdout,
}

impl StdConsole {
    /// Attach to the process's stdin and stdout
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorConsole for StdConsole {
    fn display<'a>(&'a mut self, message: &'a str) -> BoxFuture<'a, Result<()>> {
        async move {
            self.stdout.write_all(message.as_bytes()).await?;
            self.stdout.write_all(b"\n").await?;
            self.stdout.flush().await?;
            Ok(())
        }
        .boxed()
    }

    fn read_line(&mut self) -> BoxFuture<'_, Result<String>> {
        async move {
            let mut line = String::new();
            // EOF yields an empty answer
            self.stdin.read_line(&mut line).await?;
            Ok(trim_newline(line))
        }
        .boxed()
    }
}

/// Console replaying pre-set answers and recording what was displayed.
#[derive(Debug, Default, Clone)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    /// Console answering with `answers` in order
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Messages displayed so far
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }
}

impl OperatorConsole for ScriptedConsole {
    fn display<'a>(&'a mut self, message: &'a str) -> BoxFuture<'a, Result<()>> {
        self.transcript.push(message.to_string());
        async { Ok(()) }.boxed()
    }

    fn read_line(&mut self) -> BoxFuture<'_, Result<String>> {
        let answer = self.answers.pop_front().ok_or_else(|| {
            AuthError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "No scripted answer left",
            ))
        });
        async move { answer }.boxed()
    }
}

fn trim_newline(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}
