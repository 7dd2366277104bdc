//! Interactive line prompts

use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::{Error, Result};

/// Source of interactive answers
#[async_trait]
pub trait Prompter: Send {
    /// Ask a question and wait for one line of input, without the newline
    async fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompter reading answers from the controlling terminal
pub struct StdinPrompter {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn ask(&mut self, question: &str) -> Result<String> {
        {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{} ", question)?;
            stdout.flush()?;
        }

        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(Error::InputClosed),
        }
    }
}

/// Prompter answering from a fixed list, for non-interactive callers
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    /// Questions asked so far
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, question: &str) -> Result<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front().ok_or(Error::InputClosed)
    }
}
