//! The human in the loop. Every yes/no and menu choice the engine needs is
//! asked through [`Oracle`].

use std::collections::VecDeque;

use tracing::warn;

use crate::error::Interrupted;

pub trait Oracle {
    /// Yes/no question. `default` is what an empty answer means.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, Interrupted>;

    /// Pick one of `options`; returns its index.
    fn choose(&mut self, question: &str, options: &[String]) -> Result<usize, Interrupted>;
}

/// Ask a yes/no question, treating an interruption as "no".
pub fn confirm_or_decline(oracle: &mut dyn Oracle, question: &str, default: bool) -> bool {
    match oracle.confirm(question, default) {
        Ok(answer) => answer,
        Err(Interrupted) => {
            warn!(question, "prompt interrupted; treating as no");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Accept whatever default the question offers.
    Default,
    Pick(usize),
    Interrupt,
}

/// Replays queued answers and records every question it was asked.
///
/// A question with no queued answer, or with an answer of the wrong shape,
/// is treated as interrupted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedOracle {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn was_asked(&self, needle: &str) -> bool {
        self.asked.iter().any(|q| q.contains(needle))
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Oracle for ScriptedOracle {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool, Interrupted> {
        self.asked.push(question.to_string());
        match self.answers.pop_front() {
            Some(Answer::Yes) => Ok(true),
            Some(Answer::No) => Ok(false),
            Some(Answer::Default) => Ok(default),
            _ => Err(Interrupted),
        }
    }

    fn choose(&mut self, question: &str, options: &[String]) -> Result<usize, Interrupted> {
        self.asked.push(question.to_string());
        match self.answers.pop_front() {
            Some(Answer::Pick(i)) if i < options.len() => Ok(i),
            Some(Answer::Default) if !options.is_empty() => Ok(0),
            _ => Err(Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_dry_reads_as_interrupted() {
        let mut oracle = ScriptedOracle::new([Answer::Yes]);
        assert_eq!(oracle.confirm("first?", false), Ok(true));
        assert_eq!(oracle.confirm("second?", true), Err(Interrupted));
        assert!(!confirm_or_decline(&mut oracle, "third?", true));
        assert_eq!(oracle.asked().len(), 3);
    }

    #[test]
    fn out_of_range_pick_is_rejected() {
        let mut oracle = ScriptedOracle::new([Answer::Pick(5)]);
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(oracle.choose("which?", &options), Err(Interrupted));
    }
}
