use serde::{Deserialize, Serialize};

use crate::value::QueryRecord;

/// Metadata key under which a [`QueryRecord`] carries its conversation so far.
pub const HISTORY_KEY: &str = "context";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Human,
    Assistant,
}

/// One turn of a conversation, as stored in a dataset record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub utterance: String,
}

impl Utterance {
    pub fn new(speaker: Speaker, utterance: impl Into<String>) -> Self {
        Self {
            speaker,
            utterance: utterance.into(),
        }
    }
}

/// Renders conversation turns into a prompt block.
///
/// Histories longer than `max_history` lose turns from the middle, two at a
/// time, so the opening and the latest turns are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryTemplate {
    human_prefix: String,
    assistant_prefix: String,
    max_history: usize,
}

impl Default for HistoryTemplate {
    fn default() -> Self {
        Self::new("User: ", "Agent: ")
    }
}

impl HistoryTemplate {
    pub fn new(human_prefix: impl Into<String>, assistant_prefix: impl Into<String>) -> Self {
        Self {
            human_prefix: human_prefix.into(),
            assistant_prefix: assistant_prefix.into(),
            max_history: 10,
        }
    }

    /// Lowercase `user:` / `assistant:` turns used by the Llama chat prompts.
    pub fn llama_chat() -> Self {
        Self::new("user: ", "assistant: ")
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn format_utterance(&self, utterance: &Utterance) -> String {
        let prefix = match utterance.speaker {
            Speaker::Human => &self.human_prefix,
            Speaker::Assistant => &self.assistant_prefix,
        };
        format!("{}{}\n", prefix, utterance.utterance)
    }

    /// Turns that survive trimming, in conversation order.
    pub fn trim<'a>(&self, history: &'a [Utterance]) -> Vec<&'a Utterance> {
        if self.max_history == 0 {
            return Vec::new();
        }
        let mut kept: Vec<&Utterance> = history.iter().collect();
        while kept.len() > self.max_history {
            let mid = kept.len() / 2;
            if mid % 2 == 0 {
                kept.drain(mid - 2..mid);
            } else {
                kept.drain(mid - 1..mid + 1);
            }
        }
        kept
    }

    pub fn serialize_history(&self, history: &[Utterance]) -> String {
        self.trim(history)
            .into_iter()
            .map(|u| self.format_utterance(u))
            .collect::<String>()
            .trim()
            .to_owned()
    }

    /// The conversation stored under [`HISTORY_KEY`], empty when absent.
    pub fn history_of(record: &QueryRecord) -> anyhow::Result<Vec<Utterance>> {
        match record.metadata.get(HISTORY_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use yare::parameterized;

    use super::*;

    fn turns(n: usize) -> Vec<Utterance> {
        (0..n)
            .map(|i| {
                let speaker = if i % 2 == 0 { Speaker::Human } else { Speaker::Assistant };
                Utterance::new(speaker, i.to_string())
            })
            .collect()
    }

    fn kept(template: &HistoryTemplate, n: usize) -> Vec<String> {
        template
            .trim(&turns(n))
            .into_iter()
            .map(|u| u.utterance.clone())
            .collect()
    }

    #[parameterized(
        short = { 4, vec!["0", "1", "2", "3"] },
        at_limit = { 10, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"] },
        odd_midpoint = { 11, vec!["0", "1", "2", "3", "6", "7", "8", "9", "10"] },
        even_midpoint = { 12, vec!["0", "1", "2", "3", "6", "7", "8", "9", "10", "11"] },
        two_rounds = { 13, vec!["0", "1", "2", "3", "8", "9", "10", "11", "12"] },
    )]
    fn middle_turns_are_dropped(n: usize, expected: Vec<&str>) {
        assert_eq!(kept(&HistoryTemplate::default(), n), expected);
    }

    #[test]
    fn tiny_limits() {
        assert_eq!(kept(&HistoryTemplate::default().with_max_history(1), 2), Vec::<String>::new());
        assert_eq!(kept(&HistoryTemplate::default().with_max_history(2), 3), vec!["2"]);
        assert!(kept(&HistoryTemplate::default().with_max_history(0), 1).is_empty());
    }

    #[test]
    fn speaker_prefixes() {
        let history = turns(3);
        assert_eq!(
            HistoryTemplate::default().serialize_history(&history),
            "User: 0\nAgent: 1\nUser: 2"
        );
        assert_eq!(
            HistoryTemplate::llama_chat().serialize_history(&history),
            "user: 0\nassistant: 1\nuser: 2"
        );
        assert_eq!(HistoryTemplate::default().serialize_history(&[]), "");
    }

    #[test]
    fn history_from_record_metadata() -> anyhow::Result<()> {
        let record = QueryRecord::new("0", "And then?").with_metadata(
            HISTORY_KEY,
            json!([
                {"speaker": "Human", "utterance": "Hi"},
                {"speaker": "Assistant", "utterance": "Hello"}
            ]),
        );
        assert_eq!(
            HistoryTemplate::history_of(&record)?,
            vec![
                Utterance::new(Speaker::Human, "Hi"),
                Utterance::new(Speaker::Assistant, "Hello")
            ]
        );
        assert!(HistoryTemplate::history_of(&QueryRecord::new("1", "Q"))?.is_empty());

        let bad = QueryRecord::new("2", "Q")
            .with_metadata(HISTORY_KEY, json!([{"speaker": "Robot", "utterance": "beep"}]));
        assert!(HistoryTemplate::history_of(&bad).is_err());
        Ok(())
    }
}
