use anyhow::Context as _;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::HistoryTemplate;
use crate::value::{Passage, QueryRecord};

/// Formats a query and its passages into one prompt.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, query: &QueryRecord, passages: &[Passage]) -> anyhow::Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PromptTemplateKind {
    /// Multiple-choice answering, one letter only.
    Qa,
    /// Open answer, "I don't know" when the passages do not contain it.
    QaUnanswerable,
    LlamaChatQa,
    LlamaChatQaUnanswerable,
    /// Open answer that also sees the conversation so far.
    ConvQa,
    ConvQaUnanswerable,
    LlamaChatConvQa,
    LlamaChatConvQaUnanswerable,
}

const PROMPT_TEMPLATE: &str = "prompt";
const PASSAGE_TEMPLATE: &str = "passage";

const DEFAULT_PASSAGE: &str = "- Title: {{ title }}\n{{ text }}\n\n";
// Llama chat models drift on blank lines, so passages are separated by a single newline.
const LLAMA_PASSAGE: &str = "- Title: {{ title }}\n{{ text }}\n";

const QA: &str = concat!(
    "You are a multiple-choice question answering machine. ",
    "You are only allowed to output a single letter. Do not write a full paragraph. ",
    "Please answer the following question given the following passages:\n",
    "{{ retrieved_passages }}\nQuestion: {{ query }}\nAnswer: "
);

const QA_UNANSWERABLE: &str = concat!(
    "Please answer the following question given the following passage. ",
    "If the answer is not in the passage or cannot be inferred from the passage, ",
    "respond as \"I don't know\".\n",
    "{{ retrieved_passages }}\nQuestion: {{ query }}\nAnswer: "
);

const LLAMA_CHAT_QA: &str = concat!(
    "[INST] <<SYS>>\n",
    "You are designed to answer multiple-choice questions. ",
    "Your answer format is \"<LETTER> - <EXPLANATION>\". ",
    "There is a RAG meant to help you by giving you resources that may be useful. ",
    "The RAG information starts NOW:",
    "\n<</SYS>>\n\n",
    "{{ retrieved_passages }}\n The RAG information stops NOW. ",
    "Your question is: {{ query }}\n",
    "[/INST]",
    "\nYou also may answer that you do not know. Among A, B, C or D, your answer is : "
);

const LLAMA_CHAT_QA_UNANSWERABLE: &str = concat!(
    "[INST] <<SYS>>\n",
    "Please answer the following question given the following passages. ",
    "If the answer is not in the passages or cannot be inferred from the passages, ",
    "respond as \"I don't know\".",
    "\n<</SYS>>\n\n",
    "{{ retrieved_passages }}\nQuestion: {{ query }}\n",
    "[/INST]",
    "\nAnswer: "
);

const CONV_QA: &str = concat!(
    "Please answer the following question given the following passages and the conversation history:\n\n",
    "{{ retrieved_passages }}\n\n{{ history }}\nUser: {{ query }}\nAgent: "
);

const CONV_QA_UNANSWERABLE: &str = concat!(
    "Please answer the following question given the following passage and the conversation history. ",
    "If the answer is not in the passage or cannot be infered from the passage, ",
    "respond as \"I don't know\".\n\n",
    "{{ retrieved_passages }}\n\n{{ history }}\nUser: {{ query }}\nAgent: "
);

const LLAMA_CHAT_CONV_QA: &str = concat!(
    "[INST] <<SYS>>\n",
    "Please answer the following question given the following passages and the conversation history:",
    "\n<</SYS>>\n\n",
    "{{ retrieved_passages }}\n{{ history }}\nuser: {{ query }}\n",
    "[/INST]",
    "\nassistant: "
);

const LLAMA_CHAT_CONV_QA_UNANSWERABLE: &str = concat!(
    "[INST] <<SYS>>\n",
    "Please answer the following question given the following passages and the conversation history. ",
    "If the answer is not in the passages or cannot be infered from the passages, ",
    "respond as \"I don't know\".",
    "\n<</SYS>>\n\n",
    "{{ retrieved_passages }}\n{{ history }}\nuser: {{ query }}\n",
    "[/INST]",
    "\nassistant: "
);

/// A [`PromptBuilder`] rendered with minijinja.
///
/// Two templates are involved. The passage template is rendered once per
/// passage with `title` and `text`; the results are concatenated and trimmed.
/// The prompt template then sees:
/// - `query`: the question text
/// - `retrieved_passages`: the serialized passages
/// - `record`: the whole [`QueryRecord`], including its metadata
/// - `history`: the serialized conversation, when a [`HistoryTemplate`] is set
///
/// A record whose conversation cannot be read fails to build.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    env: Environment<'static>,
    history: Option<HistoryTemplate>,
}

impl PromptTemplate {
    pub fn new(
        prompt_source: impl Into<String>,
        passage_source: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template_owned(PROMPT_TEMPLATE, prompt_source.into())
            .context("invalid prompt template")?;
        env.add_template_owned(PASSAGE_TEMPLATE, passage_source.into())
            .context("invalid passage template")?;
        Ok(Self { env, history: None })
    }

    pub fn with_history(mut self, history: HistoryTemplate) -> Self {
        self.history = Some(history);
        self
    }

    pub fn get(kind: PromptTemplateKind) -> anyhow::Result<Self> {
        let (prompt, passage, history) = match kind {
            PromptTemplateKind::Qa => (QA, DEFAULT_PASSAGE, None),
            PromptTemplateKind::QaUnanswerable => (QA_UNANSWERABLE, DEFAULT_PASSAGE, None),
            PromptTemplateKind::LlamaChatQa => (LLAMA_CHAT_QA, LLAMA_PASSAGE, None),
            PromptTemplateKind::LlamaChatQaUnanswerable => {
                (LLAMA_CHAT_QA_UNANSWERABLE, LLAMA_PASSAGE, None)
            }
            PromptTemplateKind::ConvQa => {
                (CONV_QA, DEFAULT_PASSAGE, Some(HistoryTemplate::default()))
            }
            PromptTemplateKind::ConvQaUnanswerable => (
                CONV_QA_UNANSWERABLE,
                DEFAULT_PASSAGE,
                Some(HistoryTemplate::default()),
            ),
            PromptTemplateKind::LlamaChatConvQa => (
                LLAMA_CHAT_CONV_QA,
                LLAMA_PASSAGE,
                Some(HistoryTemplate::llama_chat()),
            ),
            PromptTemplateKind::LlamaChatConvQaUnanswerable => (
                LLAMA_CHAT_CONV_QA_UNANSWERABLE,
                LLAMA_PASSAGE,
                Some(HistoryTemplate::llama_chat()),
            ),
        };
        let mut tmpl = Self::new(prompt, passage)?;
        tmpl.history = history;
        Ok(tmpl)
    }

    pub fn serialize_passages(&self, passages: &[Passage]) -> anyhow::Result<String> {
        let tmpl = self.env.get_template(PASSAGE_TEMPLATE)?;
        let mut out = String::new();
        for passage in passages {
            out.push_str(
                &tmpl
                    .render(context!(title => &passage.title, text => &passage.text))
                    .context("minijinja::render failed")?,
            );
        }
        Ok(out.trim().to_owned())
    }
}

impl PromptBuilder for PromptTemplate {
    fn build(&self, query: &QueryRecord, passages: &[Passage]) -> anyhow::Result<String> {
        let retrieved_passages = self.serialize_passages(passages)?;
        let history = match &self.history {
            Some(tmpl) => {
                let turns = HistoryTemplate::history_of(query)
                    .with_context(|| format!("unreadable conversation in query {}", query.id))?;
                tmpl.serialize_history(&turns)
            }
            None => String::new(),
        };
        self.env
            .get_template(PROMPT_TEMPLATE)?
            .render(context!(
                query => &query.question,
                retrieved_passages => retrieved_passages,
                record => query,
                history => history,
            ))
            .context("minijinja::render failed")
    }
}
