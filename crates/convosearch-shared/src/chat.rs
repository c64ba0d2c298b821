use std::collections::BTreeSet;

use tracing::debug;
use uuid::Uuid;

use crate::{FilterState, QueryResponse};

#[derive(Debug, Clone, PartialEq)]
pub struct BotAnswer {
    pub answer: String,
    pub sources: Vec<String>,
    pub confidence: f64,
    /// Filters the question was asked with.
    pub filters: FilterState,
}

impl BotAnswer {
    pub fn new(response: QueryResponse, filters: FilterState) -> Self {
        Self {
            answer: response.answer,
            sources: response.sources,
            confidence: response.confidence,
            filters,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatBody {
    Question(String),
    Answer(BotAnswer),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: Uuid,
    /// The question a bot entry answers.
    pub reply_to: Option<Uuid>,
    pub body: ChatBody,
}

impl ChatEntry {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to: None,
            body: ChatBody::Question(text.into()),
        }
    }

    pub fn answer(reply_to: Uuid, answer: BotAnswer) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to: Some(reply_to),
            body: ChatBody::Answer(answer),
        }
    }

    pub fn error(reply_to: Uuid, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reply_to: Some(reply_to),
            body: ChatBody::Error(message.into()),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.body, ChatBody::Question(_))
    }
}

/// Append-only chat history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
    awaiting: BTreeSet<Uuid>,
}

impl ChatLog {
    pub fn push(&mut self, entry: ChatEntry) {
        if entry.is_user() {
            self.awaiting.insert(entry.id);
        } else if let Some(question) = entry.reply_to
            && !self.awaiting.remove(&question)
        {
            debug!(%question, "reply for a question that is not awaiting an answer");
        }
        self.entries.push(entry);
    }

    /// Appends a user message and returns its id for the eventual reply.
    pub fn ask(&mut self, text: impl Into<String>) -> Uuid {
        let entry = ChatEntry::question(text);
        let id = entry.id;
        self.push(entry);
        id
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Questions still waiting for an answer or error.
    pub fn pending_count(&self) -> usize {
        self.awaiting.len()
    }
}
