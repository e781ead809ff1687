//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ai_llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};
use ai_llm_service::{AiLlmError, ChatMessage};
use conversation::{ConversationTurn, EnvelopeShape, RawHistory, ResponseEnvelope};
use futures::future::BoxFuture;
use rag_store::{
    ChunkPayload, HashEmbedder, MEMORY_URI, MemoryVectorIndex, RagConfig, RagError, VectorHit,
    VectorIndex, VectorPoint,
};

use crate::backend::ChatBackend;
use crate::cfg::{BackendKind, ContextorConfig, RetrievalSettings, RewriteSettings};
use crate::error::ContextorError;
use crate::llm::LanguageModel;
use crate::prompt::PromptTokens;

pub const DIM: usize = 64;

/// Model answering from queues; an exhausted queue is an upstream error.
#[derive(Default)]
pub struct ScriptedModel {
    completions: Mutex<VecDeque<String>>,
    chats: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub chat_calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn completing(replies: &[&str]) -> Self {
        let m = Self::default();
        m.completions
            .lock()
            .unwrap()
            .extend(replies.iter().map(|s| s.to_string()));
        m
    }

    pub fn chatting(replies: &[&str]) -> Self {
        let m = Self::default();
        m.chats
            .lock()
            .unwrap()
            .extend(replies.iter().map(|s| s.to_string()));
        m
    }

    fn exhausted() -> AiLlmError {
        ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices).into()
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.completions
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(Self::exhausted)
        })
    }

    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(last) = messages.last() {
                self.prompts.lock().unwrap().push(last.content.clone());
            }
            self.chats
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(Self::exhausted)
        })
    }
}

/// Backend returning a fixed envelope and counting reloads.
pub struct FakeBackend {
    pub shape: EnvelopeShape,
    pub raw_history: RawHistory,
    pub envelope: ResponseEnvelope,
    pub reloads: AtomicUsize,
}

impl FakeBackend {
    pub fn new(shape: EnvelopeShape, raw_history: RawHistory, envelope: ResponseEnvelope) -> Self {
        Self {
            shape,
            raw_history,
            envelope,
            reloads: AtomicUsize::new(0),
        }
    }

    pub fn idle() -> Arc<Self> {
        Arc::new(Self::new(
            EnvelopeShape::Cloud,
            RawHistory::Pairs(vec![]),
            ResponseEnvelope::new(),
        ))
    }
}

impl ChatBackend for FakeBackend {
    fn shape(&self) -> EnvelopeShape {
        self.shape.clone()
    }

    fn handle_interaction<'a>(
        &'a self,
        _prompt: &'a str,
        _history: &'a [ConversationTurn],
    ) -> BoxFuture<'a, Result<(RawHistory, ResponseEnvelope), ContextorError>> {
        Box::pin(async move { Ok((self.raw_history.clone(), self.envelope.clone())) })
    }

    fn add_document<'a>(&'a self, _filename: &'a str) -> BoxFuture<'a, Result<(), ContextorError>> {
        Box::pin(async { Ok(()) })
    }

    fn reload(&self) -> BoxFuture<'_, Result<(), ContextorError>> {
        Box::pin(async move {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

pub fn config(dir: &std::path::Path, backend: BackendKind, rewrite: bool) -> ContextorConfig {
    let mut rag = RagConfig::new_default(MEMORY_URI, dir);
    rag.space.size = DIM;
    ContextorConfig {
        backend,
        rewrite: RewriteSettings {
            enabled: rewrite,
            max_attempts: 2,
        },
        retrieval: RetrievalSettings::default(),
        tokens: PromptTokens::default(),
        rag,
    }
}

pub fn embedder() -> Arc<HashEmbedder> {
    Arc::new(HashEmbedder::new(DIM))
}

/// Memory index whose deletes always fail, or never finish when `hang`.
#[derive(Default)]
pub struct FailingDeleteIndex {
    pub inner: MemoryVectorIndex,
    pub hang: bool,
}

impl FailingDeleteIndex {
    pub fn hanging() -> Self {
        Self {
            inner: MemoryVectorIndex::new(),
            hang: true,
        }
    }
}

impl VectorIndex for FailingDeleteIndex {
    fn ensure_collection(&self, dim: usize) -> BoxFuture<'_, Result<(), RagError>> {
        self.inner.ensure_collection(dim)
    }

    fn load_collection(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        self.inner.load_collection()
    }

    fn release_collection(&self) -> BoxFuture<'_, Result<(), RagError>> {
        self.inner.release_collection()
    }

    fn count_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        self.inner.count_by_source(source)
    }

    fn delete_by_source<'a>(&'a self, _source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        if self.hang {
            return Box::pin(futures::future::pending());
        }
        Box::pin(async { Err(RagError::Qdrant("delete rejected".into())) })
    }

    fn upsert(&self, points: Vec<VectorPoint>) -> BoxFuture<'_, Result<u64, RagError>> {
        self.inner.upsert(points)
    }

    fn search(&self, vector: Vec<f32>, k: u64) -> BoxFuture<'_, Result<Vec<VectorHit>, RagError>> {
        self.inner.search(vector, k)
    }
}

/// `n` points for `source` with distinct ids.
pub fn points_for(source: &str, n: usize) -> Vec<VectorPoint> {
    (0..n)
        .map(|i| {
            let id = rag_store::point_id(source, i);
            VectorPoint {
                id: id.clone(),
                vector: vec![1.0; DIM],
                payload: ChunkPayload {
                    source: source.to_string(),
                    text: format!("chunk {i}"),
                    pk: id,
                },
            }
        })
        .collect()
}
