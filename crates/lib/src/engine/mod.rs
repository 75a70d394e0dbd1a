//! Computation client: sends a normalized query to the knowledge engine and returns its pods.
//!
//! A response with zero pods is a valid outcome (not every query resolves). Each call is a
//! single attempt; callers decide whether to retry.

mod wolfram;

pub use wolfram::{EngineError, WolframClient};

use async_trait::async_trait;

/// One sub-result of a pod: a plain-text rendering and a reference to the rendered image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subpod {
    pub plain_text: String,
    pub image_ref: Option<String>,
}

/// One titled result group returned by the engine, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pod {
    pub title: String,
    pub subpods: Vec<Subpod>,
}

impl Pod {
    /// Newline-joined plain text of all subpods. While nothing has been accumulated yet a
    /// fragment replaces the text instead of being appended, so leading blanks leave no gap.
    pub fn joined_text(&self) -> String {
        self.subpods.iter().fold(String::new(), |acc, s| {
            if acc.is_empty() {
                s.plain_text.clone()
            } else {
                format!("{}\n{}", acc, s.plain_text)
            }
        })
    }

    /// Image reference of the first subpod, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.subpods.first().and_then(|s| s.image_ref.as_deref())
    }
}

/// A knowledge engine that resolves a query into an ordered list of pods.
#[async_trait]
pub trait ComputeEngine: Send + Sync {
    async fn query(&self, input: &str) -> Result<Vec<Pod>, EngineError>;
}
