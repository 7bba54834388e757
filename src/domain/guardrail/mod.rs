//! Request admission pipeline.
//!
//! Every incoming message passes through sanitization, three parallel
//! relevance analyses and a fusion step before it reaches the
//! conversation lifecycle. The pipeline is pure domain logic; adapters
//! never see an unvalidated message.

pub mod entities;
pub mod fusion;
pub mod intention;
pub mod sanitizer;
pub mod vocabulary;

pub use entities::{Entity, EntityCategory, EntityLexicon, EntitySummary};
pub use fusion::{Guardrail, GuardrailPolicy, RejectReason, ValidationStrategy, Verdict};
pub use intention::StructuralClass;
pub use sanitizer::{SanitizeError, SanitizedText, MAX_MESSAGE_CHARS};
pub use vocabulary::{TermMatch, TermTier, VocabularyMatch};
