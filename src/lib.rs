//! Repair Concierge - Conversational Home-Repair Assistant
//!
//! This crate implements the request-admission pipeline and conversation
//! lifecycle for a home-repair question-answering assistant: every incoming
//! message passes a multi-signal content guardrail before a per-session
//! state machine decides how the answer generator should respond.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
