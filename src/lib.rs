//! Mist: server-pushed live HTML components
//!
//! Applications describe components (a template plus the models it renders
//! from), register them with a [`engine::Mist`] engine and serve the
//! WebSocket endpoint. Whenever the store updates a record, every component
//! depending on that record's model is re-rendered for the record's id and
//! pushed to the connections subscribed to it.

pub mod arguments;
pub mod components;
pub mod config;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod templates;
pub mod webserver;

pub use components::{Component, ComponentRegistry};
pub use engine::Mist;
pub use errors::{MistError, RenderError, StoreError};
pub use models::{Model, ModelKind, Record};
pub use store::{SqliteStore, Store};
pub use templates::{Renderer, Template, TemplateRenderer};
pub use webserver::ws::{ClientRegistry, Message};
