//! Prompt-to-flowchart engine.
//!
//! Turns a free-text process description into a flowchart: the text is split
//! into typed steps, the steps become a chain of nodes and connections laid
//! out on a grid, and the resulting diagram is edited through a store that
//! keeps nodes and connections consistent. Rendering, gesture capture, and
//! confirmation dialogs belong to the host UI; this crate exposes the data
//! and operations they drive.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`diagram`] | Nodes, connections, diagrams, and structural validation |
//! | [`steps`] | Rule-based sentence splitter producing typed [`steps::Step`]s |
//! | [`builder`] | Builds a [`diagram::Diagram`] from a prompt |
//! | [`layout`] | Grid placement, snapping, collision avoidance, bounds |
//! | [`store`] | Editing-session store with integrity-preserving mutations |
//! | [`services`] | Async generation collaborator and editor session |
//! | [`export`] | SVG / PNG / PDF export of diagram snapshots |
//! | [`ids`] | Injected id generation |
//! | [`config`] | Environment-driven configuration |
//! | [`consts`] | Shared numeric constants (canvas size, footprint, grid) |

pub mod builder;
pub mod config;
pub mod consts;
pub mod diagram;
pub mod export;
pub mod ids;
pub mod layout;
pub mod services;
pub mod steps;
pub mod store;
