//! Force-directed incident graph.
//!
//! Renders nodes as icon images and edges as labelled arrows in SVG, laid
//! out by a d3-style force simulation:
//! - link, charge, centring, collision and axis forces
//! - drag to pin, double-click to release
//! - click to select, hover for the full node record
//! - pan and zoom about the pointer
//!
//! The pure parts (document model, geometry, simulation, state, scene) run
//! anywhere; `render`, `host` and `component` are the thin browser layer.
//!
//! # Example
//!
//! ```ignore
//! use incident_viz::components::force_graph::{BrowserHost, WidgetHandle};
//! use incident_viz::config::WidgetConfig;
//!
//! let handle = WidgetHandle::new(Rc::new(BrowserHost::new()?), WidgetConfig::default(), 800.0, 600.0);
//! handle.init();
//! ```

mod component;
mod host;
pub mod lifecycle;
mod render;
pub mod scene;
pub mod shape;
pub mod simulation;
pub mod state;
pub mod theme;
pub mod tooltip;
pub mod types;

pub use component::IncidentGraph;
pub use host::{BrowserHost, from_js, to_js};
pub use lifecycle::{FetchCallback, Host, TimerCallback, WidgetHandle};
pub use render::{NODE_ID_ATTRIBUTE, SvgLayer};
pub use scene::{KeyedJoin, Scene};
pub use state::{LoadStatus, WidgetState};
pub use theme::Theme;
pub use tooltip::TooltipElement;
pub use types::{GraphDocument, GraphEdge, GraphNode};
