//! Canvas API - command and query interface for driving a canvas.
//!
//! This crate defines a typed script language over the scene graph.
//! Commands stand in for both the application and the hosting widget, and
//! are:
//! - Serializable (for recording, scripting, tool generation)
//! - Name-based (scripts name items instead of holding ids)
//! - Headless (a recording host answers every host request)
//!
//! # Example
//! ```ignore
//! use api::{Command, Session, SessionConfig, Target};
//!
//! let mut session = Session::new(SessionConfig::default())?;
//! let result = session.execute(Command::CreateRect {
//!     name: "button".into(),
//!     parent: Target::Root,
//!     position: DVec2::new(10.0, 10.0),
//!     size: DVec2::new(40.0, 20.0),
//!     fill: Some(Rgba::BLACK),
//!     outline: None,
//!     outline_width: None,
//!     consumes: vec![],
//! });
//! ```

mod command;
mod executor;
mod query;
mod script;
mod shape;
mod target;

pub use command::*;
pub use executor::{Session, SessionConfig, ROOT_NAME};
pub use query::*;
pub use script::*;
pub use shape::RectShape;
pub use target::*;
