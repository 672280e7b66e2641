//! neosup - supervision of an externally installed Neo4j server.
//!
//! The crate starts, stops, and restarts a server install's control
//! binary, reads and mutates its properties-style configuration without
//! clobbering unrelated content, derives its HTTP endpoint, and performs a
//! destructive data reset that transparently pauses and resumes a running
//! server.
//!
//! - [`supervisor`] - the [`Supervisor`] handle composing everything
//! - [`properties`] - structured config file read/modify/delete
//! - [`version`] - pre-3.0 vs 3.0+ key mapping behind one trait
//! - [`process`] - control binary invocation and status parsing
//! - [`probe`] - HTTP readiness polling with a bounded budget
//!
//! ```no_run
//! # async fn demo() -> neosup::Result<()> {
//! let server = neosup::Supervisor::new("/opt/neo4j", "3.5.14")?;
//! server.set_port("7688").await?;
//! server.start().await?;
//! println!("up at {}", server.endpoint().await?.server);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod probe;
pub mod process;
pub mod properties;
pub mod supervisor;
pub mod version;

pub use error::{Error, Result};
pub use supervisor::{Endpoint, Supervisor};
