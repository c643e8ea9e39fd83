//! Gumshoe – a restricted, shell-style query interpreter for a document-store
//! murder mystery game.
//!
//! Players type queries such as
//! `db.person.find({name: /^Jer/}, {name: 1}).sort({"age": -1}).limit(5)` and
//! Gumshoe turns the raw, percent-encoded text into a structured
//! [`command::Command`] before anything touches storage. Only a handful of
//! shapes are accepted:
//! * `db.getCollectionNames()` lists the visible collections.
//! * `db.<c>.distinct('<field>')` lists the distinct values of a field.
//! * `db.<c>.count()` counts the documents in a collection.
//! * `db.<c>.find(<filter>, <projection>)` with optional `.limit(n)` and
//!   `.sort({...})` clauses, in any order.
//! * `db.solution.find({name: "<suspect>"})` checks a guess at the murderer.
//!
//! ## Modules
//! * [`validate`] – Presence, size and percent-decoding of the raw parameter.
//! * [`clause`] – Locates the `find`, `limit`, `sort`, `count` and `distinct` clauses.
//! * [`recognize`] – Classifies a query into one of the supported shapes.
//! * [`normalize`] – Rewrites the relaxed shell literal syntax into strict JSON.
//! * [`arguments`] – Splits and parses the filter and projection documents.
//! * [`command`] – Builds the validated [`command::Command`], including limit and sort rules.
//! * [`policy`] – Hides and guards the restricted `solution` collection.
//! * [`clue`] – Marks single-document results that are clues.
//! * [`store`] – The [`store::DocumentStore`] trait the engine executes against.
//! * [`persist`] – SQLite-backed implementation of the store.
//! * [`matcher`] – Filter, sort and projection evaluation over JSON documents.
//! * [`engine`] – Ties interpretation and execution together.
//! * [`server`] – HTTP surface (`GET /eval?query=...`).
//! * [`settings`] – Layered configuration from file and `GUMSHOE__*` environment variables.
//!
//! ## Quick Start
//! ```
//! use gumshoe::engine::{Engine, Outcome};
//! use gumshoe::persist::{PersistenceMode, Persistor};
//! use gumshoe::settings::Settings;
//! let store = Persistor::new(PersistenceMode::InMemory).unwrap();
//! store.seed_from_str(r#"{"crime": [{"_id": "c1", "type": "murder"}]}"#).unwrap();
//! let settings = Settings::default();
//! let engine = Engine::new(&store, &settings);
//! let outcome = engine.evaluate(Some("db.crime.count()")).unwrap();
//! assert_eq!(outcome, Outcome::Count(1));
//! ```

pub mod arguments;
pub mod clause;
pub mod clue;
pub mod command;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod persist;
pub mod policy;
pub mod recognize;
pub mod server;
pub mod settings;
pub mod store;
pub mod validate;

pub use error::{ErrorClass, GumshoeError, Result};
