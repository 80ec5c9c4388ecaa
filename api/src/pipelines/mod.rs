//! Store access for the CRUD handlers, one submodule per backend.
//!
//! Every function runs exactly one statement or document operation; ids and
//! numeric fields are parsed from their form text here so that handlers stay
//! backend-agnostic.

pub mod mongo;
pub mod postgres;
