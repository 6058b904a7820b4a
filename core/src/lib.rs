//! Interprets the data model blob a Matter device stores in flash and
//! rebuilds the device model tree it describes.

#[macro_use]
extern crate num_derive;

pub mod config;
pub mod constants;
pub mod data_model;
pub mod error;
pub mod interpreter;
pub mod message;
pub mod storage;

pub use config::{DataModelLimits, InterpreterConfig, StorageConfig};
pub use data_model::{hooks::ClusterHooks, Node};
pub use error::{InterpretError, LoadError};
pub use interpreter::{Interpretation, Interpreter};
pub use storage::{manager::DataModelManager, DataModelStorage};
