//! Template service: build templates, generate their code pools, and serve
//! template snapshots to the distribution and settlement paths.

pub mod build;
pub mod codegen;
pub mod provider;

pub use build::TemplateBuilder;
pub use codegen::{build_codes, CodeGenerator};
pub use provider::{StoreTemplateProvider, TemplateProvider};
